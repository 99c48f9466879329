use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::{commands::Error, domain::ValidationError};

/// Error returned by the HTTP handlers
#[derive(Debug)]
pub struct ApiError(Error);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum ErrorKind {
    NotFound,
    InvalidReference,
    Validation,
    Unavailable,
    Internal,
}

impl ApiError {
    fn kind(&self) -> ErrorKind {
        match self.0 {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::InvalidReference(_) => ErrorKind::InvalidReference,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Contention(_) => ErrorKind::Unavailable,
            Error::Database(_) => ErrorKind::Internal,
        }
    }
}

fn status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidReference | ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        // Store failures are not described to the client
        let message = match kind {
            ErrorKind::Internal => {
                tracing::error!(error = %self.0, "request failed");
                "internal error".to_string()
            }
            _ => self.0.to_string(),
        };

        let body = Json(json!({ "error": { "kind": kind, "message": message } }));
        (status(kind), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{commands::Entity, ports::database};
    use rstest::*;
    use speculoos::prelude::*;
    use uuid::Uuid;

    #[rstest]
    #[case(
        Error::NotFound { entity: Entity::Customer, id: Uuid::new_v4() },
        StatusCode::NOT_FOUND
    )]
    #[case(Error::InvalidReference("product already stamped".into()), StatusCode::BAD_REQUEST)]
    #[case(
        Error::Validation(ValidationError::new("email", "may not be blank")),
        StatusCode::BAD_REQUEST
    )]
    #[case(Error::Contention(Uuid::new_v4()), StatusCode::SERVICE_UNAVAILABLE)]
    #[case(
        Error::Database(database::Error::Adapter("boom".into())),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    fn test_status(#[case] err: Error, #[case] expected: StatusCode) {
        let res = ApiError::from(err).into_response();

        assert_that!(res.status()).is_equal_to(expected);
    }
}
