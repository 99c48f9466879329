use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod ledger;

pub use ledger::{
    Stamp, StampCommit, StampLedger, Voucher, VoucherGrouping, VoucherStatus, DEFAULT_BATCH_SIZE,
};

const MAX_NAME_LEN: usize = 20;
const MAX_EMAIL_LEN: usize = 254;
const MAX_SERIAL_NUMBER_LEN: usize = 30;

/// A field failed validation before reaching the database
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid `{field}`: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: Cow<'static, str>,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// A person taking part in the loyalty program
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub customer_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Customer {
    /// Validate the sign-up fields and create a new `Customer`
    ///
    /// Leading and trailing whitespace is stripped from every field.
    pub fn new(first_name: &str, last_name: &str, email: &str) -> Result<Self, ValidationError> {
        let first_name = required("first_name", first_name, MAX_NAME_LEN)?;
        let last_name = required("last_name", last_name, MAX_NAME_LEN)?;
        let email = required("email", email, MAX_EMAIL_LEN)?;
        validate_email(&email)?;

        Ok(Self {
            customer_id: Uuid::new_v4(),
            first_name,
            last_name,
            email,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Widget,
    Gizmo,
}

impl ProductKind {
    /// Human readable name
    pub fn name(&self) -> &'static str {
        match self {
            ProductKind::Widget => "Widget",
            ProductKind::Gizmo => "Gizmo",
        }
    }
}

/// A manufactured item, optionally sold as part of a [`Sale`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Product {
    pub product_id: Uuid,
    pub kind: ProductKind,
    /// Manufacture date
    pub date: DateTime<Utc>,
    /// Unique across all products
    pub serial_number: String,
    pub sale_id: Option<Uuid>,
}

impl Product {
    pub fn new(
        kind: ProductKind,
        date: DateTime<Utc>,
        serial_number: &str,
        sale_id: Option<Uuid>,
    ) -> Result<Self, ValidationError> {
        let serial_number = required("serial_number", serial_number, MAX_SERIAL_NUMBER_LEN)?;

        Ok(Self {
            product_id: Uuid::new_v4(),
            kind,
            date,
            serial_number,
            sale_id,
        })
    }
}

/// A purchase made by a customer
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Sale {
    pub sale_id: Uuid,
    pub customer_id: Uuid,
    pub date: DateTime<Utc>,
}

impl Sale {
    pub fn new(customer_id: Uuid, date: Option<DateTime<Utc>>) -> Self {
        Self {
            sale_id: Uuid::new_v4(),
            customer_id,
            date: date.unwrap_or_else(Utc::now),
        }
    }
}

fn required(field: &'static str, value: &str, max_len: usize) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::new(field, "may not be blank"));
    }
    if value.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("may not be longer than {max_len} characters"),
        ));
    }

    Ok(value.to_string())
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::new("email", "not a valid email address");

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    // The domain needs at least one dot with a label on each side
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}
