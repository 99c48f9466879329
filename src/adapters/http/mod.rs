//! HTTP inbound adapter
//!
//! Maps REST routes onto the command and query services. Creation requests answer with
//! `201 Created` and the stored entity.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::{commands::DomainLogic, ports::database::DatabasePort};

mod error;
mod extract;
mod handlers;

pub use error::ApiError;

pub fn router<D>(domain: DomainLogic<D>) -> Router
where
    D: DatabasePort + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/customers",
            get(handlers::list_customers::<D>).post(handlers::sign_up::<D>),
        )
        .route(
            "/customers/{customer_id}",
            get(handlers::customer_detail::<D>),
        )
        .route(
            "/customers/{customer_id}/stamps",
            get(handlers::list_stamps::<D>).post(handlers::record_stamp::<D>),
        )
        .route(
            "/customers/{customer_id}/vouchers",
            get(handlers::list_vouchers::<D>).post(handlers::redeem_voucher::<D>),
        )
        .route(
            "/customers/{customer_id}/sales",
            get(handlers::list_sales::<D>).post(handlers::record_sale::<D>),
        )
        .route(
            "/products",
            get(handlers::list_products::<D>).post(handlers::record_product::<D>),
        )
        .route("/products/{product_id}", get(handlers::get_product::<D>))
        .layer(TraceLayer::new_for_http())
        .with_state(domain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{adapters::database::memory::MemoryDatabase, commands::LedgerConfig};
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    };
    use rstest::*;
    use serde_json::{json, Value};
    use speculoos::prelude::*;
    use std::sync::Arc;
    use tower::ServiceExt;

    #[fixture]
    fn app() -> Router {
        router(DomainLogic::new(
            Arc::new(MemoryDatabase::default()),
            LedgerConfig::default(),
        ))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let res = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn sign_up(app: &Router) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/customers",
            Some(json!({
                "first_name": "John",
                "last_name": "Doe",
                "email": "john.doe@gmail.com",
            })),
        )
        .await;
        assert_that!(status).is_equal_to(StatusCode::CREATED);
        body["customer_id"].as_str().unwrap().to_string()
    }

    async fn create_product(app: &Router, serial_number: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/products",
            Some(json!({
                "kind": "widget",
                "date": "2014-03-01T10:00:00Z",
                "serial_number": serial_number,
                "sale": null,
            })),
        )
        .await;
        assert_that!(status).is_equal_to(StatusCode::CREATED);
        body["product_id"].as_str().unwrap().to_string()
    }

    #[rstest]
    #[tokio::test]
    async fn test_customers(app: Router) {
        let (status, body) = send(&app, Method::GET, "/customers", None).await;
        assert_that!(status).is_equal_to(StatusCode::OK);
        assert_that!(body).is_equal_to(json!([]));

        let customer_id = sign_up(&app).await;

        let uri = format!("/customers/{customer_id}");
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_that!(status).is_equal_to(StatusCode::OK);
        assert_that!(body).is_equal_to(json!({
            "customer_id": customer_id,
            "first_name": "John",
            "last_name": "Doe",
            "email": "john.doe@gmail.com",
            "num_stamps": 0,
            "total_stamps": 0,
            "num_vouchers": 0,
            "total_vouchers": 0,
            "num_purchases": 0,
        }));
    }

    #[rstest]
    #[case(json!({"first_name": "", "last_name": "Doe", "email": "john.doe@gmail.com"}))]
    #[case(json!({"last_name": "Doe", "email": "john.doe@gmail.com"}))]
    #[case(json!({"first_name": "John", "last_name": "Doe", "email": ""}))]
    #[case(json!({"first_name": "John", "last_name": "Doe"}))]
    #[tokio::test]
    async fn test_sign_up_invalid(app: Router, #[case] customer: Value) {
        let (status, body) = send(&app, Method::POST, "/customers", Some(customer)).await;

        assert_that!(status).is_equal_to(StatusCode::BAD_REQUEST);
        assert_that!(body["error"]["kind"]).is_equal_to(json!("validation"));
    }

    #[rstest]
    #[tokio::test]
    async fn test_unknown_customer(app: Router) {
        let uri = format!("/customers/{}/stamps", uuid::Uuid::new_v4());

        let (status, body) = send(&app, Method::POST, &uri, None).await;

        assert_that!(status).is_equal_to(StatusCode::NOT_FOUND);
        assert_that!(body["error"]["kind"]).is_equal_to(json!("not_found"));
    }

    #[rstest]
    #[case(Method::GET, "/customers/not-a-uuid")]
    #[case(Method::POST, "/customers/not-a-uuid/stamps")]
    #[case(Method::GET, "/customers/42/vouchers")]
    #[case(Method::GET, "/products/not-a-uuid")]
    #[case(Method::GET, "/products?page=abc")]
    #[case(Method::GET, "/products?page=-1")]
    #[tokio::test]
    async fn test_malformed_url(app: Router, #[case] method: Method, #[case] uri: &str) {
        let (status, body) = send(&app, method, uri, None).await;

        assert_that!(status).is_equal_to(StatusCode::BAD_REQUEST);
        assert_that!(body["error"]["kind"]).is_equal_to(json!("validation"));
        assert_that!(body["error"]["message"].is_string()).is_true();
    }

    #[rstest]
    #[tokio::test]
    async fn test_voucher_autogeneration(app: Router) {
        // GIVEN a customer
        let customer_id = sign_up(&app).await;
        let stamps = format!("/customers/{customer_id}/stamps");

        // WHEN posting 10 free stamps
        for _ in 0..10 {
            let (status, body) = send(&app, Method::POST, &stamps, None).await;
            assert_that!(status).is_equal_to(StatusCode::CREATED);
            assert_that!(body["obtained_with"]).is_equal_to(Value::Null);
        }

        // THEN one voucher was generated from those stamps
        let uri = format!("/customers/{customer_id}/vouchers");
        let (_, vouchers) = send(&app, Method::GET, &uri, None).await;
        let vouchers = vouchers.as_array().unwrap();
        assert_that!(vouchers.len()).is_equal_to(1);
        assert_that!(vouchers[0]["status"]).is_equal_to(json!("available"));
        let (_, stamps) = send(&app, Method::GET, &stamps, None).await;
        assert_that!(stamps
            .as_array()
            .unwrap()
            .iter()
            .all(|stamp| stamp["grouped_in"] == vouchers[0]["voucher_id"]))
        .is_true();
        let uri = format!("/customers/{customer_id}");
        let (_, detail) = send(&app, Method::GET, &uri, None).await;
        assert_that!(detail["num_stamps"]).is_equal_to(json!(0));
        assert_that!(detail["total_stamps"]).is_equal_to(json!(10));
        assert_that!(detail["num_vouchers"]).is_equal_to(json!(1));
    }

    #[rstest]
    #[tokio::test]
    async fn test_stamp_product_twice(app: Router) {
        let customer_id = sign_up(&app).await;
        let product_id = create_product(&app, "1").await;
        let stamps = format!("/customers/{customer_id}/stamps");

        let stamp = json!({ "obtained_with": product_id });

        let (status, body) = send(&app, Method::POST, &stamps, Some(stamp.clone())).await;
        assert_that!(status).is_equal_to(StatusCode::CREATED);
        assert_that!(body["obtained_with"]).is_equal_to(json!(product_id));
        assert_that!(body["grouped_in"]).is_equal_to(Value::Null);

        let (status, body) = send(&app, Method::POST, &stamps, Some(stamp)).await;
        assert_that!(status).is_equal_to(StatusCode::BAD_REQUEST);
        assert_that!(body["error"]["kind"]).is_equal_to(json!("invalid_reference"));
    }

    #[rstest]
    #[tokio::test]
    async fn test_redeem_product_twice(app: Router) {
        let customer_id = sign_up(&app).await;
        let product_id = create_product(&app, "1").await;
        let vouchers = format!("/customers/{customer_id}/vouchers");

        let voucher = json!({ "redeemed_with": product_id });

        let (status, body) = send(&app, Method::POST, &vouchers, Some(voucher.clone())).await;
        assert_that!(status).is_equal_to(StatusCode::CREATED);
        assert_that!(body["status"]).is_equal_to(json!("redeemed"));

        let (status, _) = send(&app, Method::POST, &vouchers, Some(voucher)).await;
        assert_that!(status).is_equal_to(StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[tokio::test]
    async fn test_sales(app: Router) {
        let customer_id = sign_up(&app).await;
        let sales = format!("/customers/{customer_id}/sales");

        let (status, _) = send(&app, Method::POST, &sales, None).await;
        assert_that!(status).is_equal_to(StatusCode::CREATED);
        let sale = json!({ "date": "2014-03-01T10:00:00Z" });
        let (status, body) = send(&app, Method::POST, &sales, Some(sale)).await;
        assert_that!(status).is_equal_to(StatusCode::CREATED);
        assert_that!(body["date"]).is_equal_to(json!("2014-03-01T10:00:00Z"));

        let (status, body) = send(&app, Method::GET, &sales, None).await;
        assert_that!(status).is_equal_to(StatusCode::OK);
        assert_that!(body.as_array().unwrap().len()).is_equal_to(2);
    }

    #[rstest]
    #[case(
        json!({"kind": "widget", "date": "2014-03-01T10:00:00Z", "serial_number": "1"}),
        StatusCode::BAD_REQUEST
    )]
    #[case(
        json!({"kind": "doohickey", "date": "2014-03-01T10:00:00Z", "serial_number": "2"}),
        StatusCode::BAD_REQUEST
    )]
    #[case(
        json!({"kind": "gizmo", "date": "yesterday", "serial_number": "2"}),
        StatusCode::BAD_REQUEST
    )]
    #[case(
        json!({"kind": "gizmo", "date": "2014-03-01T10:00:00Z", "serial_number": ""}),
        StatusCode::BAD_REQUEST
    )]
    #[case(
        json!({
            "kind": "gizmo",
            "date": "2014-03-01T10:00:00Z",
            "serial_number": "2",
            "sale": uuid::Uuid::new_v4(),
        }),
        StatusCode::BAD_REQUEST
    )]
    #[case(
        json!({"kind": "gizmo", "date": "2014-03-01T10:00:00Z", "serial_number": "2"}),
        StatusCode::CREATED
    )]
    #[tokio::test]
    async fn test_create_product(
        app: Router,
        #[case] product: Value,
        #[case] expected: StatusCode,
    ) {
        // GIVEN a product with serial number "1"
        create_product(&app, "1").await;

        // WHEN creating another product
        let (status, _) = send(&app, Method::POST, "/products", Some(product)).await;

        // THEN it is accepted or rejected
        assert_that!(status).is_equal_to(expected);
    }

    #[rstest]
    #[tokio::test]
    async fn test_products(app: Router) {
        for i in 0..21 {
            create_product(&app, &format!("{i:0>10}")).await;
        }

        let (status, body) = send(&app, Method::GET, "/products", None).await;
        assert_that!(status).is_equal_to(StatusCode::OK);
        assert_that!(body["count"]).is_equal_to(json!(21));
        assert_that!(body["next"]).is_equal_to(json!(2));
        assert_that!(body["results"].as_array().unwrap().len()).is_equal_to(20);
        assert_that!(body["results"][0]["kind_name"]).is_equal_to(json!("Widget"));

        let (_, body) = send(&app, Method::GET, "/products?page=2", None).await;
        assert_that!(body["next"]).is_equal_to(Value::Null);
        let product_id = body["results"][0]["product_id"].as_str().unwrap().to_string();

        let uri = format!("/products/{product_id}");
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_that!(status).is_equal_to(StatusCode::OK);
        assert_that!(body["serial_number"]).is_equal_to(json!("0000000020"));

        let uri = format!("/products/{}", uuid::Uuid::new_v4());
        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_that!(status).is_equal_to(StatusCode::NOT_FOUND);
    }
}
