use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tower::ServiceExt;
use uuid::Uuid;

use super::{
    error::ApiError,
    extract::{Path, Query},
};
use crate::{
    commands::{
        record_product::RecordProductRequest, record_sale::RecordSaleRequest,
        record_stamp::RecordStampRequest, redeem_voucher::RedeemVoucherRequest,
        sign_up::SignUpRequest, DomainLogic,
    },
    domain::{
        Customer, Product, ProductKind, Sale, Stamp, ValidationError, Voucher, VoucherStatus,
    },
    ports::database::DatabasePort,
    queries::{
        customer_records::{
            ListCustomersRequest, ListSalesRequest, ListStampsRequest, ListVouchersRequest,
        },
        customer_summary::CustomerSummaryRequest,
        products::{GetProductRequest, ListProductsRequest},
    },
};

type Created<T> = (StatusCode, Json<T>);

/// Parse a JSON request body, treating an empty body as `{}`
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };

    serde_json::from_slice(body)
        .map_err(|err| ValidationError::new("body", err.to_string()).into())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SignUpBody {
    first_name: String,
    last_name: String,
    email: String,
}

#[derive(Debug, Serialize)]
pub(super) struct CustomerDetail {
    #[serde(flatten)]
    customer: Customer,
    num_stamps: usize,
    total_stamps: usize,
    num_vouchers: usize,
    total_vouchers: usize,
    num_purchases: usize,
}

pub(super) async fn list_customers<D>(
    State(domain): State<DomainLogic<D>>,
) -> Result<Json<Vec<Customer>>, ApiError>
where
    D: DatabasePort + Send + Sync + 'static,
{
    Ok(Json(domain.oneshot(ListCustomersRequest).await?))
}

pub(super) async fn sign_up<D>(
    State(domain): State<DomainLogic<D>>,
    body: Bytes,
) -> Result<Created<Customer>, ApiError>
where
    D: DatabasePort + Send + Sync + 'static,
{
    let body: SignUpBody = parse_body(&body)?;
    let customer = domain
        .oneshot(SignUpRequest {
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

pub(super) async fn customer_detail<D>(
    State(domain): State<DomainLogic<D>>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<CustomerDetail>, ApiError>
where
    D: DatabasePort + Send + Sync + 'static,
{
    let summary = domain
        .oneshot(CustomerSummaryRequest { customer_id })
        .await?;

    Ok(Json(CustomerDetail {
        customer: summary.customer,
        num_stamps: summary.available_stamps,
        total_stamps: summary.total_stamps,
        num_vouchers: summary.available_vouchers,
        total_vouchers: summary.total_vouchers,
        num_purchases: summary.sales,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StampBody {
    obtained_with: Option<Uuid>,
}

pub(super) async fn list_stamps<D>(
    State(domain): State<DomainLogic<D>>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<Vec<Stamp>>, ApiError>
where
    D: DatabasePort + Send + Sync + 'static,
{
    Ok(Json(domain.oneshot(ListStampsRequest { customer_id }).await?))
}

pub(super) async fn record_stamp<D>(
    State(domain): State<DomainLogic<D>>,
    Path(customer_id): Path<Uuid>,
    body: Bytes,
) -> Result<Created<Stamp>, ApiError>
where
    D: DatabasePort + Send + Sync + 'static,
{
    let body: StampBody = parse_body(&body)?;
    let res = domain
        .oneshot(RecordStampRequest {
            customer_id,
            obtained_with: body.obtained_with,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(res.stamp)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VoucherBody {
    redeemed_with: Option<Uuid>,
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(super) struct VoucherView {
    #[serde(flatten)]
    voucher: Voucher,
    status: VoucherStatus,
}

impl From<Voucher> for VoucherView {
    fn from(voucher: Voucher) -> Self {
        Self {
            status: voucher.status(),
            voucher,
        }
    }
}

pub(super) async fn list_vouchers<D>(
    State(domain): State<DomainLogic<D>>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<Vec<VoucherView>>, ApiError>
where
    D: DatabasePort + Send + Sync + 'static,
{
    let vouchers = domain.oneshot(ListVouchersRequest { customer_id }).await?;

    Ok(Json(vouchers.into_iter().map(VoucherView::from).collect()))
}

pub(super) async fn redeem_voucher<D>(
    State(domain): State<DomainLogic<D>>,
    Path(customer_id): Path<Uuid>,
    body: Bytes,
) -> Result<Created<VoucherView>, ApiError>
where
    D: DatabasePort + Send + Sync + 'static,
{
    let body: VoucherBody = parse_body(&body)?;
    let voucher = domain
        .oneshot(RedeemVoucherRequest {
            customer_id,
            redeemed_with: body.redeemed_with,
            date: body.date,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(voucher.into())))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SaleBody {
    date: Option<DateTime<Utc>>,
}

pub(super) async fn list_sales<D>(
    State(domain): State<DomainLogic<D>>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<Vec<Sale>>, ApiError>
where
    D: DatabasePort + Send + Sync + 'static,
{
    Ok(Json(domain.oneshot(ListSalesRequest { customer_id }).await?))
}

pub(super) async fn record_sale<D>(
    State(domain): State<DomainLogic<D>>,
    Path(customer_id): Path<Uuid>,
    body: Bytes,
) -> Result<Created<Sale>, ApiError>
where
    D: DatabasePort + Send + Sync + 'static,
{
    let body: SaleBody = parse_body(&body)?;
    let sale = domain
        .oneshot(RecordSaleRequest {
            customer_id,
            date: body.date,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(sale)))
}

#[derive(Debug, Deserialize)]
struct ProductBody {
    kind: ProductKind,
    date: DateTime<Utc>,
    #[serde(default)]
    serial_number: String,
    #[serde(default)]
    sale: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductView {
    #[serde(flatten)]
    product: Product,
    kind_name: &'static str,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            kind_name: product.kind.name(),
            product,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PageQuery {
    page: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductPageView {
    count: usize,
    page: usize,
    next: Option<usize>,
    results: Vec<ProductView>,
}

pub(super) async fn list_products<D>(
    State(domain): State<DomainLogic<D>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ProductPageView>, ApiError>
where
    D: DatabasePort + Send + Sync + 'static,
{
    let listing = domain
        .oneshot(ListProductsRequest {
            page: query.page.unwrap_or(1),
        })
        .await?;

    Ok(Json(ProductPageView {
        count: listing.count,
        page: listing.page,
        next: listing.has_next.then_some(listing.page + 1),
        results: listing.products.into_iter().map(ProductView::from).collect(),
    }))
}

pub(super) async fn record_product<D>(
    State(domain): State<DomainLogic<D>>,
    body: Bytes,
) -> Result<Created<ProductView>, ApiError>
where
    D: DatabasePort + Send + Sync + 'static,
{
    let body: ProductBody = parse_body(&body)?;
    let product = domain
        .oneshot(RecordProductRequest {
            kind: body.kind,
            date: body.date,
            serial_number: body.serial_number,
            sale_id: body.sale,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product.into())))
}

pub(super) async fn get_product<D>(
    State(domain): State<DomainLogic<D>>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ProductView>, ApiError>
where
    D: DatabasePort + Send + Sync + 'static,
{
    let product = domain.oneshot(GetProductRequest { product_id }).await?;

    Ok(Json(product.into()))
}
