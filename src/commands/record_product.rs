use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    domain::{Product, ProductKind},
    ports::database::DatabasePort,
};
use chrono::{DateTime, Utc};
use tower::Service;
use uuid::Uuid;

use super::{DomainLogic, Error};

#[derive(Clone, Debug)]
pub struct RecordProductRequest {
    pub kind: ProductKind,
    /// Manufacture date
    pub date: DateTime<Utc>,
    pub serial_number: String,
    /// Sale the product was sold in, if any
    pub sale_id: Option<Uuid>,
}

impl<D> Service<RecordProductRequest> for DomainLogic<D>
where
    D: DatabasePort + Send + Sync + 'static,
{
    type Response = Product;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: RecordProductRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            let product = Product::new(req.kind, req.date, &req.serial_number, req.sale_id)?;
            let product = database.create_product(product).await?;

            tracing::info!(
                product_id = %product.product_id,
                serial_number = %product.serial_number,
                "recorded product"
            );
            Ok(product)
        })
    }
}
