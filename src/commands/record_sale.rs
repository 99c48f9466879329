use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{domain::Sale, ports::database::DatabasePort};
use chrono::{DateTime, Utc};
use tower::Service;
use uuid::Uuid;

use super::{DomainLogic, Error};

#[derive(Clone, Debug)]
pub struct RecordSaleRequest {
    pub customer_id: Uuid,
    /// Defaults to now
    pub date: Option<DateTime<Utc>>,
}

impl<D> Service<RecordSaleRequest> for DomainLogic<D>
where
    D: DatabasePort + Send + Sync + 'static,
{
    type Response = Sale;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: RecordSaleRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            let sale = database
                .create_sale(Sale::new(req.customer_id, req.date))
                .await?;

            tracing::info!(
                customer_id = %sale.customer_id,
                sale_id = %sale.sale_id,
                "recorded sale"
            );
            Ok(sale)
        })
    }
}
