use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    commands::{DomainLogic, Error},
    domain::{Customer, Sale, Stamp, Voucher},
    ports::database::DatabasePort,
};
use tower::Service;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default)]
pub struct ListCustomersRequest;

/// Stamps of a customer, oldest first
#[derive(Clone, Copy, Debug)]
pub struct ListStampsRequest {
    pub customer_id: Uuid,
}

#[derive(Clone, Copy, Debug)]
pub struct ListVouchersRequest {
    pub customer_id: Uuid,
}

#[derive(Clone, Copy, Debug)]
pub struct ListSalesRequest {
    pub customer_id: Uuid,
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send>>;

impl<D> Service<ListCustomersRequest> for DomainLogic<D>
where
    D: DatabasePort + Send + Sync + 'static,
{
    type Response = Vec<Customer>;
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: ListCustomersRequest) -> Self::Future {
        let database = self.database();
        Box::pin(async move { Ok(database.list_customers().await?) })
    }
}

impl<D> Service<ListStampsRequest> for DomainLogic<D>
where
    D: DatabasePort + Send + Sync + 'static,
{
    type Response = Vec<Stamp>;
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ListStampsRequest) -> Self::Future {
        let database = self.database();
        Box::pin(async move { Ok(database.list_stamps(req.customer_id).await?) })
    }
}

impl<D> Service<ListVouchersRequest> for DomainLogic<D>
where
    D: DatabasePort + Send + Sync + 'static,
{
    type Response = Vec<Voucher>;
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ListVouchersRequest) -> Self::Future {
        let database = self.database();
        Box::pin(async move { Ok(database.list_vouchers(req.customer_id).await?) })
    }
}

impl<D> Service<ListSalesRequest> for DomainLogic<D>
where
    D: DatabasePort + Send + Sync + 'static,
{
    type Response = Vec<Sale>;
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ListSalesRequest) -> Self::Future {
        let database = self.database();
        Box::pin(async move { Ok(database.list_sales(req.customer_id).await?) })
    }
}
