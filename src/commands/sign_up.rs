use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{domain::Customer, ports::database::DatabasePort};
use tower::Service;

use super::{DomainLogic, Error};

/// Register a new customer in the loyalty program
#[derive(Clone, Debug, Default)]
pub struct SignUpRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl<D> Service<SignUpRequest> for DomainLogic<D>
where
    D: DatabasePort + Send + Sync + 'static,
{
    type Response = Customer;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: SignUpRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            let customer = Customer::new(&req.first_name, &req.last_name, &req.email)?;
            let customer = database.create_customer(customer).await?;

            tracing::info!(customer_id = %customer.customer_id, "customer signed up");
            Ok(customer)
        })
    }
}
