use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    commands::{DomainLogic, Error},
    domain::{Customer, VoucherStatus},
    ports::database::DatabasePort,
};
use tower::Service;
use uuid::Uuid;

#[derive(Clone, Copy, Debug)]
pub struct CustomerSummaryRequest {
    pub customer_id: Uuid,
}

/// A customer with their loyalty counters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerSummary {
    pub customer: Customer,
    /// Stamps not grouped into a voucher yet
    pub available_stamps: usize,
    pub total_stamps: usize,
    /// Vouchers not redeemed yet
    pub available_vouchers: usize,
    pub total_vouchers: usize,
    pub sales: usize,
}

impl<D> Service<CustomerSummaryRequest> for DomainLogic<D>
where
    D: DatabasePort + Send + Sync + 'static,
{
    type Response = CustomerSummary;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CustomerSummaryRequest) -> Self::Future {
        let database = self.database();
        Box::pin(async move {
            // One read, so the counters all describe the same moment
            let records = database.get_customer_records(req.customer_id).await?;
            let stamps = &records.stamps;
            let vouchers = &records.vouchers;

            Ok(CustomerSummary {
                available_stamps: stamps.iter().filter(|stamp| !stamp.is_grouped()).count(),
                total_stamps: stamps.len(),
                available_vouchers: vouchers
                    .iter()
                    .filter(|voucher| voucher.status() == VoucherStatus::Available)
                    .count(),
                total_vouchers: vouchers.len(),
                sales: records.sales.len(),
                customer: records.customer,
            })
        })
    }
}
