use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    domain::Stamp,
    ports::database::{self, DatabasePort},
};
use tower::Service;
use uuid::Uuid;

use super::{DomainLogic, Error};

/// Number of times a stamp is planned again after the ledger changed underneath it
const MAX_LEDGER_ATTEMPTS: usize = 5;

#[derive(Clone, Debug)]
pub struct RecordStampRequest {
    pub customer_id: Uuid,
    /// Product whose purchase generated the stamp, `None` for a free stamp
    pub obtained_with: Option<Uuid>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RecordStampResponse {
    pub stamp: Stamp,
    /// Vouchers created because this stamp completed one or more batches
    pub minted_vouchers: Vec<Uuid>,
}

impl<D> Service<RecordStampRequest> for DomainLogic<D>
where
    D: DatabasePort + Send + Sync + 'static,
{
    type Response = RecordStampResponse;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: RecordStampRequest) -> Self::Future {
        let database = self.database.clone();
        let locks = self.locks.clone();
        let batch_size = self.config.batch_size;
        Box::pin(async move {
            let _guard = locks.lock(req.customer_id).await;

            for attempt in 1..=MAX_LEDGER_ATTEMPTS {
                // Plan the stamp and its groupings against the current ledger
                let ledger = database.get_stamp_ledger(req.customer_id).await?;
                let commit = ledger.record(req.obtained_with, batch_size);
                let minted_vouchers: Vec<Uuid> = commit
                    .groupings
                    .iter()
                    .map(|grouping| grouping.voucher.voucher_id)
                    .collect();
                tracing::debug!(
                    customer_id = %req.customer_id,
                    ungrouped = ledger.ungrouped.len(),
                    vouchers = minted_vouchers.len(),
                    "planned stamp"
                );

                match database.commit_stamp(commit).await {
                    Ok(stamp) => {
                        for voucher_id in &minted_vouchers {
                            tracing::info!(
                                customer_id = %req.customer_id,
                                %voucher_id,
                                "minted voucher from stamps"
                            );
                        }
                        return Ok(RecordStampResponse {
                            stamp,
                            minted_vouchers,
                        });
                    }
                    // Another writer recorded a stamp for this customer in the meantime
                    Err(database::Error::StaleLedger { expected, actual, .. }) => {
                        tracing::warn!(
                            customer_id = %req.customer_id,
                            attempt,
                            expected,
                            actual,
                            "stale stamp ledger, retrying"
                        );
                    }
                    Err(err) => return Err(err.into()),
                }
            }

            Err(Error::Contention(req.customer_id))
        })
    }
}
