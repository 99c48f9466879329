use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{domain::Voucher, ports::database::DatabasePort};
use chrono::{DateTime, Utc};
use tower::Service;
use uuid::Uuid;

use super::{DomainLogic, Error};

/// Create a voucher for a customer outside of stamp grouping
#[derive(Clone, Debug)]
pub struct RedeemVoucherRequest {
    pub customer_id: Uuid,
    /// Product obtained with the voucher, `None` for a free voucher
    pub redeemed_with: Option<Uuid>,
    /// Defaults to now
    pub date: Option<DateTime<Utc>>,
}

impl<D> Service<RedeemVoucherRequest> for DomainLogic<D>
where
    D: DatabasePort + Send + Sync + 'static,
{
    type Response = Voucher;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: RedeemVoucherRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            let voucher = Voucher::new(req.customer_id, req.date, req.redeemed_with);
            let voucher = database.create_voucher(voucher).await?;

            tracing::info!(
                customer_id = %voucher.customer_id,
                voucher_id = %voucher.voucher_id,
                redeemed_with = ?voucher.redeemed_with,
                "created voucher"
            );
            Ok(voucher)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::database::memory::MemoryDatabase,
        commands::{Entity, LedgerConfig},
        domain::{Customer, Product, ProductKind, VoucherStatus},
    };
    use rstest::*;
    use speculoos::prelude::*;
    use std::sync::Arc;
    use tower::{BoxError, ServiceExt};

    #[fixture]
    fn customer() -> Customer {
        Customer::new("John", "Doe", "john.doe@gmail.com").unwrap()
    }

    async fn setup(
        customer: &Customer,
    ) -> Result<(DomainLogic<MemoryDatabase>, Product), BoxError> {
        let database = MemoryDatabase::default();
        database.create_customer(customer.clone()).await?;
        let product = database
            .create_product(Product::new(ProductKind::Gizmo, Utc::now(), "1", None)?)
            .await?;
        Ok((
            DomainLogic::new(Arc::new(database), LedgerConfig::default()),
            product,
        ))
    }

    #[rstest]
    #[tokio::test]
    async fn test_free_voucher(customer: Customer) -> Result<(), BoxError> {
        let (domain, _) = setup(&customer).await?;

        let res = domain
            .oneshot(RedeemVoucherRequest {
                customer_id: customer.customer_id,
                redeemed_with: None,
                date: None,
            })
            .await;

        assert_that!(res).is_ok().matches(|voucher| {
            voucher.customer_id == customer.customer_id
                && voucher.status() == VoucherStatus::Available
        });
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_redeem_twice(customer: Customer) -> Result<(), BoxError> {
        // GIVEN a voucher redeemed against a product
        let (domain, product) = setup(&customer).await?;
        let date = Utc::now() - chrono::Duration::days(1);
        let voucher = domain
            .clone()
            .oneshot(RedeemVoucherRequest {
                customer_id: customer.customer_id,
                redeemed_with: Some(product.product_id),
                date: Some(date),
            })
            .await?;
        assert_that!(voucher.status()).is_equal_to(VoucherStatus::Redeemed);
        assert_that!(voucher.date).is_equal_to(date);

        // WHEN redeeming a second voucher against the same product
        let res = domain
            .oneshot(RedeemVoucherRequest {
                customer_id: customer.customer_id,
                redeemed_with: Some(product.product_id),
                date: None,
            })
            .await;

        // THEN it is rejected
        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::InvalidReference(_)));
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_unknown_product(customer: Customer) -> Result<(), BoxError> {
        let (domain, _) = setup(&customer).await?;

        let res = domain
            .oneshot(RedeemVoucherRequest {
                customer_id: customer.customer_id,
                redeemed_with: Some(Uuid::new_v4()),
                date: None,
            })
            .await;

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::InvalidReference(_)));
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_unknown_customer(customer: Customer) -> Result<(), BoxError> {
        let (domain, product) = setup(&customer).await?;

        let res = domain
            .oneshot(RedeemVoucherRequest {
                customer_id: Uuid::new_v4(),
                redeemed_with: Some(product.product_id),
                date: None,
            })
            .await;

        assert_that!(res).is_err().matches(|err| {
            matches!(
                err,
                Error::NotFound {
                    entity: Entity::Customer,
                    ..
                }
            )
        });
        Ok(())
    }
}
