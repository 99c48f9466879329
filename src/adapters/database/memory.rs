use crate::{
    domain::{Customer, Product, Sale, Stamp, StampCommit, StampLedger, Voucher},
    ports::database::{CustomerRecords, DatabasePort, Error, ProductPage},
};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};
use uuid::Uuid;

/// In-memory database
///
/// Every table lives behind a single lock that is never held across an `.await`, which makes
/// each port call atomic.
#[derive(Clone, Debug, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

/// Rows are kept in insertion order
#[derive(Debug, Default)]
struct Tables {
    customers: Vec<Customer>,
    products: Vec<Product>,
    sales: Vec<Sale>,
    stamps: Vec<Stamp>,
    vouchers: Vec<Voucher>,
}

impl Tables {
    fn customer(&self, customer_id: Uuid) -> Result<Customer, Error> {
        self.customers
            .iter()
            .find(|customer| customer.customer_id == customer_id)
            .cloned()
            .ok_or(Error::CustomerNotFound(customer_id))
    }

    fn customer_exists(&self, customer_id: Uuid) -> Result<(), Error> {
        if self.customers.iter().any(|c| c.customer_id == customer_id) {
            Ok(())
        } else {
            Err(Error::CustomerNotFound(customer_id))
        }
    }

    fn product_exists(&self, product_id: Uuid) -> Result<(), Error> {
        if self.products.iter().any(|p| p.product_id == product_id) {
            Ok(())
        } else {
            Err(Error::ProductNotFound(product_id))
        }
    }

    fn customer_stamps(&self, customer_id: Uuid) -> impl Iterator<Item = &Stamp> {
        self.stamps
            .iter()
            .filter(move |stamp| stamp.customer_id == customer_id)
    }

    fn sorted_stamps(&self, customer_id: Uuid) -> Vec<Stamp> {
        let mut stamps: Vec<Stamp> = self.customer_stamps(customer_id).cloned().collect();
        stamps.sort_by_key(|stamp| stamp.sequence);
        stamps
    }

    fn customer_vouchers(&self, customer_id: Uuid) -> Vec<Voucher> {
        self.vouchers
            .iter()
            .filter(|voucher| voucher.customer_id == customer_id)
            .cloned()
            .collect()
    }

    fn customer_sales(&self, customer_id: Uuid) -> Vec<Sale> {
        self.sales
            .iter()
            .filter(|sale| sale.customer_id == customer_id)
            .cloned()
            .collect()
    }

    /// Check that a commit can be applied in full
    fn validate_commit(&self, commit: &StampCommit) -> Result<(), Error> {
        let customer_id = commit.stamp.customer_id;
        self.customer_exists(customer_id)?;

        let actual = self.customer_stamps(customer_id).count() as u64;
        if actual != commit.expected_sequence || commit.stamp.sequence != commit.expected_sequence {
            return Err(Error::StaleLedger {
                customer_id,
                expected: commit.expected_sequence,
                actual,
            });
        }

        if let Some(product_id) = commit.stamp.obtained_with {
            self.product_exists(product_id)?;
            if self
                .stamps
                .iter()
                .any(|stamp| stamp.obtained_with == Some(product_id))
            {
                return Err(Error::ProductAlreadyStamped(product_id));
            }
        }

        let mut seen = HashSet::new();
        for grouping in &commit.groupings {
            for stamp_id in &grouping.stamp_ids {
                let groupable = grouping.voucher.customer_id == customer_id
                    && (*stamp_id == commit.stamp.stamp_id
                        || self
                            .customer_stamps(customer_id)
                            .any(|stamp| stamp.stamp_id == *stamp_id && !stamp.is_grouped()));
                if !groupable || !seen.insert(*stamp_id) {
                    return Err(Error::InvalidGrouping(*stamp_id));
                }
            }
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl DatabasePort for MemoryDatabase {
    async fn create_customer(&self, customer: Customer) -> Result<Customer, Error> {
        self.tables.lock()?.customers.push(customer.clone());

        Ok(customer)
    }

    async fn get_customer(&self, customer_id: Uuid) -> Result<Customer, Error> {
        self.tables.lock()?.customer(customer_id)
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, Error> {
        Ok(self.tables.lock()?.customers.clone())
    }

    async fn get_customer_records(&self, customer_id: Uuid) -> Result<CustomerRecords, Error> {
        let tables = self.tables.lock()?;
        let customer = tables.customer(customer_id)?;

        Ok(CustomerRecords {
            customer,
            stamps: tables.sorted_stamps(customer_id),
            vouchers: tables.customer_vouchers(customer_id),
            sales: tables.customer_sales(customer_id),
        })
    }

    async fn create_product(&self, product: Product) -> Result<Product, Error> {
        let mut tables = self.tables.lock()?;

        if tables
            .products
            .iter()
            .any(|p| p.serial_number == product.serial_number)
        {
            return Err(Error::DuplicateSerialNumber(product.serial_number));
        }
        if let Some(sale_id) = product.sale_id {
            if !tables.sales.iter().any(|sale| sale.sale_id == sale_id) {
                return Err(Error::SaleNotFound(sale_id));
            }
        }

        tables.products.push(product.clone());
        Ok(product)
    }

    async fn get_product(&self, product_id: Uuid) -> Result<Product, Error> {
        self.tables
            .lock()?
            .products
            .iter()
            .find(|product| product.product_id == product_id)
            .cloned()
            .ok_or(Error::ProductNotFound(product_id))
    }

    async fn list_products(&self, offset: usize, limit: usize) -> Result<ProductPage, Error> {
        let tables = self.tables.lock()?;

        Ok(ProductPage {
            count: tables.products.len(),
            products: tables
                .products
                .iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect(),
        })
    }

    async fn create_sale(&self, sale: Sale) -> Result<Sale, Error> {
        let mut tables = self.tables.lock()?;
        tables.customer_exists(sale.customer_id)?;
        tables.sales.push(sale.clone());

        Ok(sale)
    }

    async fn list_sales(&self, customer_id: Uuid) -> Result<Vec<Sale>, Error> {
        let tables = self.tables.lock()?;
        tables.customer_exists(customer_id)?;

        Ok(tables.customer_sales(customer_id))
    }

    async fn get_stamp_ledger(&self, customer_id: Uuid) -> Result<StampLedger, Error> {
        let tables = self.tables.lock()?;
        tables.customer_exists(customer_id)?;

        let mut ledger = StampLedger::new(customer_id);
        for stamp in tables.customer_stamps(customer_id) {
            ledger.next_sequence += 1;
            if !stamp.is_grouped() {
                ledger.ungrouped.push(stamp.clone());
            }
        }
        ledger.ungrouped.sort_by_key(|stamp| stamp.sequence);

        Ok(ledger)
    }

    async fn commit_stamp(&self, commit: StampCommit) -> Result<Stamp, Error> {
        let mut tables = self.tables.lock()?;
        // Nothing is written before the whole commit is known to be valid
        tables.validate_commit(&commit)?;

        let stamp = commit.stored_stamp();
        tables.stamps.push(stamp.clone());
        for grouping in commit.groupings {
            let voucher_id = grouping.voucher.voucher_id;
            tables.vouchers.push(grouping.voucher);
            for stored in tables
                .stamps
                .iter_mut()
                .filter(|stored| grouping.stamp_ids.contains(&stored.stamp_id))
            {
                stored.grouped_in = Some(voucher_id);
            }
        }

        Ok(stamp)
    }

    async fn list_stamps(&self, customer_id: Uuid) -> Result<Vec<Stamp>, Error> {
        let tables = self.tables.lock()?;
        tables.customer_exists(customer_id)?;

        Ok(tables.sorted_stamps(customer_id))
    }

    async fn create_voucher(&self, voucher: Voucher) -> Result<Voucher, Error> {
        let mut tables = self.tables.lock()?;
        tables.customer_exists(voucher.customer_id)?;

        if let Some(product_id) = voucher.redeemed_with {
            tables.product_exists(product_id)?;
            if tables
                .vouchers
                .iter()
                .any(|v| v.redeemed_with == Some(product_id))
            {
                return Err(Error::ProductAlreadyRedeemed(product_id));
            }
        }

        tables.vouchers.push(voucher.clone());
        Ok(voucher)
    }

    async fn list_vouchers(&self, customer_id: Uuid) -> Result<Vec<Voucher>, Error> {
        let tables = self.tables.lock()?;
        tables.customer_exists(customer_id)?;

        Ok(tables.customer_vouchers(customer_id))
    }
}

/// Erased [`PoisonError`]
///
/// `PoisonError` keeps the `MutexGuard` internally, which is not send. Thus we erase the error
/// and only keep the string representation instead.
#[derive(Debug, thiserror::Error)]
#[error("poison error: {0}")]
pub struct ErasedPoisonError(String);

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}
