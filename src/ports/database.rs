use uuid::Uuid;

use crate::domain::{Customer, Product, Sale, Stamp, StampCommit, StampLedger, Voucher};

#[mockall::automock]
#[async_trait::async_trait]
pub trait DatabasePort {
    async fn create_customer(&self, customer: Customer) -> Result<Customer, Error>;
    async fn get_customer(&self, customer_id: Uuid) -> Result<Customer, Error>;
    async fn list_customers(&self) -> Result<Vec<Customer>, Error>;
    /// A customer with their stamps, vouchers and sales, all read at the same point in time
    async fn get_customer_records(&self, customer_id: Uuid) -> Result<CustomerRecords, Error>;

    /// Store a new product
    ///
    /// The serial number must be unused and the sale, if any, must exist.
    async fn create_product(&self, product: Product) -> Result<Product, Error>;
    async fn get_product(&self, product_id: Uuid) -> Result<Product, Error>;
    /// Products ordered by insertion, with the total number of products
    async fn list_products(&self, offset: usize, limit: usize) -> Result<ProductPage, Error>;

    async fn create_sale(&self, sale: Sale) -> Result<Sale, Error>;
    async fn list_sales(&self, customer_id: Uuid) -> Result<Vec<Sale>, Error>;

    /// Ungrouped stamps of a customer, ordered by sequence
    async fn get_stamp_ledger(&self, customer_id: Uuid) -> Result<StampLedger, Error>;
    /// Insert a stamp and apply the voucher groupings planned with it
    ///
    /// Either everything in the commit is written, or nothing is.
    async fn commit_stamp(&self, commit: StampCommit) -> Result<Stamp, Error>;
    async fn list_stamps(&self, customer_id: Uuid) -> Result<Vec<Stamp>, Error>;

    /// Store a voucher
    ///
    /// The product it was redeemed with, if any, must exist and not be used by another voucher.
    async fn create_voucher(&self, voucher: Voucher) -> Result<Voucher, Error>;
    async fn list_vouchers(&self, customer_id: Uuid) -> Result<Vec<Voucher>, Error>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerRecords {
    pub customer: Customer,
    /// Ordered by sequence
    pub stamps: Vec<Stamp>,
    pub vouchers: Vec<Voucher>,
    pub sales: Vec<Sale>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductPage {
    /// Total number of products, across all pages
    pub count: usize,
    pub products: Vec<Product>,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("customer {0} does not exist")]
    CustomerNotFound(Uuid),
    #[error("product {0} does not exist")]
    ProductNotFound(Uuid),
    #[error("sale {0} does not exist")]
    SaleNotFound(Uuid),

    #[error("serial number {0:?} is already used")]
    DuplicateSerialNumber(String),
    #[error("product {0} already generated a stamp")]
    ProductAlreadyStamped(Uuid),
    #[error("product {0} was already obtained with a voucher")]
    ProductAlreadyRedeemed(Uuid),

    /// The stamps of a customer changed since the ledger was read
    ///
    /// The commit must be planned again from a fresh ledger.
    #[error("stale ledger for customer {customer_id}: expected {expected} stamps, found {actual}")]
    StaleLedger {
        customer_id: Uuid,
        expected: u64,
        actual: u64,
    },

    /// A grouping references a stamp that cannot be grouped
    ///
    /// The stamp does not exist, belongs to another customer, is already grouped or appears in
    /// more than one grouping.
    #[error("stamp {0} cannot be grouped")]
    InvalidGrouping(Uuid),

    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
