use std::{borrow::Cow, fmt, num::NonZeroUsize, sync::Arc};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{
    domain::{ValidationError, DEFAULT_BATCH_SIZE},
    ports::database,
};

pub mod record_product;
pub mod record_sale;
pub mod record_stamp;
pub mod redeem_voucher;
pub mod sign_up;

/// Number of products per page unless configured otherwise
pub const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(20) {
    Some(size) => size,
    None => panic!("page size must be non-zero"),
};

/// Settings of the loyalty program
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Number of stamps bundled into one voucher
    pub batch_size: NonZeroUsize,
    /// Number of products per page when listing products
    pub page_size: NonZeroUsize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

pub struct DomainLogic<D> {
    database: Arc<D>,
    config: LedgerConfig,
    locks: CustomerLocks,
}

impl<D> DomainLogic<D> {
    pub fn new(database: Arc<D>, config: LedgerConfig) -> Self {
        Self {
            database,
            config,
            locks: CustomerLocks::default(),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub(crate) fn database(&self) -> Arc<D> {
        self.database.clone()
    }
}

impl<D> Clone for DomainLogic<D> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            config: self.config,
            locks: self.locks.clone(),
        }
    }
}

/// One lock per customer
///
/// Stamps of the same customer are recorded one at a time, while different customers never
/// wait on each other.
#[derive(Clone, Default)]
pub(crate) struct CustomerLocks {
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl CustomerLocks {
    pub(crate) async fn lock(&self, customer_id: Uuid) -> CustomerGuard {
        // Clone the lock out of the map so the shard is not held while waiting
        let lock = self.locks.entry(customer_id).or_default().clone();
        CustomerGuard {
            customer_id,
            locks: self.locks.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.len()
    }
}

/// Held lock of one customer
///
/// The map entry is removed on release when no other caller holds or waits for it.
#[derive(Debug)]
pub(crate) struct CustomerGuard {
    customer_id: Uuid,
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for CustomerGuard {
    fn drop(&mut self) {
        // Release the mutex first so only the map entry and waiters count
        self.guard.take();
        // The shard stays locked during the check, so no caller can clone the entry meanwhile
        self.locks.remove_if(&self.customer_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    Customer,
    Product,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::Customer => "customer",
            Entity::Product => "product",
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The entity addressed by the request does not exist
    #[error("{entity} {id} does not exist")]
    NotFound { entity: Entity, id: Uuid },

    /// A referenced entity does not exist or cannot be used for this request
    #[error("invalid reference: {0}")]
    InvalidReference(Cow<'static, str>),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The ledger of a customer kept changing while trying to record a stamp
    #[error("too many concurrent updates for customer {0}")]
    Contention(Uuid),

    #[error("database port error: {0:?}")]
    Database(database::Error),
}

impl From<database::Error> for Error {
    fn from(err: database::Error) -> Self {
        use database::Error as E;

        match err {
            E::CustomerNotFound(id) => Error::NotFound {
                entity: Entity::Customer,
                id,
            },
            E::ProductNotFound(_)
            | E::SaleNotFound(_)
            | E::DuplicateSerialNumber(_)
            | E::ProductAlreadyStamped(_)
            | E::ProductAlreadyRedeemed(_) => Error::InvalidReference(err.to_string().into()),
            err => Error::Database(err),
        }
    }
}
