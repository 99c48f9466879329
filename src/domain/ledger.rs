use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Number of stamps bundled into a voucher unless configured otherwise
pub const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(size) => size,
    None => panic!("batch size must be non-zero"),
};

/// Unit of loyalty credit owned by a customer
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Stamp {
    pub stamp_id: Uuid,
    pub customer_id: Uuid,
    /// Position of this stamp in the customer's stamp stream
    ///
    /// Starts at 0 for the first stamp of a customer and increases by one for every stamp
    /// recorded afterwards. Stamps are grouped in ascending `sequence` order.
    pub sequence: u64,
    /// Product whose purchase generated this stamp, `None` for free stamps
    pub obtained_with: Option<Uuid>,
    /// Voucher this stamp was grouped into
    ///
    /// Once set, this never changes.
    pub grouped_in: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Stamp {
    pub fn new(customer_id: Uuid, sequence: u64, obtained_with: Option<Uuid>) -> Self {
        Self {
            stamp_id: Uuid::new_v4(),
            customer_id,
            sequence,
            obtained_with,
            grouped_in: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_grouped(&self) -> bool {
        self.grouped_in.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherStatus {
    Available,
    Redeemed,
}

/// Reward a customer can exchange for a product
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Voucher {
    pub voucher_id: Uuid,
    pub customer_id: Uuid,
    pub date: DateTime<Utc>,
    /// Product this voucher was exchanged for
    pub redeemed_with: Option<Uuid>,
}

impl Voucher {
    pub fn new(
        customer_id: Uuid,
        date: Option<DateTime<Utc>>,
        redeemed_with: Option<Uuid>,
    ) -> Self {
        Self {
            voucher_id: Uuid::new_v4(),
            customer_id,
            date: date.unwrap_or_else(Utc::now),
            redeemed_with,
        }
    }

    pub fn status(&self) -> VoucherStatus {
        match self.redeemed_with {
            None => VoucherStatus::Available,
            Some(_) => VoucherStatus::Redeemed,
        }
    }
}

/// Snapshot of the stamps of a customer that are not part of a voucher yet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StampLedger {
    pub customer_id: Uuid,
    /// Sequence number the next stamp of this customer must carry
    ///
    /// This doubles as the version of the ledger: a commit planned against this snapshot is
    /// only valid while the customer has exactly `next_sequence` stamps.
    pub next_sequence: u64,
    /// Ungrouped stamps
    pub ungrouped: Vec<Stamp>,
}

/// A new voucher and the stamps that were bundled into it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoucherGrouping {
    pub voucher: Voucher,
    pub stamp_ids: Vec<Uuid>,
}

/// Everything that must be written at once when recording a stamp
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StampCommit {
    /// Number of stamps the customer had when this commit was planned
    pub expected_sequence: u64,
    pub stamp: Stamp,
    pub groupings: Vec<VoucherGrouping>,
}

impl StampLedger {
    pub fn new(customer_id: Uuid) -> Self {
        Self {
            customer_id,
            next_sequence: 0,
            ungrouped: Vec::default(),
        }
    }

    /// Plan the recording of a new stamp
    ///
    /// The new stamp joins the ungrouped stamps. While at least `batch_size` stamps are
    /// ungrouped, the oldest `batch_size` of them are bundled into a new voucher. Stamps with
    /// a `grouped_in` value in the ledger are ignored.
    pub fn record(&self, obtained_with: Option<Uuid>, batch_size: NonZeroUsize) -> StampCommit {
        let stamp = Stamp::new(self.customer_id, self.next_sequence, obtained_with);

        let mut pending: Vec<&Stamp> = self
            .ungrouped
            .iter()
            .filter(|stamp| !stamp.is_grouped())
            .chain(std::iter::once(&stamp))
            .collect();
        pending.sort_by_key(|stamp| (stamp.sequence, stamp.stamp_id));

        let groupings = pending
            .chunks_exact(batch_size.get())
            .map(|batch| VoucherGrouping {
                voucher: Voucher::new(self.customer_id, None, None),
                stamp_ids: batch.iter().map(|stamp| stamp.stamp_id).collect(),
            })
            .collect();

        StampCommit {
            expected_sequence: self.next_sequence,
            stamp,
            groupings,
        }
    }
}

impl StampCommit {
    /// The recorded stamp as it will look once the commit is applied
    pub fn stored_stamp(&self) -> Stamp {
        let grouped_in = self
            .groupings
            .iter()
            .find(|grouping| grouping.stamp_ids.contains(&self.stamp.stamp_id))
            .map(|grouping| grouping.voucher.voucher_id);

        Stamp {
            grouped_in,
            ..self.stamp.clone()
        }
    }
}
