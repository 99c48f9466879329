//! Read-only services
//!
//! Counters are computed from the current rows on every request, since recording stamps moves
//! stamps and vouchers between the available and used sets.

pub mod customer_records;
pub mod customer_summary;
pub mod products;
