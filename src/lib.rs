//! Loyalty program bookkeeping
//!
//! Customers collect stamps when buying products. Every full batch of ungrouped stamps is
//! bundled into a voucher, which can later be redeemed for a product.

pub mod adapters;
pub mod commands;
pub mod config;
pub mod domain;
pub mod ports;
pub mod queries;
