use std::{net::SocketAddr, num::NonZeroUsize};

use clap::Parser;

use crate::{
    commands::{LedgerConfig, DEFAULT_PAGE_SIZE},
    domain::DEFAULT_BATCH_SIZE,
};

#[derive(Clone, Debug, Parser)]
#[command(name = "stamp-ledger", about = "Loyalty stamps and vouchers service")]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "STAMP_LEDGER_LISTEN_ADDR", default_value = "127.0.0.1:8000")]
    pub listen_addr: SocketAddr,

    /// Number of stamps bundled into one voucher
    #[arg(long, env = "STAMP_LEDGER_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: NonZeroUsize,

    /// Number of products per page
    #[arg(long, env = "STAMP_LEDGER_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: NonZeroUsize,

    /// Log filter, in `tracing_subscriber::EnvFilter` syntax
    #[arg(long, env = "STAMP_LEDGER_LOG", default_value = "info")]
    pub log_filter: String,
}

impl Config {
    pub fn ledger(&self) -> LedgerConfig {
        LedgerConfig {
            batch_size: self.batch_size,
            page_size: self.page_size,
        }
    }
}
