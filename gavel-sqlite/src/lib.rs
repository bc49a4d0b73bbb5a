//! SQLite-backed implementation of the `gavel-core` ports: auction
//! records with their bid ledgers, persisted notifications, and
//! settlement bookkeeping, all mutated through conditional writes so
//! that concurrent bids, buy-nows, and scheduler sweeps serialize per
//! auction record.

mod config;
pub mod db;
mod r#impl;

// This manages our database setup/migrations
mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("./sql");
}

mod datetime;
pub use datetime::DateTime;
