// These implement the respective *Repository traits
mod auction;
mod notification;
mod settlement;

use crate::db;
use gavel_core::ports::{MarketRepository, Repository};

impl Repository for db::Database {
    type Error = db::Error;
}

// This trait does nothing, other than prove we have everything we need.
impl MarketRepository for db::Database {}
