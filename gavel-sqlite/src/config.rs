use gavel_core::models::Config;
use rusqlite::{Connection, OptionalExtension};

use crate::db;

// The engine configuration is stored as a single JSON row so a store
// cannot be reopened under different timing rules than it was created
// with. `Config` already knows how to (de)serialize itself through its
// raw primitive form, so this is a thin get/set pair.

pub(crate) fn get(conn: &Connection) -> Result<Option<Config>, db::Error> {
    let response: Option<serde_json::Value> = conn
        .query_row("select data from config where id = 0 limit 1", (), |row| {
            row.get(0)
        })
        .optional()?;

    if let Some(config_data) = response {
        let config: Config = serde_json::from_value(config_data)?;
        Ok(Some(config))
    } else {
        Ok(None)
    }
}

pub(crate) fn set(config: &Config, conn: &Connection) -> Result<(), db::Error> {
    conn.execute(
        "insert into config (id, data) values (0, ?1) on conflict (id) do update set data = excluded.data",
        (serde_json::to_value(config)?,),
    )?;
    Ok(())
}
