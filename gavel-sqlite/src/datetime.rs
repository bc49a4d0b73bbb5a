use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef};
use std::borrow::Borrow;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Bridge between `gavel-core`'s `OffsetDateTime` timestamps and the
/// naive datetimes SQLite stores. Every timestamp column goes through
/// this wrapper, so values are normalized to UTC on the way in and
/// reassume UTC on the way out.
pub struct DateTime(PrimitiveDateTime);

impl<T: Borrow<OffsetDateTime>> From<T> for DateTime {
    fn from(value: T) -> Self {
        let utc = value.borrow().to_offset(UtcOffset::UTC);
        Self(PrimitiveDateTime::new(utc.date(), utc.time()))
    }
}

impl From<DateTime> for OffsetDateTime {
    fn from(value: DateTime) -> Self {
        value.0.assume_utc()
    }
}

impl ToSql for DateTime {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for DateTime {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        PrimitiveDateTime::column_result(value).map(Self)
    }
}
