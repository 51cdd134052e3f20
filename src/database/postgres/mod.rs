//! sqlx/Postgres implementation of the repository traits.
//!
//! Queries are built at runtime (`sqlx::query`) and rows are mapped by hand,
//! so the crate compiles without a live database.

mod catalog;
mod notifications;
mod orders;
mod plans;
mod tenants;
mod tickets;
mod users;

use std::str::FromStr;

use sqlx::{postgres::PgRow, PgPool, Row};

use crate::database::manager::DatabaseError;
use crate::types::ParseEnumError;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Reads a TEXT column into one of the string-backed enums in `types`
fn text_column<T>(row: &PgRow, column: &str) -> Result<T, DatabaseError>
where
    T: FromStr<Err = ParseEnumError>,
{
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|e: ParseEnumError| DatabaseError::Decode(format!("{}: {}", column, e)))
}
