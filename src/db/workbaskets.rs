//! Workbasket row operations.
//!
//! Rows carry the workbasket's own fields only; distribution targets live in
//! `distribution_targets` and are attached by the manager.

use crate::error::Result;
use crate::types::Workbasket;
use rusqlite::{params, Connection, Row};

pub fn parse_workbasket_row(row: &Row) -> rusqlite::Result<Workbasket> {
    Ok(Workbasket {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        owner: row.get("owner")?,
        created: row.get("created_at")?,
        modified: row.get("modified_at")?,
        distribution_targets: Vec::new(),
    })
}

pub fn insert(conn: &Connection, workbasket: &Workbasket) -> Result<()> {
    conn.execute(
        "INSERT INTO workbaskets (id, name, description, owner, created_at, modified_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            workbasket.id,
            workbasket.name,
            workbasket.description,
            workbasket.owner,
            workbasket.created,
            workbasket.modified,
        ],
    )?;
    Ok(())
}

/// Replace the mutable columns of an existing row. `created_at` is never
/// written. Returns the number of rows touched.
pub fn update(conn: &Connection, workbasket: &Workbasket) -> Result<usize> {
    let rows = conn.execute(
        "UPDATE workbaskets SET name = ?2, description = ?3, owner = ?4, modified_at = ?5
         WHERE id = ?1",
        params![
            workbasket.id,
            workbasket.name,
            workbasket.description,
            workbasket.owner,
            workbasket.modified,
        ],
    )?;
    Ok(rows)
}

pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<Workbasket>> {
    let mut stmt = conn.prepare("SELECT * FROM workbaskets WHERE id = ?1")?;

    match stmt.query_row(params![id], parse_workbasket_row) {
        Ok(workbasket) => Ok(Some(workbasket)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list(conn: &Connection) -> Result<Vec<Workbasket>> {
    let mut stmt = conn.prepare("SELECT * FROM workbaskets ORDER BY created_at, id")?;
    let workbaskets = stmt
        .query_map([], parse_workbasket_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(workbaskets)
}
