//! Distribution-target edge rows.
//!
//! Each row is a directed edge `source_id -> target_id` with a `position`
//! that preserves the caller's ordering. No cycle detection happens here.

use crate::error::Result;
use rusqlite::{params, Connection};

/// Insert one edge per target, in order.
pub fn insert_all(conn: &Connection, source_id: &str, targets: &[String]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO distribution_targets (source_id, target_id, position) VALUES (?1, ?2, ?3)",
    )?;
    for (position, target_id) in targets.iter().enumerate() {
        stmt.execute(params![source_id, target_id, position as i64])?;
    }
    Ok(())
}

/// Delete every outgoing edge of `source_id`. Returns the number removed.
pub fn delete_for_source(conn: &Connection, source_id: &str) -> Result<usize> {
    let rows = conn.execute(
        "DELETE FROM distribution_targets WHERE source_id = ?1",
        params![source_id],
    )?;
    Ok(rows)
}

/// Target ids of `source_id`, in stored order.
pub fn find_for_source(conn: &Connection, source_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT target_id FROM distribution_targets WHERE source_id = ?1 ORDER BY position",
    )?;
    let targets = stmt
        .query_map(params![source_id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(targets)
}
