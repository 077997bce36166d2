//! Workbasket access item rows.

use crate::error::Result;
use crate::types::WorkbasketAccessItem;
use rusqlite::{params, Connection, Row};

pub fn parse_access_item_row(row: &Row) -> rusqlite::Result<WorkbasketAccessItem> {
    Ok(WorkbasketAccessItem {
        id: row.get("id")?,
        workbasket_id: row.get("workbasket_id")?,
        principal: row.get("principal")?,
        read: row.get("perm_read")?,
        open: row.get("perm_open")?,
        write: row.get("perm_write")?,
        append: row.get("perm_append")?,
        transfer: row.get("perm_transfer")?,
        distribute: row.get("perm_distribute")?,
    })
}

pub fn insert(conn: &Connection, item: &WorkbasketAccessItem) -> Result<()> {
    conn.execute(
        "INSERT INTO workbasket_access_items
            (id, workbasket_id, principal, perm_read, perm_open, perm_write,
             perm_append, perm_transfer, perm_distribute)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            item.id,
            item.workbasket_id,
            item.principal,
            item.read,
            item.open,
            item.write,
            item.append,
            item.transfer,
            item.distribute,
        ],
    )?;
    Ok(())
}

/// Replace principal and flags of an existing row. Returns the number of rows touched.
pub fn update(conn: &Connection, item: &WorkbasketAccessItem) -> Result<usize> {
    let rows = conn.execute(
        "UPDATE workbasket_access_items
         SET principal = ?2, perm_read = ?3, perm_open = ?4, perm_write = ?5,
             perm_append = ?6, perm_transfer = ?7, perm_distribute = ?8
         WHERE id = ?1",
        params![
            item.id,
            item.principal,
            item.read,
            item.open,
            item.write,
            item.append,
            item.transfer,
            item.distribute,
        ],
    )?;
    Ok(rows)
}

pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<WorkbasketAccessItem>> {
    let mut stmt = conn.prepare("SELECT * FROM workbasket_access_items WHERE id = ?1")?;

    match stmt.query_row(params![id], parse_access_item_row) {
        Ok(item) => Ok(Some(item)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_by_workbasket(conn: &Connection, workbasket_id: &str) -> Result<Vec<WorkbasketAccessItem>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM workbasket_access_items WHERE workbasket_id = ?1 ORDER BY rowid",
    )?;
    let items = stmt
        .query_map(params![workbasket_id], parse_access_item_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

pub fn find_for_principal(
    conn: &Connection,
    workbasket_id: &str,
    principal: &str,
) -> Result<Vec<WorkbasketAccessItem>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM workbasket_access_items
         WHERE workbasket_id = ?1 AND principal = ?2
         ORDER BY rowid",
    )?;
    let items = stmt
        .query_map(params![workbasket_id, principal], parse_access_item_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}
