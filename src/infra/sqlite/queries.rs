use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};

use crate::domain::entities::group::{GroupId, GroupUpdate, MeterGroup, NewGroup};
use crate::domain::entities::meter::{MeterId, MeterSet};
use crate::infra::sqlite::schema::open_connection;
use crate::usecase::ports::repo::GroupSummary;

fn now_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn sql_meter_id(meter_id: MeterId) -> Result<i64> {
    i64::try_from(meter_id.get())
        .with_context(|| format!("meter id {meter_id} does not fit a sqlite integer"))
}

fn insert_group_meters(
    tx: &rusqlite::Transaction<'_>,
    group_id: i64,
    meter_ids: &[MeterId],
    added_at: &str,
) -> Result<usize> {
    let mut insert_meter = tx
        .prepare(
            "INSERT OR IGNORE INTO group_meter(group_id, meter_id, added_at)
             VALUES (?1, ?2, ?3)",
        )
        .context("failed to prepare group meter insert")?;

    let mut inserted = 0;
    for meter_id in meter_ids {
        inserted += insert_meter
            .execute(params![group_id, sql_meter_id(*meter_id)?, added_at])
            .context("failed to insert group meter")?;
    }

    Ok(inserted)
}

fn group_exists(conn: &rusqlite::Connection, group_id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM meter_group WHERE id = ?1",
            [group_id],
            |row| row.get(0),
        )
        .optional()
        .context("failed to look up group")?;
    Ok(found.is_some())
}

pub fn create_group(db_path: &Path, group: &NewGroup) -> Result<i64> {
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start create group transaction")?;
    let now = now_timestamp();

    tx.execute(
        "INSERT INTO meter_group(name, description, created_by, customer_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![
            group.name.trim(),
            group.description,
            group.created_by,
            group.customer_id,
            now
        ],
    )
    .context("failed to insert group")?;
    let group_id = tx.last_insert_rowid();

    insert_group_meters(&tx, group_id, &group.meter_ids, &now)?;

    tx.commit()
        .context("failed to commit create group transaction")?;
    Ok(group_id)
}

pub fn list_groups(db_path: &Path) -> Result<Vec<GroupSummary>> {
    let conn = open_connection(db_path)?;
    let mut stmt = conn
        .prepare(
            "SELECT g.id, g.name, g.description, g.updated_at, COUNT(m.meter_id)
             FROM meter_group g
             LEFT JOIN group_meter m ON m.group_id = g.id
             GROUP BY g.id
             ORDER BY g.id ASC",
        )
        .context("failed to prepare list groups query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(GroupSummary {
                id: GroupId(row.get(0)?),
                name: row.get(1)?,
                description: row.get(2)?,
                updated_at: row.get(3)?,
                meter_count: row.get(4)?,
            })
        })
        .context("failed to query groups")?;

    let mut groups = Vec::new();
    for row in rows {
        groups.push(row.context("failed to read group row")?);
    }
    Ok(groups)
}

pub fn load_group_meter_ids(db_path: &Path, group_id: i64) -> Result<Option<MeterSet>> {
    let conn = open_connection(db_path)?;
    if !group_exists(&conn, group_id)? {
        return Ok(None);
    }

    let mut stmt = conn
        .prepare(
            "SELECT meter_id
             FROM group_meter
             WHERE group_id = ?1
             ORDER BY meter_id ASC",
        )
        .context("failed to prepare group meter query")?;

    let rows = stmt
        .query_map([group_id], |row| row.get::<_, i64>(0))
        .context("failed to query group meters")?;

    let mut meter_ids = MeterSet::new();
    for row in rows {
        let raw = row.context("failed to read group meter row")?;
        let meter_id = MeterId::try_from(raw)
            .with_context(|| format!("group {group_id} holds an invalid meter id"))?;
        meter_ids.insert(meter_id);
    }
    Ok(Some(meter_ids))
}

pub fn load_group(db_path: &Path, group_id: i64) -> Result<Option<MeterGroup>> {
    let conn = open_connection(db_path)?;
    let group = conn
        .query_row(
            "SELECT id, name, description, created_by, customer_id, created_at, updated_at
             FROM meter_group
             WHERE id = ?1",
            [group_id],
            |row| {
                Ok(MeterGroup {
                    id: GroupId(row.get(0)?),
                    name: row.get(1)?,
                    description: row.get(2)?,
                    created_by: row.get(3)?,
                    customer_id: row.get(4)?,
                    meter_ids: MeterSet::new(),
                    created_at: row.get(5)?,
                    updated_at: row.get(6)?,
                })
            },
        )
        .optional()
        .context("failed to load group")?;
    drop(conn);

    let Some(mut group) = group else {
        return Ok(None);
    };
    group.meter_ids = load_group_meter_ids(db_path, group_id)?.unwrap_or_default();
    Ok(Some(group))
}

/// Applies an edit. Returns `false` when the group does not exist.
pub fn update_group(db_path: &Path, group_id: i64, update: &GroupUpdate) -> Result<bool> {
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start update group transaction")?;

    if !group_exists(&tx, group_id)? {
        return Ok(false);
    }
    let now = now_timestamp();

    if let Some(name) = &update.name {
        tx.execute(
            "UPDATE meter_group SET name = ?1 WHERE id = ?2",
            params![name.trim(), group_id],
        )
        .context("failed to rename group")?;
    }
    if let Some(description) = &update.description {
        tx.execute(
            "UPDATE meter_group SET description = ?1 WHERE id = ?2",
            params![description, group_id],
        )
        .context("failed to update group description")?;
    }

    insert_group_meters(&tx, group_id, &update.add_meter_ids, &now)?;

    let mut delete_meter = tx
        .prepare("DELETE FROM group_meter WHERE group_id = ?1 AND meter_id = ?2")
        .context("failed to prepare group meter delete")?;
    for meter_id in &update.remove_meter_ids {
        delete_meter
            .execute(params![group_id, sql_meter_id(*meter_id)?])
            .context("failed to remove group meter")?;
    }
    drop(delete_meter);

    tx.execute(
        "UPDATE meter_group SET updated_at = ?1 WHERE id = ?2",
        params![now, group_id],
    )
    .context("failed to update group timestamp")?;

    tx.commit()
        .context("failed to commit update group transaction")?;
    Ok(true)
}

/// Deletes a group and its membership. Returns `false` when nothing matched.
pub fn delete_group(db_path: &Path, group_id: i64) -> Result<bool> {
    let conn = open_connection(db_path)?;
    let deleted = conn
        .execute("DELETE FROM meter_group WHERE id = ?1", [group_id])
        .context("failed to delete group")?;
    Ok(deleted > 0)
}
