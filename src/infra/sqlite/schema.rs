use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open db: {}", db_path.display()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign key enforcement")?;
    Ok(conn)
}

pub fn init_db(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let conn = open_connection(db_path)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS meter_group (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_by  TEXT NOT NULL,
            customer_id TEXT,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS group_meter (
            group_id    INTEGER NOT NULL,
            meter_id    INTEGER NOT NULL,
            added_at    TEXT NOT NULL,
            PRIMARY KEY (group_id, meter_id),
            FOREIGN KEY (group_id) REFERENCES meter_group(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_group_meter_meter
            ON group_meter(meter_id);
        ",
    )
    .context("failed to initialize schema")?;

    Ok(())
}
