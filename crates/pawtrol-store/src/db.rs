use rusqlite::Connection;

use crate::error::Result;

/// Initialise the reminder schema in `conn`. Safe to call on every startup —
/// CREATE IF NOT EXISTS means it's idempotent.
///
/// `owners`, `pets` and `reminder_types` exist only at the boundary this
/// engine needs: resolving a pet's owner's chat id and labelling the
/// notification. The CRUD surface owns their full shape.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS owners (
            id                TEXT NOT NULL PRIMARY KEY,
            name              TEXT NOT NULL,
            telegram_chat_id  TEXT,              -- NULL means no push channel
            created_at        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS pets (
            id          TEXT NOT NULL PRIMARY KEY,
            owner_id    TEXT NOT NULL REFERENCES owners(id),
            name        TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reminder_types (
            id      TEXT NOT NULL PRIMARY KEY,
            label   TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS reminders (
            id                 TEXT    NOT NULL PRIMARY KEY,
            pet_id             TEXT    NOT NULL REFERENCES pets(id),
            reminder_type_id   TEXT    NOT NULL REFERENCES reminder_types(id),
            event_time         TEXT    NOT NULL,   -- ISO-8601 UTC
            notes              TEXT,
            status             TEXT    NOT NULL DEFAULT 'pending',
            hidden             INTEGER NOT NULL DEFAULT 0,
            notification_sent  INTEGER NOT NULL DEFAULT 0,
            notify_config      TEXT,               -- JSON-encoded NotifyConfig
            recurrence         TEXT,               -- JSON-encoded Recurrence
            created_at         TEXT    NOT NULL,
            updated_at         TEXT    NOT NULL
        ) STRICT;

        -- Efficient scanning: WHERE status='pending' AND event_time <= ?
        CREATE INDEX IF NOT EXISTS idx_reminders_scan
            ON reminders (status, event_time);
        ",
    )?;
    Ok(())
}
