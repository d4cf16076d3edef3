use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    db::init_db,
    error::{Result, StoreError},
    types::{NotifyConfig, Recurrence, Reminder, ReminderStatus},
};

/// A scan hit: the reminder plus everything the engine needs to notify —
/// the pet's name, the care-type label and the owner's optional chat id.
///
/// Recipient resolution happens here, in the JOIN, so the engine never has
/// to walk pet → owner itself. `recipient` being `None` is a valid state
/// (owner never linked a chat), not an error.
#[derive(Debug, Clone)]
pub struct DueCandidate {
    pub reminder: Reminder,
    pub pet_name: String,
    pub type_label: String,
    pub recipient: Option<String>,
}

/// Column list shared by the candidate and overdue scans so the row mapping
/// stays in one place.
const CANDIDATE_SELECT: &str = "
    SELECT r.id, r.pet_id, r.reminder_type_id, r.event_time, r.notes,
           r.status, r.hidden, r.notification_sent, r.notify_config,
           r.recurrence, r.created_at, r.updated_at,
           p.name, t.label, o.telegram_chat_id
    FROM reminders r
    JOIN pets p            ON p.id = r.pet_id
    JOIN reminder_types t  ON t.id = r.reminder_type_id
    JOIN owners o          ON o.id = p.owner_id";

/// SQLite-backed reminder store.
///
/// Owns its `Connection`; the engine holds the store by value and other
/// subsystems open their own connection to the same file (WAL mode).
pub struct ReminderStore {
    conn: Connection,
}

impl ReminderStore {
    /// Wrap a connection, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self { conn })
    }

    /// Insert a new reminder (status=pending, notification_sent=0, hidden=0).
    pub fn create_reminder(
        &self,
        pet_id: &str,
        reminder_type_id: &str,
        event_time: DateTime<Utc>,
        notes: Option<&str>,
        notify_config: Option<NotifyConfig>,
        recurrence: Option<Recurrence>,
    ) -> Result<Reminder> {
        let now_str = Utc::now().to_rfc3339();
        let id = Uuid::new_v4().to_string();
        let notify_json = notify_config
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::InvalidConfig(e.to_string()))?;
        let recurrence_json = recurrence
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::InvalidConfig(e.to_string()))?;

        self.conn.execute(
            "INSERT INTO reminders
             (id, pet_id, reminder_type_id, event_time, notes, status,
              hidden, notification_sent, notify_config, recurrence,
              created_at, updated_at)
             VALUES (?1,?2,?3,?4,?5,'pending',0,0,?6,?7,?8,?8)",
            rusqlite::params![
                id,
                pet_id,
                reminder_type_id,
                event_time.to_rfc3339(),
                notes,
                notify_json,
                recurrence_json,
                now_str
            ],
        )?;
        debug!(reminder_id = %id, pet_id, "reminder created");

        Ok(Reminder {
            id,
            pet_id: pet_id.to_string(),
            reminder_type_id: reminder_type_id.to_string(),
            event_time,
            notes: notes.map(String::from),
            status: ReminderStatus::Pending,
            hidden: false,
            notification_sent: false,
            notify_config,
            recurrence,
            created_at: now_str.clone(),
            updated_at: now_str,
        })
    }

    /// Fetch a single reminder by ID.
    pub fn get_reminder(&self, id: &str) -> Result<Option<Reminder>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, pet_id, reminder_type_id, event_time, notes, status,
                    hidden, notification_sent, notify_config, recurrence,
                    created_at, updated_at
             FROM reminders WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map([id], reminder_row)?;
        match rows.next() {
            Some(row) => Ok(reminder_from_parts(row?)),
            None => Ok(None),
        }
    }

    /// Change user-facing status. Transitioning back to pending re-arms the
    /// reminder: `notification_sent` drops to 0 so a future due date can
    /// fire again.
    pub fn set_status(&self, id: &str, status: ReminderStatus) -> Result<()> {
        let now_str = Utc::now().to_rfc3339();
        let n = match status {
            ReminderStatus::Pending => self.conn.execute(
                "UPDATE reminders
                 SET status='pending', notification_sent=0, updated_at=?2
                 WHERE id=?1",
                rusqlite::params![id, now_str],
            )?,
            ReminderStatus::Completed => self.conn.execute(
                "UPDATE reminders SET status='completed', updated_at=?2
                 WHERE id=?1",
                rusqlite::params![id, now_str],
            )?,
        };
        if n == 0 {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        Ok(())
    }

    /// Set the exactly-once guard. The `notification_sent=0` predicate is an
    /// optimistic re-check: returns false when another cycle got there
    /// first, so the caller knows not to count the delivery twice.
    pub fn mark_notified(&self, id: &str) -> Result<bool> {
        let now_str = Utc::now().to_rfc3339();
        let n = self.conn.execute(
            "UPDATE reminders SET notification_sent=1, updated_at=?2
             WHERE id=?1 AND notification_sent=0",
            rusqlite::params![id, now_str],
        )?;
        Ok(n > 0)
    }

    /// Bulk soft-delete of a pet's completed reminders. The only code path
    /// that sets `hidden`, which is what keeps `hidden ⇒ completed` true.
    pub fn clear_completed(&self, pet_id: &str) -> Result<usize> {
        let now_str = Utc::now().to_rfc3339();
        let n = self.conn.execute(
            "UPDATE reminders SET hidden=1, updated_at=?2
             WHERE pet_id=?1 AND status='completed' AND hidden=0",
            rusqlite::params![pet_id, now_str],
        )?;
        Ok(n)
    }

    /// Scan for primary-path candidates: pending, not yet notified, event
    /// time within `now + lookahead`. Unordered; no pagination — fine at
    /// expected volumes, revisit if a single household ever holds thousands
    /// of open reminders.
    pub fn list_due_candidates(
        &self,
        now: DateTime<Utc>,
        lookahead: Duration,
    ) -> Result<Vec<DueCandidate>> {
        let horizon = (now + lookahead).to_rfc3339();
        let sql = format!(
            "{CANDIDATE_SELECT}
             WHERE r.status = 'pending' AND r.notification_sent = 0
               AND r.hidden = 0 AND r.event_time <= ?1"
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows: Vec<_> = stmt
            .query_map([&horizon], candidate_row)?
            .filter_map(|r| r.ok())
            .filter_map(candidate_from_parts)
            .collect();
        Ok(rows)
    }

    /// Scan for the overdue sweep: pending reminders whose event time fell
    /// in `[now - window, now)` — deliberately NOT filtered on
    /// `notification_sent` (this is the coarse catch-up path).
    pub fn list_overdue(&self, now: DateTime<Utc>, window: Duration) -> Result<Vec<DueCandidate>> {
        let from = (now - window).to_rfc3339();
        let to = now.to_rfc3339();
        let sql = format!(
            "{CANDIDATE_SELECT}
             WHERE r.status = 'pending' AND r.hidden = 0
               AND r.event_time >= ?1 AND r.event_time < ?2"
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows: Vec<_> = stmt
            .query_map([&from, &to], candidate_row)?
            .filter_map(|r| r.ok())
            .filter_map(candidate_from_parts)
            .collect();
        Ok(rows)
    }

    // --- owner / pet / type fixtures ---------------------------------------

    /// Register an owner. `telegram_chat_id` is the push recipient; `None`
    /// is a valid steady state (owner never linked the bot).
    pub fn add_owner(&self, name: &str, telegram_chat_id: Option<&str>) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO owners (id, name, telegram_chat_id, created_at)
             VALUES (?1,?2,?3,?4)",
            rusqlite::params![id, name, telegram_chat_id, Utc::now().to_rfc3339()],
        )?;
        Ok(id)
    }

    pub fn add_pet(&self, owner_id: &str, name: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO pets (id, owner_id, name, created_at) VALUES (?1,?2,?3,?4)",
            rusqlite::params![id, owner_id, name, Utc::now().to_rfc3339()],
        )?;
        Ok(id)
    }

    pub fn add_reminder_type(&self, label: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO reminder_types (id, label) VALUES (?1,?2)",
            rusqlite::params![id, label],
        )?;
        Ok(id)
    }
}

// --- row mapping -----------------------------------------------------------

type ReminderParts = (
    String,         // id
    String,         // pet_id
    String,         // reminder_type_id
    String,         // event_time
    Option<String>, // notes
    String,         // status
    bool,           // hidden
    bool,           // notification_sent
    Option<String>, // notify_config JSON
    Option<String>, // recurrence JSON
    String,         // created_at
    String,         // updated_at
);

fn reminder_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReminderParts> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
    ))
}

fn candidate_row(
    row: &rusqlite::Row<'_>,
) -> rusqlite::Result<(ReminderParts, String, String, Option<String>)> {
    Ok((
        reminder_row(row)?,
        row.get(12)?, // pet name
        row.get(13)?, // type label
        row.get(14)?, // owner telegram_chat_id
    ))
}

/// Build a typed `Reminder` from raw columns, skipping (and logging) rows
/// with unparseable timestamps or JSON rather than failing the whole scan.
fn reminder_from_parts(parts: ReminderParts) -> Option<Reminder> {
    let (
        id,
        pet_id,
        reminder_type_id,
        event_time,
        notes,
        status_str,
        hidden,
        notification_sent,
        notify_json,
        recurrence_json,
        created_at,
        updated_at,
    ) = parts;

    let event_time = match DateTime::parse_from_rfc3339(&event_time) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(e) => {
            warn!(reminder_id = %id, "bad event_time in row: {e}");
            return None;
        }
    };
    let status: ReminderStatus = match status_str.parse() {
        Ok(s) => s,
        Err(e) => {
            warn!(reminder_id = %id, "{e}");
            return None;
        }
    };
    // A malformed notify_config degrades to "fire at event time" instead of
    // hiding the reminder from the scan.
    let notify_config = notify_json.and_then(|j| match serde_json::from_str(&j) {
        Ok(c) => Some(c),
        Err(e) => {
            warn!(reminder_id = %id, "bad notify_config JSON, treating as none: {e}");
            None
        }
    });
    let recurrence = recurrence_json.and_then(|j| serde_json::from_str(&j).ok());

    Some(Reminder {
        id,
        pet_id,
        reminder_type_id,
        event_time,
        notes,
        status,
        hidden,
        notification_sent,
        notify_config,
        recurrence,
        created_at,
        updated_at,
    })
}

fn candidate_from_parts(
    (parts, pet_name, type_label, recipient): (ReminderParts, String, String, Option<String>),
) -> Option<DueCandidate> {
    Some(DueCandidate {
        reminder: reminder_from_parts(parts)?,
        pet_name,
        type_label,
        recipient,
    })
}
