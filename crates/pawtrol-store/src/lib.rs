//! `pawtrol-store` — SQLite persistence for reminders and their delivery
//! state.
//!
//! One `reminders` row represents one scheduled care event; there is no
//! separate notification entity. Delivery state lives in the
//! `notification_sent` column, timestamps are RFC 3339 TEXT (lexicographic
//! comparison works because every value is written in UTC with the same
//! format), and enum-shaped columns (`notify_config`, `recurrence`) are
//! JSON-encoded.

pub mod db;
pub mod error;
pub mod reminders;
pub mod types;

pub use error::{Result, StoreError};
pub use reminders::{DueCandidate, ReminderStore};
pub use types::{
    LeadPreset, LeadUnit, NotifyConfig, Recurrence, RecurrenceUnit, Reminder, ReminderStatus,
};
