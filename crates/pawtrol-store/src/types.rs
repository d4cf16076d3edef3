use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User-facing lifecycle state of a reminder.
///
/// The engine reads this but only ever mutates delivery-related columns;
/// transitions come from the CRUD surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Pending,
    Completed,
}

impl std::fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReminderStatus::Pending => "pending",
            ReminderStatus::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ReminderStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReminderStatus::Pending),
            "completed" => Ok(ReminderStatus::Completed),
            other => Err(format!("unknown reminder status: {other}")),
        }
    }
}

/// How far before the event time to notify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotifyConfig {
    /// One of the fixed lead-time presets offered by the UI.
    Preset { preset: LeadPreset },
    /// Explicit `value × unit` lead time.
    Custom { value: i64, unit: LeadUnit },
}

/// Fixed lead-time ladder. `1day` is the largest supported lead; the
/// scanner's lookahead window must stay above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadPreset {
    #[serde(rename = "at_start")]
    AtStart,
    #[serde(rename = "1min")]
    Min1,
    #[serde(rename = "5min")]
    Min5,
    #[serde(rename = "10min")]
    Min10,
    #[serde(rename = "30min")]
    Min30,
    #[serde(rename = "1hour")]
    Hour1,
    #[serde(rename = "2hour")]
    Hour2,
    #[serde(rename = "12hour")]
    Hour12,
    #[serde(rename = "1day")]
    Day1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadUnit {
    Min,
    Hour,
    Day,
}

/// Recurrence template attached by the CRUD surface.
///
/// Persisted verbatim; this engine never expands it into new reminder rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    /// Template type as written by the CRUD surface ("repeat" in practice).
    #[serde(rename = "type")]
    pub template: String,
    pub interval: u32,
    pub unit: RecurrenceUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceUnit {
    Day,
    Week,
    Month,
    Year,
}

/// A persisted reminder record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    /// UUID v4 string — primary key.
    pub id: String,
    /// Owning pet.
    pub pet_id: String,
    /// Category of care event (vaccination, grooming, …).
    pub reminder_type_id: String,
    /// The instant the reminder is *about* — not when to notify.
    pub event_time: DateTime<Utc>,
    /// Free text shown in the notification, if any.
    pub notes: Option<String>,
    pub status: ReminderStatus,
    /// Soft-delete flag set by the bulk "clear completed" path.
    pub hidden: bool,
    /// Exactly-once guard for the primary delivery path. Reset whenever
    /// status transitions back to pending.
    pub notification_sent: bool,
    /// Lead-time descriptor; `None` means "fire exactly at event time".
    pub notify_config: Option<NotifyConfig>,
    pub recurrence: Option<Recurrence>,
    /// ISO-8601 timestamp of row creation.
    pub created_at: String,
    /// ISO-8601 timestamp of the last mutation.
    pub updated_at: String,
}
