use chrono::{DateTime, Utc};

use pawtrol_store::DueCandidate;

/// Render the push-notification text for one candidate.
///
/// Plain text with conventional lightweight markup (`*bold*`); the channel
/// may render it or fall back to sending it verbatim. An overdue marker is
/// appended when the event time has already passed.
pub fn render(candidate: &DueCandidate, now: DateTime<Utc>) -> String {
    let when = candidate.reminder.event_time.format("%Y-%m-%d %H:%M UTC");
    let mut text = format!(
        "🐾 *{}* for *{}*\nWhen: {}",
        candidate.type_label, candidate.pet_name, when
    );
    if candidate.reminder.event_time < now {
        text.push_str(" ⚠️ *overdue*");
    }
    if let Some(notes) = candidate.reminder.notes.as_deref() {
        if !notes.is_empty() {
            text.push_str("\nNotes: ");
            text.push_str(notes);
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pawtrol_store::{Reminder, ReminderStatus};

    fn candidate(event_time: DateTime<Utc>, notes: Option<&str>) -> DueCandidate {
        DueCandidate {
            reminder: Reminder {
                id: "r1".into(),
                pet_id: "p1".into(),
                reminder_type_id: "t1".into(),
                event_time,
                notes: notes.map(String::from),
                status: ReminderStatus::Pending,
                hidden: false,
                notification_sent: false,
                notify_config: None,
                recurrence: None,
                created_at: String::new(),
                updated_at: String::new(),
            },
            pet_name: "Rex".into(),
            type_label: "Grooming".into(),
            recipient: Some("42".into()),
        }
    }

    #[test]
    fn includes_pet_type_and_time() {
        let event = Utc.with_ymd_and_hms(2025, 1, 10, 10, 0, 0).unwrap();
        let text = render(&candidate(event, None), event - Duration::hours(1));
        assert!(text.contains("*Rex*"));
        assert!(text.contains("*Grooming*"));
        assert!(text.contains("2025-01-10 10:00 UTC"));
        assert!(!text.contains("overdue"));
        assert!(!text.contains("Notes:"));
    }

    #[test]
    fn marks_overdue_events() {
        let event = Utc.with_ymd_and_hms(2025, 1, 10, 10, 0, 0).unwrap();
        let text = render(&candidate(event, None), event + Duration::minutes(5));
        assert!(text.contains("overdue"));
    }

    #[test]
    fn appends_notes_when_present() {
        let event = Utc.with_ymd_and_hms(2025, 1, 10, 10, 0, 0).unwrap();
        let text = render(&candidate(event, Some("second dose")), event);
        assert!(text.contains("Notes: second dose"));
    }
}
