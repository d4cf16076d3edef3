use chrono::{DateTime, Duration, Utc};

use pawtrol_store::{LeadPreset, LeadUnit, NotifyConfig};

/// Compute the absolute instant at which a reminder should fire.
///
/// Pure and total: `fire_time = event_time - lead`, where a missing config
/// or a negative custom value resolves to a lead of zero (fire exactly at
/// the event time). The result is therefore never after `event_time`.
pub fn compute_fire_time(
    event_time: DateTime<Utc>,
    config: Option<&NotifyConfig>,
) -> DateTime<Utc> {
    event_time - lead_duration(config)
}

/// Resolve a lead-time descriptor to a non-negative duration.
pub fn lead_duration(config: Option<&NotifyConfig>) -> Duration {
    match config {
        None => Duration::zero(),
        Some(NotifyConfig::Preset { preset }) => match preset {
            LeadPreset::AtStart => Duration::zero(),
            LeadPreset::Min1 => Duration::minutes(1),
            LeadPreset::Min5 => Duration::minutes(5),
            LeadPreset::Min10 => Duration::minutes(10),
            LeadPreset::Min30 => Duration::minutes(30),
            LeadPreset::Hour1 => Duration::hours(1),
            LeadPreset::Hour2 => Duration::hours(2),
            LeadPreset::Hour12 => Duration::hours(12),
            LeadPreset::Day1 => Duration::days(1),
        },
        Some(NotifyConfig::Custom { value, unit }) => {
            let value = (*value).max(0);
            match unit {
                LeadUnit::Min => Duration::minutes(value),
                LeadUnit::Hour => Duration::hours(value),
                LeadUnit::Day => Duration::days(value),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 10, 0, 0).unwrap()
    }

    #[test]
    fn preset_one_hour() {
        let cfg = NotifyConfig::Preset {
            preset: LeadPreset::Hour1,
        };
        assert_eq!(
            compute_fire_time(event(), Some(&cfg)),
            Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn custom_ninety_minutes() {
        let cfg = NotifyConfig::Custom {
            value: 90,
            unit: LeadUnit::Min,
        };
        assert_eq!(
            compute_fire_time(event(), Some(&cfg)),
            Utc.with_ymd_and_hms(2025, 1, 10, 8, 30, 0).unwrap()
        );
    }

    #[test]
    fn missing_config_fires_at_event_time() {
        assert_eq!(compute_fire_time(event(), None), event());
    }

    #[test]
    fn at_start_fires_at_event_time() {
        let cfg = NotifyConfig::Preset {
            preset: LeadPreset::AtStart,
        };
        assert_eq!(compute_fire_time(event(), Some(&cfg)), event());
    }

    #[test]
    fn negative_custom_clamps_to_zero() {
        let cfg = NotifyConfig::Custom {
            value: -15,
            unit: LeadUnit::Hour,
        };
        assert_eq!(compute_fire_time(event(), Some(&cfg)), event());
    }

    #[test]
    fn fire_time_never_after_event_time() {
        let presets = [
            LeadPreset::AtStart,
            LeadPreset::Min1,
            LeadPreset::Min5,
            LeadPreset::Min10,
            LeadPreset::Min30,
            LeadPreset::Hour1,
            LeadPreset::Hour2,
            LeadPreset::Hour12,
            LeadPreset::Day1,
        ];
        for preset in presets {
            let cfg = NotifyConfig::Preset { preset };
            assert!(compute_fire_time(event(), Some(&cfg)) <= event(), "{preset:?}");
        }
    }
}
