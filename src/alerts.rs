//! Alerting policy.
//!
//! Decides when a distance-to-destination alert or a turn alert is due.
//! The functions here are pure; deduplication state lives in the session.

use serde::{Deserialize, Serialize};

use crate::route_nav::Maneuver;

/// Minimum gap between two distance alerts, whatever the frequency.
pub const MIN_DISTANCE_ALERT_INTERVAL_MS: u64 = 30_000;

/// How close to a boundary the remaining distance must be.
const BOUNDARY_TOLERANCE_MI: f64 = 0.05;

/// Milestones for the low frequency setting, checked in this order.
pub const LOW_MILESTONES_MI: [f64; 7] = [10.0, 5.0, 3.0, 2.0, 1.0, 0.5, 0.2];

/// Turn alert thresholds in miles.
pub const PREPARE_DISTANCE_MI: f64 = 0.5;
pub const IMMINENT_DISTANCE_MI: f64 = 0.2;

/// User-configurable distance alert frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertFrequency {
    Off,
    Low,
    #[default]
    Medium,
    High,
}

/// Return the boundary (in miles) a distance alert should announce, if any.
///
/// `now_ms` and `last_alert_ms` come from the same clock.
pub fn distance_alert(
    frequency: AlertFrequency,
    remaining_mi: f64,
    now_ms: u64,
    last_alert_ms: u64,
) -> Option<f64> {
    if frequency == AlertFrequency::Off {
        return None;
    }
    if now_ms.saturating_sub(last_alert_ms) < MIN_DISTANCE_ALERT_INTERVAL_MS {
        return None;
    }

    match frequency {
        AlertFrequency::Off => None,
        AlertFrequency::High => {
            let interval = if remaining_mi > 5.0 { 1.0 } else { 0.5 };
            nearest_boundary(remaining_mi, interval)
        }
        AlertFrequency::Medium => {
            let interval = if remaining_mi <= 3.0 { 0.5 } else { 1.0 };
            nearest_boundary(remaining_mi, interval)
        }
        AlertFrequency::Low => LOW_MILESTONES_MI
            .iter()
            .copied()
            .find(|m| (remaining_mi - m).abs() <= BOUNDARY_TOLERANCE_MI),
    }
}

fn nearest_boundary(remaining_mi: f64, interval: f64) -> Option<f64> {
    let boundary = (remaining_mi / interval).round() * interval;
    // Zero is the destination itself, handled by the arrival check
    if boundary > 0.0 && (remaining_mi - boundary).abs() <= BOUNDARY_TOLERANCE_MI {
        Some(boundary)
    } else {
        None
    }
}

/// Spoken text for a distance alert.
pub fn distance_alert_text(boundary_mi: f64) -> String {
    if boundary_mi == 1.0 {
        "1 mile remaining".to_string()
    } else {
        format!("{boundary_mi} miles remaining")
    }
}

/// Turn alert stages for the upcoming maneuver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAlert {
    Prepare,
    Imminent,
}

impl TurnAlert {
    /// Deduplication key, unique per stage and maneuver.
    pub fn key(self, maneuver: Maneuver) -> String {
        let stage = match self {
            TurnAlert::Prepare => "prepare",
            TurnAlert::Imminent => "imminent",
        };
        format!("{stage}-{}", maneuver.as_str())
    }

    pub fn text(self, maneuver: Maneuver, distance_mi: f64) -> String {
        match self {
            TurnAlert::Prepare => format!("In {distance_mi:.1} miles, {}", maneuver.phrase()),
            TurnAlert::Imminent => format!("{} now", capitalize(maneuver.phrase())),
        }
    }
}

/// Which turn alert stage applies at `distance_mi` from the maneuver.
pub fn turn_alert(maneuver: Maneuver, distance_mi: f64) -> Option<TurnAlert> {
    if !maneuver.is_turn() {
        return None;
    }
    if distance_mi < IMMINENT_DISTANCE_MI {
        Some(TurnAlert::Imminent)
    } else if distance_mi < PREPARE_DISTANCE_MI {
        Some(TurnAlert::Prepare)
    } else {
        None
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
