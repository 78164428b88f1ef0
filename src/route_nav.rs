//! Turn-by-turn instruction generation.
//!
//! Turns a path into one `NavigationStep` per segment plus a final
//! arrival step. Maneuver icons and instruction phrasing are bucketed by
//! two separate threshold sets, so a 15 degree bend shows a slight-right
//! icon while the text still says "Continue straight".

use serde::{Deserialize, Serialize};

use crate::error::NavError;
use crate::geo::{bearing, compass_direction, distance, Coordinate};

/// A single turn-by-turn instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationStep {
    /// Human-readable instruction text.
    pub instruction: String,
    /// Segment distance, formatted as "<n> miles".
    pub distance: String,
    /// Point the step starts from.
    pub anchor: Coordinate,
    /// Bearing of the segment in degrees [0, 360).
    pub bearing: f64,
    pub maneuver: Maneuver,
}

/// Maneuver classification used for icons and turn alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Maneuver {
    Straight,
    Right,
    Left,
    SlightRight,
    SlightLeft,
    SharpRight,
    SharpLeft,
    #[serde(rename = "uturn")]
    UTurn,
    Arrive,
}

impl Maneuver {
    /// True for maneuvers that warrant a turn alert.
    pub fn is_turn(self) -> bool {
        !matches!(self, Maneuver::Straight | Maneuver::Arrive)
    }

    /// Stable identifier, matches the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Maneuver::Straight => "straight",
            Maneuver::Right => "right",
            Maneuver::Left => "left",
            Maneuver::SlightRight => "slight-right",
            Maneuver::SlightLeft => "slight-left",
            Maneuver::SharpRight => "sharp-right",
            Maneuver::SharpLeft => "sharp-left",
            Maneuver::UTurn => "uturn",
            Maneuver::Arrive => "arrive",
        }
    }

    /// Short spoken phrase for turn alerts.
    pub fn phrase(self) -> &'static str {
        match self {
            Maneuver::Straight => "continue straight",
            Maneuver::Right => "turn right",
            Maneuver::Left => "turn left",
            Maneuver::SlightRight => "keep slightly right",
            Maneuver::SlightLeft => "keep slightly left",
            Maneuver::SharpRight => "turn sharp right",
            Maneuver::SharpLeft => "turn sharp left",
            Maneuver::UTurn => "make a U-turn",
            Maneuver::Arrive => "arrive at your destination",
        }
    }
}

const ARRIVAL_TEXT: &str = "Arrive at your destination";

/// Generate navigation steps for a path.
///
/// Returns an empty list for paths with fewer than 2 points. Otherwise
/// the result has exactly `path.len()` entries: one per segment and a
/// trailing arrival step anchored at the last coordinate.
pub fn generate_steps(path: &[Coordinate]) -> Vec<NavigationStep> {
    if path.len() < 2 {
        return Vec::new();
    }

    let mut steps = Vec::with_capacity(path.len());
    let mut previous_bearing: Option<f64> = None;

    for segment in path.windows(2) {
        let (from, to) = (&segment[0], &segment[1]);
        let seg_bearing = bearing(from, to);
        let seg_distance = format_miles(distance(from, to));

        let (maneuver, instruction) = match previous_bearing {
            None => (
                Maneuver::Straight,
                format!("Head {} for {seg_distance}", compass_direction(seg_bearing)),
            ),
            Some(prev) => {
                let delta = turn_angle(prev, seg_bearing);
                (classify_maneuver(delta), instruction_text(delta, &seg_distance))
            }
        };

        steps.push(NavigationStep {
            instruction,
            distance: seg_distance,
            anchor: *from,
            bearing: seg_bearing,
            maneuver,
        });
        previous_bearing = Some(seg_bearing);
    }

    steps.push(NavigationStep {
        instruction: ARRIVAL_TEXT.to_string(),
        distance: "0 miles".to_string(),
        anchor: path[path.len() - 1],
        bearing: previous_bearing.unwrap_or(0.0),
        maneuver: Maneuver::Arrive,
    });

    steps
}

/// Signed turn angle from `from` to `to`, normalized into (-180, 180].
///
/// Positive values are right turns.
pub fn turn_angle(from: f64, to: f64) -> f64 {
    let mut angle = (to - from) % 360.0;
    if angle > 180.0 {
        angle -= 360.0;
    } else if angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

/// Classify a signed turn angle into a maneuver.
///
/// Near-reversals are checked first so they win over sharp turns.
pub fn classify_maneuver(angle: f64) -> Maneuver {
    let abs_angle = angle.abs();
    let right = angle > 0.0;

    if abs_angle > 170.0 {
        Maneuver::UTurn
    } else if abs_angle <= 10.0 {
        Maneuver::Straight
    } else if abs_angle <= 30.0 {
        if right { Maneuver::SlightRight } else { Maneuver::SlightLeft }
    } else if abs_angle <= 100.0 {
        if right { Maneuver::Right } else { Maneuver::Left }
    } else if right {
        Maneuver::SharpRight
    } else {
        Maneuver::SharpLeft
    }
}

fn instruction_text(angle: f64, seg_distance: &str) -> String {
    let abs_angle = angle.abs();
    if abs_angle < 20.0 {
        return format!("Continue straight for {seg_distance}");
    }

    let severity = if abs_angle < 60.0 {
        "slight "
    } else if abs_angle < 120.0 {
        ""
    } else {
        "sharp "
    };
    let side = if angle > 0.0 { "right" } else { "left" };

    format!("Turn {severity}{side} and continue for {seg_distance}")
}

/// Format a distance in miles with one decimal, e.g. "2.4 miles".
pub fn format_miles(miles: f64) -> String {
    format!("{miles:.1} miles")
}

/// Generate steps from a JSON array of `{"lon", "lat"}` objects and
/// return them as JSON.
pub fn steps_to_json(path_json: &str) -> Result<String, NavError> {
    let path: Vec<Coordinate> = serde_json::from_str(path_json)?;
    Ok(serde_json::to_string(&generate_steps(&path))?)
}
