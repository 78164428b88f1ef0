//! Routes, locations and route providers.
//!
//! A `Route` is produced by an external routing collaborator and treated
//! as an opaque, immutable value by the navigator. `SimulatedRouter` is
//! the stand-in used for recalculation when no real routing service is
//! wired in.

use serde::{Deserialize, Serialize};

use crate::error::NavError;
use crate::geo::{interpolate, path_length, Coordinate, Path};

/// Average speed used to derive simulated route durations.
pub const SIMULATED_SPEED_MPH: f64 = 30.0;

/// Fraction of the way from origin to destination where the simulated
/// route bends.
const BEND_POSITION: f64 = 0.4;

/// Sideways offset of the bend, as a fraction of the straight-line span.
const BEND_OFFSET: f64 = 0.1;

/// Traffic tag attached to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficLevel {
    #[default]
    Light,
    Moderate,
    Heavy,
}

impl TrafficLevel {
    /// Multiplier applied to free-flow travel time.
    pub fn delay_factor(self) -> f64 {
        match self {
            TrafficLevel::Light => 1.0,
            TrafficLevel::Moderate => 1.25,
            TrafficLevel::Heavy => 1.6,
        }
    }
}

/// A named place, as returned by geocoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub coordinates: Coordinate,
}

impl Location {
    pub fn new(name: impl Into<String>, coordinates: Coordinate) -> Self {
        Self {
            name: name.into(),
            coordinates,
        }
    }
}

/// A computed route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub name: String,
    /// Total distance in miles.
    pub distance_miles: f64,
    /// Total travel time in whole minutes.
    pub duration_mins: u32,
    #[serde(default)]
    pub traffic: TrafficLevel,
    #[serde(default)]
    pub incidents: u32,
    pub path: Path,
}

impl Route {
    /// Build a route from a path, deriving distance and duration.
    pub fn from_path(
        id: impl Into<String>,
        name: impl Into<String>,
        path: Path,
        traffic: TrafficLevel,
    ) -> Self {
        let distance_miles = path_length(&path);
        let hours = distance_miles / SIMULATED_SPEED_MPH * traffic.delay_factor();
        Self {
            id: id.into(),
            name: name.into(),
            distance_miles,
            duration_mins: (hours * 60.0).round() as u32,
            traffic,
            incidents: 0,
            path,
        }
    }

    /// Total distance as "<n> miles".
    pub fn distance_text(&self) -> String {
        format!("{:.1} miles", self.distance_miles)
    }

    /// Total duration as "<n> mins".
    pub fn duration_text(&self) -> String {
        format!("{} mins", self.duration_mins)
    }
}

/// Source of routes between two points.
pub trait RouteProvider {
    fn route(&mut self, origin: &Coordinate, destination: &Coordinate) -> Result<Route, NavError>;
}

/// Produces a three-point route with a single bend, for demos and
/// recalculation without a routing backend.
#[derive(Debug, Default)]
pub struct SimulatedRouter {
    pub traffic: TrafficLevel,
    issued: u32,
}

impl SimulatedRouter {
    pub fn new(traffic: TrafficLevel) -> Self {
        Self { traffic, issued: 0 }
    }
}

impl RouteProvider for SimulatedRouter {
    fn route(&mut self, origin: &Coordinate, destination: &Coordinate) -> Result<Route, NavError> {
        if !(origin.lon.is_finite() && origin.lat.is_finite())
            || !(destination.lon.is_finite() && destination.lat.is_finite())
        {
            return Err(NavError::Routing("non-finite coordinates".into()));
        }

        let mut bend = interpolate(origin, destination, BEND_POSITION);
        // Perpendicular offset to the left of the direction of travel
        bend.lon -= (destination.lat - origin.lat) * BEND_OFFSET;
        bend.lat += (destination.lon - origin.lon) * BEND_OFFSET;

        self.issued += 1;
        log::debug!("Simulated route #{} with bend at {:?}", self.issued, bend);

        Ok(Route::from_path(
            format!("sim-{}", self.issued),
            "Recalculated route",
            vec![*origin, bend, *destination],
            self.traffic,
        ))
    }
}
