//! Outbound notifications.
//!
//! The navigator publishes `NavEvent`s on a channel for the UI and map
//! layers, and speaks through an `Announcer`. Events carry enough data
//! for receivers to render without recomputing anything.

use serde::Serialize;

use crate::geo::Coordinate;
use crate::route::{Location, Route};
use crate::route_nav::NavigationStep;

/// Events emitted by the navigator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavEvent {
    RouteStarted {
        route: Route,
        origin: Location,
        destination: Location,
        remaining_distance: String,
        remaining_time: String,
    },
    RouteStopped,
    RouteRecalculated {
        route: Route,
        remaining_distance: String,
        remaining_time: String,
    },
    PositionUpdated {
        position: Coordinate,
        remaining_distance: String,
        remaining_time: String,
        progress: f64,
    },
    StepChanged {
        index: usize,
        current: NavigationStep,
        next: Option<NavigationStep>,
    },
    Arrived {
        position: Coordinate,
        destination: Location,
    },
    OffRoute {
        position: Coordinate,
        /// Distance to the nearest point on the path polyline, in miles.
        distance_from_route: f64,
    },
    Alert {
        text: String,
    },
    ViewModeChanged {
        three_d: bool,
    },
    Error {
        message: String,
    },
}

impl NavEvent {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Speech output. Implementations drive whatever audio backend exists.
pub trait Announcer {
    fn speak(&mut self, text: &str);

    /// Stop whatever is currently being spoken.
    fn cancel(&mut self);
}

/// Announcer that only logs, for hosts without speech.
#[derive(Debug, Default)]
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn speak(&mut self, text: &str) {
        log::info!("announce: {text}");
    }

    fn cancel(&mut self) {}
}
