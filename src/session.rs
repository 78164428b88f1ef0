//! Guidance state machine.
//!
//! `Navigator` owns at most one `NavigationSession` and drives it from
//! position updates: remaining distance and time, progress, step
//! advancement, turn and distance alerts, arrival and off-route handling.
//! Every observable change is published as a `NavEvent`.
//!
//! The navigator is single-threaded and takes `&mut self` for every
//! transition, so a recalculation can never interleave with a position
//! update. Deferred work (stop after arrival, recalculation after going
//! off-route) is held in `Timers` and only runs from `poll_timers`.

use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender};

use log::{debug, info, warn};

use crate::alerts::{distance_alert, distance_alert_text, turn_alert, AlertFrequency};
use crate::config::NavConfig;
use crate::error::NavError;
use crate::events::{Announcer, LogAnnouncer, NavEvent};
use crate::geo::{distance, distance_to_path, nearest_index, Coordinate};
use crate::route::{Location, Route, RouteProvider, SimulatedRouter};
use crate::route_nav::{format_miles, generate_steps, NavigationStep};
use crate::timer::{
    Clock, SystemClock, TimerAction, Timers, ARRIVAL_STOP_DELAY_MS, OFF_ROUTE_RECALC_DELAY_MS,
};

/// Remaining distance below which the destination counts as reached.
pub const ARRIVAL_THRESHOLD_MI: f64 = 0.05;

/// Distance from the path beyond which the position is off-route.
pub const OFF_ROUTE_THRESHOLD_MI: f64 = 0.1;

const ARRIVED_KEY: &str = "arrived";
const OFF_ROUTE_KEY: &str = "off-route";

const ARRIVED_TEXT: &str = "You have arrived at your destination";
const OFF_ROUTE_TEXT: &str = "You are off route. Recalculating shortly";

/// Coarse navigator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Navigating,
    /// Off-route with an automatic recalculation pending.
    Recalculating,
}

/// Live state bound to one route.
#[derive(Debug, Clone)]
pub struct NavigationSession {
    pub route: Route,
    pub origin: Location,
    pub destination: Location,
    pub steps: Vec<NavigationStep>,
    /// None only when the route path produced no steps.
    pub current_step: Option<usize>,
    pub position: Option<Coordinate>,
    pub remaining_miles: f64,
    pub remaining_mins: u32,
    /// Percent of the route covered, 0 to 100.
    pub progress: f64,
    /// Key of the last arrival/off-route alert.
    pub last_alert_key: Option<String>,
    pub last_distance_alert_ms: u64,
    /// Boundary announced by the last distance alert, in miles.
    pub last_distance_boundary: Option<f64>,
    /// Turn alert keys already fired for the current step.
    fired_turn_alerts: HashSet<String>,
    generation: u64,
}

impl NavigationSession {
    fn new(route: Route, origin: Location, destination: Location, now_ms: u64, generation: u64) -> Self {
        let steps = generate_steps(&route.path);
        let current_step = if steps.is_empty() { None } else { Some(0) };
        Self {
            remaining_miles: route.distance_miles,
            remaining_mins: route.duration_mins,
            route,
            origin,
            destination,
            steps,
            current_step,
            position: None,
            progress: 0.0,
            last_alert_key: None,
            last_distance_alert_ms: now_ms,
            last_distance_boundary: None,
            fired_turn_alerts: HashSet::new(),
            generation,
        }
    }

    pub fn current_step(&self) -> Option<&NavigationStep> {
        self.current_step.and_then(|i| self.steps.get(i))
    }

    pub fn next_step(&self) -> Option<&NavigationStep> {
        self.current_step.and_then(|i| self.steps.get(i + 1))
    }

    pub fn remaining_distance_text(&self) -> String {
        format_miles(self.remaining_miles)
    }

    pub fn remaining_time_text(&self) -> String {
        format!("{} mins", self.remaining_mins)
    }

    fn step_changed_event(&self) -> Option<NavEvent> {
        let index = self.current_step?;
        Some(NavEvent::StepChanged {
            index,
            current: self.steps.get(index)?.clone(),
            next: self.next_step().cloned(),
        })
    }
}

/// Owns the navigation session and its collaborators.
pub struct Navigator {
    config: NavConfig,
    session: Option<NavigationSession>,
    timers: Timers,
    generation: u64,
    events: Sender<NavEvent>,
    announcer: Box<dyn Announcer>,
    router: Box<dyn RouteProvider>,
    clock: Box<dyn Clock>,
}

impl Navigator {
    /// Create a navigator and the receiving end of its event channel.
    pub fn new(
        config: NavConfig,
        announcer: Box<dyn Announcer>,
        router: Box<dyn RouteProvider>,
        clock: Box<dyn Clock>,
    ) -> (Self, Receiver<NavEvent>) {
        let (tx, rx) = mpsc::channel();
        let navigator = Self {
            config,
            session: None,
            timers: Timers::default(),
            generation: 0,
            events: tx,
            announcer,
            router,
            clock,
        };
        (navigator, rx)
    }

    /// Navigator with log-only speech, simulated routing and the wall clock.
    pub fn with_defaults(config: NavConfig) -> (Self, Receiver<NavEvent>) {
        Self::new(
            config,
            Box::new(LogAnnouncer),
            Box::<SimulatedRouter>::default(),
            Box::<SystemClock>::default(),
        )
    }

    // -- read-only view --

    pub fn phase(&self) -> Phase {
        match &self.session {
            None => Phase::Idle,
            Some(_) if self.timers.is_pending(TimerAction::Recalculate) => Phase::Recalculating,
            Some(_) => Phase::Navigating,
        }
    }

    pub fn session(&self) -> Option<&NavigationSession> {
        self.session.as_ref()
    }

    pub fn route(&self) -> Option<&Route> {
        self.session.as_ref().map(|s| &s.route)
    }

    pub fn current_step(&self) -> Option<&NavigationStep> {
        self.session.as_ref().and_then(|s| s.current_step())
    }

    pub fn next_step(&self) -> Option<&NavigationStep> {
        self.session.as_ref().and_then(|s| s.next_step())
    }

    pub fn remaining_distance_text(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.remaining_distance_text())
    }

    pub fn remaining_time_text(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.remaining_time_text())
    }

    pub fn progress(&self) -> Option<f64> {
        self.session.as_ref().map(|s| s.progress)
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    // -- configuration --

    pub fn set_voice_enabled(&mut self, enabled: bool) {
        self.config.voice_enabled = enabled;
        if !enabled {
            self.announcer.cancel();
        }
    }

    pub fn set_alert_frequency(&mut self, frequency: AlertFrequency) {
        self.config.alert_frequency = frequency;
    }

    pub fn set_three_d_mode(&mut self, enabled: bool) {
        self.config.three_d_mode = enabled;
        self.emit(NavEvent::ViewModeChanged { three_d: enabled });
    }

    // -- lifecycle --

    /// Begin navigating `route`. An active session is stopped first.
    pub fn start(&mut self, route: Route, origin: Location, destination: Location) {
        if self.session.is_some() {
            debug!("Replacing active session with route {}", route.id);
            self.stop();
        }

        self.generation += 1;
        let now = self.clock.now_ms();
        let session = NavigationSession::new(route, origin, destination, now, self.generation);

        info!(
            "Navigation started on route {} ({}, {}, {} steps)",
            session.route.id,
            session.route.distance_text(),
            session.route.duration_text(),
            session.steps.len()
        );

        let started = NavEvent::RouteStarted {
            route: session.route.clone(),
            origin: session.origin.clone(),
            destination: session.destination.clone(),
            remaining_distance: session.remaining_distance_text(),
            remaining_time: session.remaining_time_text(),
        };
        let step = session.step_changed_event();
        self.session = Some(session);

        self.emit(started);
        if let Some(step) = step {
            self.emit(step);
        }
    }

    /// End navigation and cancel pending timers. Safe to call when idle.
    pub fn stop(&mut self) {
        self.timers.cancel_all();
        if let Some(session) = self.session.take() {
            info!("Navigation stopped on route {}", session.route.id);
            self.announcer.cancel();
            self.emit(NavEvent::RouteStopped);
        }
    }

    /// Feed a new position. Ignored while idle.
    pub fn on_position_update(&mut self, position: Coordinate) {
        let now = self.clock.now_ms();
        let voice = self.config.voice_enabled;
        let frequency = self.config.alert_frequency;

        let Some(session) = self.session.as_mut() else {
            debug!("Position update ignored, no active session");
            return;
        };

        let mut events = Vec::new();
        let mut speech = Vec::new();
        let mut alert = |events: &mut Vec<NavEvent>, text: String| {
            if voice {
                speech.push(text.clone());
            }
            events.push(NavEvent::Alert { text });
        };

        session.position = Some(position);

        let total = session.route.distance_miles;
        let remaining = distance(&position, &session.destination.coordinates);
        let ratio = if total > 0.0 { remaining / total } else { 0.0 };
        session.remaining_miles = remaining;
        session.remaining_mins = (f64::from(session.route.duration_mins) * ratio).max(1.0).round() as u32;
        session.progress = (100.0 - ratio * 100.0).clamp(0.0, 100.0);

        // Step advancement: the successor anchor (or a later one) is now
        // the closest path point.
        if let (Some(current), Some(nearest)) =
            (session.current_step, nearest_index(&position, &session.route.path))
        {
            if nearest > current && nearest < session.steps.len() {
                let previous = session.steps[current].instruction.clone();
                session.current_step = Some(nearest);
                session.fired_turn_alerts.clear();
                if let Some(event) = session.step_changed_event() {
                    events.push(event);
                }

                let step = &session.steps[nearest];
                debug!("Advanced to step {nearest}: {}", step.instruction);
                if voice && step.instruction != previous {
                    let text = if step.maneuver.is_turn() {
                        let to_anchor = distance(&position, &step.anchor);
                        // This announcement covers a turn alert due at the same distance
                        if let Some(stage) = turn_alert(step.maneuver, to_anchor) {
                            session.fired_turn_alerts.insert(stage.key(step.maneuver));
                        }
                        format!("In {}, {}", format_miles(to_anchor), lowercase_first(&step.instruction))
                    } else {
                        step.instruction.clone()
                    };
                    alert(&mut events, text);
                }
            }
        }

        // Turn alerts for the maneuver at the anchor being approached
        if let Some(step) = session.current_step() {
            let to_anchor = distance(&position, &step.anchor);
            let maneuver = step.maneuver;
            if let Some(stage) = turn_alert(maneuver, to_anchor) {
                if session.fired_turn_alerts.insert(stage.key(maneuver)) {
                    alert(&mut events, stage.text(maneuver, to_anchor));
                }
            }
        }

        if let Some(boundary) = distance_alert(frequency, remaining, now, session.last_distance_alert_ms)
            .filter(|b| session.last_distance_boundary != Some(*b))
        {
            session.last_distance_alert_ms = now;
            session.last_distance_boundary = Some(boundary);
            alert(&mut events, distance_alert_text(boundary));
        }

        if remaining < ARRIVAL_THRESHOLD_MI && session.last_alert_key.as_deref() != Some(ARRIVED_KEY) {
            info!("Arrived at {}", session.destination.name);
            session.last_alert_key = Some(ARRIVED_KEY.to_string());
            alert(&mut events, ARRIVED_TEXT.to_string());
            events.push(NavEvent::Arrived {
                position,
                destination: session.destination.clone(),
            });
            self.timers
                .schedule(TimerAction::Stop, now + ARRIVAL_STOP_DELAY_MS, session.generation);
        }

        let off_route_by = distance_to_path(&position, &session.route.path);
        if off_route_by > OFF_ROUTE_THRESHOLD_MI {
            if session.last_alert_key.as_deref() != Some(OFF_ROUTE_KEY) {
                warn!("Off route by {off_route_by:.2} mi, recalculating in {OFF_ROUTE_RECALC_DELAY_MS} ms");
                session.last_alert_key = Some(OFF_ROUTE_KEY.to_string());
                alert(&mut events, OFF_ROUTE_TEXT.to_string());
                events.push(NavEvent::OffRoute {
                    position,
                    distance_from_route: off_route_by,
                });
                self.timers.schedule(
                    TimerAction::Recalculate,
                    now + OFF_ROUTE_RECALC_DELAY_MS,
                    session.generation,
                );
            }
        } else if session.last_alert_key.as_deref() == Some(OFF_ROUTE_KEY) {
            debug!("Back on route, cancelling automatic recalculation");
            session.last_alert_key = None;
            self.timers.cancel(TimerAction::Recalculate);
        }

        events.push(NavEvent::PositionUpdated {
            position,
            remaining_distance: session.remaining_distance_text(),
            remaining_time: session.remaining_time_text(),
            progress: session.progress,
        });

        for text in speech {
            self.speak(&text);
        }
        for event in events {
            self.emit(event);
        }
    }

    /// Report a failure of the position source. The session is kept.
    pub fn on_position_error(&mut self, error: NavError) {
        warn!("Position source error: {error}");
        self.emit(NavEvent::Error {
            message: error.to_string(),
        });
    }

    /// Replace the active route with a fresh one from the current position.
    ///
    /// On failure nothing about the session changes.
    pub fn recalculate(&mut self) -> Result<(), NavError> {
        let session = self.session.as_ref().ok_or(NavError::NotNavigating)?;
        let position = session.position.ok_or(NavError::MissingPosition)?;
        let destination = session.destination.clone();

        info!("Recalculating route to {}", destination.name);
        let route = match self.router.route(&position, &destination.coordinates) {
            Ok(route) => route,
            Err(e) => {
                warn!("Recalculation failed: {e}");
                self.emit(NavEvent::Error {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        self.timers.cancel_all();
        self.generation += 1;
        let now = self.clock.now_ms();
        let origin = Location::new("Current location", position);
        let mut session = NavigationSession::new(route, origin, destination, now, self.generation);
        session.position = Some(position);

        let remaining_distance = session.remaining_distance_text();
        let remaining_time = session.remaining_time_text();
        let recalculated = NavEvent::RouteRecalculated {
            route: session.route.clone(),
            remaining_distance: remaining_distance.clone(),
            remaining_time: remaining_time.clone(),
        };
        let step = session.step_changed_event();
        info!("Route recalculated: {} ({remaining_distance}, {remaining_time})", session.route.id);
        self.session = Some(session);

        self.emit(recalculated);
        if let Some(step) = step {
            self.emit(step);
        }
        self.alert(format!(
            "Route recalculated. {remaining_distance} remaining, about {remaining_time}"
        ));
        Ok(())
    }

    /// Run timers that are due. Call periodically from the host loop.
    ///
    /// Once an action replaces or ends the session, the remaining due
    /// actions belong to a dead generation and are dropped.
    pub fn poll_timers(&mut self) {
        let Some(generation) = self.session.as_ref().map(|s| s.generation) else {
            self.timers.cancel_all();
            return;
        };

        let now = self.clock.now_ms();
        for action in self.timers.take_due(now, generation) {
            match action {
                TimerAction::Stop => self.stop(),
                TimerAction::Recalculate => {
                    if let Err(e) = self.recalculate() {
                        warn!("Automatic recalculation failed, retrying in {OFF_ROUTE_RECALC_DELAY_MS} ms: {e}");
                        self.timers.schedule(
                            TimerAction::Recalculate,
                            now + OFF_ROUTE_RECALC_DELAY_MS,
                            generation,
                        );
                    }
                }
            }
            if self.session.as_ref().map(|s| s.generation) != Some(generation) {
                debug!("Session generation {generation} ended, dropping remaining due timers");
                return;
            }
        }
    }

    fn alert(&mut self, text: String) {
        if self.config.voice_enabled {
            self.speak(&text);
        }
        self.emit(NavEvent::Alert { text });
    }

    fn speak(&mut self, text: &str) {
        self.announcer.cancel();
        self.announcer.speak(text);
    }

    fn emit(&self, event: NavEvent) {
        if self.events.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
