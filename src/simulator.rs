//! Simulated position source.
//!
//! Walks a path at a fixed distance per tick, independent of how much
//! real time passes between ticks. Used for demos and tests in place of
//! the device location stream.

use std::thread;
use std::time::Duration;

use crate::geo::{distance, interpolate, Coordinate, Path};
use crate::session::{Navigator, Phase};

/// Interval between simulated position fixes.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Distance advanced per tick, in miles.
pub const DEFAULT_STEP_MI: f64 = 0.01;

/// Iterator over positions along a path.
///
/// Yields the first point, then one position per tick, ending exactly on
/// the last point.
#[derive(Debug, Clone)]
pub struct PositionSimulator {
    path: Path,
    step_mi: f64,
    segment: usize,
    along_mi: f64,
    started: bool,
}

impl PositionSimulator {
    /// A non-positive or non-finite step falls back to `DEFAULT_STEP_MI`.
    pub fn new(path: Path, step_mi: f64) -> Self {
        let step_mi = if step_mi.is_finite() && step_mi > 0.0 {
            step_mi
        } else {
            DEFAULT_STEP_MI
        };
        Self {
            path,
            step_mi,
            segment: 0,
            along_mi: 0.0,
            started: false,
        }
    }

    fn at_end(&self) -> bool {
        self.segment + 1 >= self.path.len()
    }

    fn current_position(&self) -> Coordinate {
        if self.at_end() {
            return self.path[self.path.len() - 1];
        }
        let a = &self.path[self.segment];
        let b = &self.path[self.segment + 1];
        let seg_len = distance(a, b);
        if seg_len <= 0.0 {
            *a
        } else {
            interpolate(a, b, (self.along_mi / seg_len).min(1.0))
        }
    }

    fn advance(&mut self) {
        let mut left = self.step_mi;
        while !self.at_end() {
            let seg_len = distance(&self.path[self.segment], &self.path[self.segment + 1]);
            let to_end = seg_len - self.along_mi;
            if left < to_end {
                self.along_mi += left;
                return;
            }
            left -= to_end;
            self.segment += 1;
            self.along_mi = 0.0;
        }
    }

    /// Drive `navigator` at the standard `TICK_INTERVAL`.
    pub fn run(self, navigator: &mut Navigator) {
        self.run_with_tick(navigator, TICK_INTERVAL);
    }

    /// Feed every simulated position into `navigator`, sleeping `tick`
    /// between fixes. Returns when the path is exhausted or navigation
    /// ends.
    pub fn run_with_tick(self, navigator: &mut Navigator, tick: Duration) {
        for position in self {
            navigator.on_position_update(position);
            navigator.poll_timers();
            if navigator.phase() == Phase::Idle {
                break;
            }
            if !tick.is_zero() {
                thread::sleep(tick);
            }
        }
    }
}

impl Iterator for PositionSimulator {
    type Item = Coordinate;

    fn next(&mut self) -> Option<Coordinate> {
        if self.path.is_empty() {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.path[0]);
        }
        if self.at_end() {
            return None;
        }
        self.advance();
        Some(self.current_position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NavConfig;
    use crate::events::NavEvent;
    use crate::geo::path_length;
    use crate::route::{Location, Route, TrafficLevel};

    fn c(lon: f64, lat: f64) -> Coordinate {
        Coordinate::new(lon, lat)
    }

    #[test]
    fn empty_path_yields_nothing() {
        assert_eq!(PositionSimulator::new(Vec::new(), 0.1).count(), 0);
    }

    #[test]
    fn single_point_yields_once() {
        let positions: Vec<_> = PositionSimulator::new(vec![c(1.0, 2.0)], 0.1).collect();
        assert_eq!(positions, vec![c(1.0, 2.0)]);
    }

    #[test]
    fn walks_at_fixed_step() {
        let path = vec![c(0.0, 0.0), c(0.0, 0.1), c(0.1, 0.1)];
        let total = path_length(&path);
        let positions: Vec<_> = PositionSimulator::new(path.clone(), 0.5).collect();

        assert_eq!(positions[0], path[0]);
        assert_eq!(*positions.last().unwrap(), path[2]);
        let expected_ticks = (total / 0.5).ceil() as usize;
        assert_eq!(positions.len(), expected_ticks + 1);

        let first_step = distance(&positions[0], &positions[1]);
        assert!((first_step - 0.5).abs() < 1e-3, "got {first_step}");
    }

    #[test]
    fn crosses_vertices_and_duplicates() {
        let path = vec![c(0.0, 0.0), c(0.0, 0.0), c(0.0, 0.01), c(0.01, 0.01)];
        let positions: Vec<_> = PositionSimulator::new(path.clone(), 0.3).collect();
        assert_eq!(*positions.last().unwrap(), path[3]);
        assert!(positions.len() >= 3);
    }

    #[test]
    fn bad_step_uses_default() {
        let sim = PositionSimulator::new(vec![c(0.0, 0.0)], f64::NAN);
        assert_eq!(sim.step_mi, DEFAULT_STEP_MI);
        let sim = PositionSimulator::new(vec![c(0.0, 0.0)], -1.0);
        assert_eq!(sim.step_mi, DEFAULT_STEP_MI);
    }

    #[test]
    fn simulated_drive_arrives() {
        let path = vec![c(-74.5, 40.0), c(-74.45, 40.02), c(-74.4, 40.0)];
        let route = Route::from_path("demo", "Demo", path.clone(), TrafficLevel::Light);
        let (mut nav, events) = Navigator::with_defaults(NavConfig::default());
        nav.start(route, Location::new("A", path[0]), Location::new("B", path[2]));

        PositionSimulator::new(path, 0.25).run_with_tick(&mut nav, Duration::ZERO);

        let events: Vec<NavEvent> = events.try_iter().collect();
        assert!(events.iter().any(|e| matches!(e, NavEvent::Arrived { .. })));
        assert!(!events.iter().any(|e| matches!(e, NavEvent::OffRoute { .. })));
        assert!(events.iter().any(|e| matches!(e, NavEvent::StepChanged { index: 1, .. })));
        assert_eq!(nav.progress(), Some(100.0));
    }

    #[test]
    fn run_sleeps_one_tick_per_fix() {
        // Three fixes on a 0.014 mi path; the arrival stop is 5 s away
        let path = vec![c(0.0, 0.0), c(0.0, 0.0002)];
        let route = Route::from_path("demo", "Demo", path.clone(), TrafficLevel::Light);
        let (mut nav, _events) = Navigator::with_defaults(NavConfig::default());
        nav.start(route, Location::new("A", path[0]), Location::new("B", path[1]));

        let fixes = PositionSimulator::new(path.clone(), 0.01).count();
        assert_eq!(fixes, 3);

        let started = std::time::Instant::now();
        PositionSimulator::new(path, 0.01).run(&mut nav);
        assert!(started.elapsed() >= TICK_INTERVAL * fixes as u32);
        assert_eq!(TICK_INTERVAL, Duration::from_millis(100));
    }
}
