//! Clock and deferred actions.
//!
//! The core never sleeps or spawns. Deferred actions are recorded with a
//! due time and the session generation that scheduled them; the host calls
//! `Navigator::poll_timers` and due actions fire there. An action from an
//! older generation is dropped instead of touching the new session.

use std::time::Instant;

/// Delay between arrival and the automatic stop.
pub const ARRIVAL_STOP_DELAY_MS: u64 = 5_000;

/// Delay between going off-route and the automatic recalculation.
pub const OFF_ROUTE_RECALC_DELAY_MS: u64 = 3_000;

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock measured from construction.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    Stop,
    Recalculate,
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    action: TimerAction,
    due_ms: u64,
    generation: u64,
}

/// Pending one-shot actions, at most one per kind.
#[derive(Debug, Default)]
pub struct Timers {
    pending: Vec<Scheduled>,
}

impl Timers {
    /// Schedule `action`, replacing any pending action of the same kind.
    pub fn schedule(&mut self, action: TimerAction, due_ms: u64, generation: u64) {
        self.cancel(action);
        self.pending.push(Scheduled {
            action,
            due_ms,
            generation,
        });
    }

    pub fn cancel(&mut self, action: TimerAction) {
        self.pending.retain(|s| s.action != action);
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub(crate) fn is_pending(&self, action: TimerAction) -> bool {
        self.pending.iter().any(|s| s.action == action)
    }

    /// Remove and return actions due at `now_ms` for `generation`, in due
    /// order. Due actions from other generations are discarded.
    pub fn take_due(&mut self, now_ms: u64, generation: u64) -> Vec<TimerAction> {
        let (mut due, rest): (Vec<Scheduled>, Vec<Scheduled>) =
            std::mem::take(&mut self.pending)
                .into_iter()
                .partition(|s| s.due_ms <= now_ms);
        self.pending = rest;

        due.sort_by_key(|s| s.due_ms);
        due.into_iter()
            .filter(|s| {
                let current = s.generation == generation;
                if !current {
                    log::debug!("Dropping stale {:?} timer from generation {}", s.action, s.generation);
                }
                current
            })
            .map(|s| s.action)
            .collect()
    }
}

/// Manually advanced clock for tests.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct ManualClock(std::rc::Rc<std::cell::Cell<u64>>);

#[cfg(test)]
impl ManualClock {
    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}
