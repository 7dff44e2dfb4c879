use std::time::{Duration, Instant};

use rust_decimal::Decimal;

use crate::resolver::{AddressPair, ResolvedDistance};

/// Quiet-period gate for address edits. The form calls [`touch`] on every
/// keystroke and polls [`ready`]; a distance request only fires once the
/// configured quiet period has passed without further edits.
///
/// [`touch`]: EditDebouncer::touch
/// [`ready`]: EditDebouncer::ready
#[derive(Clone, Debug)]
pub struct EditDebouncer {
    quiet: Duration,
    last_edit: Option<Instant>,
}

impl EditDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self { quiet, last_edit: None }
    }

    pub fn from_millis(quiet_ms: u64) -> Self {
        Self::new(Duration::from_millis(quiet_ms))
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_edit = Some(now);
    }

    pub fn ready(&self, now: Instant) -> bool {
        match self.last_edit {
            Some(last) => now.saturating_duration_since(last) >= self.quiet,
            None => false,
        }
    }

    /// One-shot check: reports readiness and clears the pending edit so the
    /// same quiet period does not fire twice.
    pub fn take_ready(&mut self, now: Instant) -> bool {
        if self.ready(now) {
            self.last_edit = None;
            return true;
        }
        false
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DistanceUpdate {
    Accepted(Decimal),
    /// The result arrived for addresses that no longer match current input.
    Stale(AddressPair),
}

/// Tracks the single in-flight distance request for a job form. Supersession
/// is implicit: beginning a new request replaces the captured address pair,
/// and a late result for the old pair is discarded on arrival.
#[derive(Clone, Debug, Default)]
pub struct PendingDistance {
    in_flight: Option<AddressPair>,
}

impl PendingDistance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, request: AddressPair) {
        self.in_flight = Some(request);
    }

    pub fn cancel(&mut self) {
        self.in_flight = None;
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn accept(&mut self, result: ResolvedDistance) -> DistanceUpdate {
        match &self.in_flight {
            Some(current) if *current == result.request => {
                self.in_flight = None;
                DistanceUpdate::Accepted(result.distance_km)
            }
            _ => DistanceUpdate::Stale(result.request),
        }
    }
}
