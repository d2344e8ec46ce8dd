//! Dead-zone occupancy tracking with edge-triggered change detection.
//!
//! States are `Unrested`, `RestedInside` and `RestedOutside`. Leaving the
//! rested condition always drops back to `Unrested`, which counts as
//! "outside" for the next comparison, so occupancy history does not survive
//! an arm lift.

use crate::frame::Point2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoneState {
    #[default]
    Unrested,
    RestedInside,
    RestedOutside,
}

impl ZoneState {
    /// Occupancy as seen by the next rested sample.
    #[inline]
    pub fn is_inside(self) -> bool {
        matches!(self, ZoneState::RestedInside)
    }

    /// Pure transition: `(state, rested, in_zone) -> (next, zone_changed)`.
    ///
    /// `in_zone` is ignored while not rested.
    #[inline]
    pub fn transition(self, rested: bool, in_zone: bool) -> (ZoneState, bool) {
        if !rested {
            return (ZoneState::Unrested, false);
        }
        let next = if in_zone {
            ZoneState::RestedInside
        } else {
            ZoneState::RestedOutside
        };
        (next, in_zone != self.is_inside())
    }
}

/// Circular dead zone around a reference point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadZone {
    pub center: Point2,
    pub radius: f32,
}

impl DeadZone {
    /// Inside iff the distance to the centre is at most the radius.
    #[inline]
    pub fn contains(&self, p: Point2) -> bool {
        p.distance(self.center) <= self.radius
    }
}

/// Stateful wrapper that feeds CoP observations through `ZoneState::transition`.
#[derive(Debug, Clone, Copy)]
pub struct ZoneTracker {
    zone: DeadZone,
    state: ZoneState,
}

impl ZoneTracker {
    pub fn new(zone: DeadZone) -> Self {
        Self {
            zone,
            state: ZoneState::Unrested,
        }
    }

    /// Feed one sample; `cop` is `None` when the arm is not rested.
    /// Returns the one-shot zone-changed flag.
    pub fn observe(&mut self, cop: Option<Point2>) -> bool {
        let (rested, in_zone) = match cop {
            Some(p) => (true, self.zone.contains(p)),
            None => (false, false),
        };
        let (next, changed) = self.state.transition(rested, in_zone);
        if changed {
            tracing::debug!(from = ?self.state, to = ?next, "dead-zone occupancy changed");
        }
        self.state = next;
        changed
    }

    pub fn state(&self) -> ZoneState {
        self.state
    }

    pub fn zone(&self) -> DeadZone {
        self.zone
    }

    pub fn reset(&mut self) {
        self.state = ZoneState::Unrested;
    }
}
