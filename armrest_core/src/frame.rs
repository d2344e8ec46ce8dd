//! Per-iteration output of the pipeline.

use armrest_traits::Channel;

/// A point in the armrest plane, in the same unit as the sensor geometry.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(self, other: Point2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<[f32; 2]> for Point2 {
    fn from(p: [f32; 2]) -> Self {
        Self::new(p[0], p[1])
    }
}

/// Calibrated force per channel, in Newtons.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelForces {
    pub left: f32,
    pub right: f32,
    pub vtc: f32,
}

impl ChannelForces {
    #[inline]
    pub const fn from_array(f: [f32; 3]) -> Self {
        Self {
            left: f[0],
            right: f[1],
            vtc: f[2],
        }
    }

    #[inline]
    pub const fn to_array(self) -> [f32; 3] {
        [self.left, self.right, self.vtc]
    }

    #[inline]
    pub const fn get(&self, channel: Channel) -> f32 {
        match channel {
            Channel::Left => self.left,
            Channel::Right => self.right,
            Channel::Vtc => self.vtc,
        }
    }

    /// Sum of the three channels, always added in channel order.
    #[inline]
    pub fn total(&self) -> f32 {
        self.left + self.right + self.vtc
    }
}

/// One processed sample. Built fresh every iteration and never mutated.
///
/// `cop` is `Some` exactly when `rested` is true, and `zone_changed` can only
/// be set on a rested sample; the constructors are the only way to build one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleFrame {
    timestamp_ms: u64,
    forces: ChannelForces,
    total_n: f32,
    rested: bool,
    cop: Option<Point2>,
    zone_changed: bool,
}

impl SampleFrame {
    /// Frame for a loaded armrest with a defined centre of pressure.
    pub fn rested(
        timestamp_ms: u64,
        forces: ChannelForces,
        cop: Point2,
        zone_changed: bool,
    ) -> Self {
        Self {
            timestamp_ms,
            forces,
            total_n: forces.total(),
            rested: true,
            cop: Some(cop),
            zone_changed,
        }
    }

    /// Frame for an unloaded (or lightly touched) armrest: no CoP, no zone event.
    pub fn unrested(timestamp_ms: u64, forces: ChannelForces) -> Self {
        Self {
            timestamp_ms,
            forces,
            total_n: forces.total(),
            rested: false,
            cop: None,
            zone_changed: false,
        }
    }

    /// Milliseconds since the sampling loop started.
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    pub fn forces(&self) -> ChannelForces {
        self.forces
    }

    /// Total force (N); exactly `forces().total()`.
    pub fn total_n(&self) -> f32 {
        self.total_n
    }

    pub fn is_rested(&self) -> bool {
        self.rested
    }

    pub fn cop(&self) -> Option<Point2> {
        self.cop
    }

    pub fn zone_changed(&self) -> bool {
        self.zone_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrested_frame_has_no_cop_and_no_event() {
        let f = SampleFrame::unrested(10, ChannelForces::from_array([0.5, 0.25, 0.0]));
        assert!(!f.is_rested());
        assert!(f.cop().is_none());
        assert!(!f.zone_changed());
        assert_eq!(f.total_n(), 0.75);
    }

    #[test]
    fn distance_is_euclidean() {
        let d = Point2::new(0.0, 0.0).distance(Point2::new(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-6);
    }
}
