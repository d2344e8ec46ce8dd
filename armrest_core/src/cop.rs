//! Sensor geometry and centre-of-pressure estimation.

use armrest_traits::Channel;

use crate::frame::{ChannelForces, Point2};

/// Fixed, non-collinear positions of the three load cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    positions: [Point2; 3],
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new([
            Point2::new(0.0, 0.0),
            Point2::new(7.0, 0.0),
            Point2::new(3.5, 22.0),
        ])
    }
}

impl Geometry {
    /// Positions in channel order (left, right, vtc).
    pub const fn new(positions: [Point2; 3]) -> Self {
        Self { positions }
    }

    pub fn positions(&self) -> [Point2; 3] {
        self.positions
    }

    pub fn position(&self, channel: Channel) -> Point2 {
        self.positions[channel.index()]
    }

    /// Geometric centroid of the three positions (the dead-zone reference).
    pub fn centroid(&self) -> Point2 {
        let [a, b, c] = self.positions;
        Point2::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0)
    }

    /// Twice the signed triangle area; zero when collinear.
    fn twice_area(&self) -> f32 {
        let [a, b, c] = self.positions;
        (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)
    }

    pub fn is_valid(&self) -> bool {
        self.positions
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite())
            && self.twice_area().abs() >= 1e-6
    }

    /// Force-weighted centroid of the sensor positions.
    ///
    /// Each position is weighted by `force_i / total`, so for nonnegative
    /// forces the result is a convex combination of the three positions and a
    /// load on a single cell lands exactly on that cell. Returns `None` when
    /// the total is not strictly positive.
    pub fn center_of_pressure(&self, forces: &ChannelForces) -> Option<Point2> {
        let total = forces.total();
        if !(total > 0.0 && total.is_finite()) {
            return None;
        }
        let f = forces.to_array();
        let mut x = 0.0;
        let mut y = 0.0;
        for (p, fi) in self.positions.iter().zip(f) {
            let w = fi / total;
            x += p.x * w;
            y += p.y * w;
        }
        Some(Point2::new(x, y))
    }
}

/// The arm counts as rested once the total force exceeds the threshold.
#[inline]
pub fn is_rested(total_n: f32, rest_threshold_n: f32) -> bool {
    total_n > rest_threshold_n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_of_default_rig() {
        let c = Geometry::default().centroid();
        assert!((c.x - 3.5).abs() < 1e-6);
        assert!((c.y - 22.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn zero_total_has_no_cop() {
        let g = Geometry::default();
        assert!(g.center_of_pressure(&ChannelForces::default()).is_none());
    }

    #[test]
    fn collinear_geometry_is_invalid() {
        let g = Geometry::new([
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ]);
        assert!(!g.is_valid());
        assert!(Geometry::default().is_valid());
    }

    #[test]
    fn rest_threshold_is_strict() {
        assert!(!is_rested(3.5, 3.5));
        assert!(is_rested(3.5001, 3.5));
    }
}
