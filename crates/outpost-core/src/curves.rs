//! Piecewise-linear curves used by raid scaling and loot valuation.
//!
//! A curve is a sorted list of `(x, y)` control points. Between two points
//! the value is interpolated linearly; outside the first and last point it
//! is clamped to the end values.

/// A piecewise-linear curve over static control points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleCurve {
    points: &'static [(f32, f32)],
}

/// Threat points of the storyteller mapped to raid points.
pub const THREAT_CURVE: SimpleCurve =
    SimpleCurve::new(&[(35.0, 38.5), (400.0, 165.0), (10_000.0, 4_125.0)]);

/// Number of fighting agents mapped to a raid multiplier.
pub const PAWN_CURVE: SimpleCurve = SimpleCurve::new(&[
    (1.0, 0.5),
    (2.0, 0.55),
    (5.0, 1.0),
    (8.0, 1.1),
    (20.0, 2.0),
]);

/// Local wealth mapped to a raid multiplier.
pub const WEALTH_CURVE: SimpleCurve = SimpleCurve::new(&[
    (1_000.0, 0.5),
    (24_000.0, 1.0),
    (50_000.0, 1.1),
    (250_000.0, 2.0),
]);

/// Raid points mapped to the market value of loot the raiders leave behind.
pub const LOOT_VALUE_CURVE: SimpleCurve = SimpleCurve::new(&[
    (35.0, 15.0),
    (100.0, 120.0),
    (1_000.0, 500.0),
    (2_000.0, 800.0),
    (4_000.0, 1_000.0),
]);

impl SimpleCurve {
    /// A curve over `points`, which must be sorted by `x`.
    pub const fn new(points: &'static [(f32, f32)]) -> Self {
        Self { points }
    }

    /// Evaluate the curve at `x`.
    ///
    /// An empty curve evaluates to zero. Non-finite input clamps like any
    /// out-of-range value; `NaN` evaluates to the first point.
    pub fn evaluate(&self, x: f32) -> f32 {
        let (Some(&(x0, y0)), Some(&(xn, yn))) = (self.points.first(), self.points.last()) else {
            return 0.0;
        };
        if x.is_nan() || x <= x0 {
            return y0;
        }
        if x >= xn {
            return yn;
        }
        for pair in self.points.windows(2) {
            if let [(ax, ay), (bx, by)] = *pair
                && x <= bx
            {
                let span = bx - ax;
                if span <= 0.0 {
                    return by;
                }
                let t = (x - ax) / span;
                return t.mul_add(by - ay, ay);
            }
        }
        yn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn clamps_outside_the_control_points() {
        assert!(close(THREAT_CURVE.evaluate(0.0), 38.5));
        assert!(close(THREAT_CURVE.evaluate(50_000.0), 4_125.0));
        assert!(close(PAWN_CURVE.evaluate(0.0), 0.5));
        assert!(close(WEALTH_CURVE.evaluate(1e9), 2.0));
    }

    #[test]
    fn interpolates_between_points() {
        assert!(close(PAWN_CURVE.evaluate(3.5), 0.775));
        assert!(close(WEALTH_CURVE.evaluate(12_500.0), 0.75));
        assert!(close(THREAT_CURVE.evaluate(400.0), 165.0));
    }

    #[test]
    fn nan_evaluates_to_first_point() {
        assert!(close(THREAT_CURVE.evaluate(f32::NAN), 38.5));
    }

    #[test]
    fn curves_never_decrease() {
        for curve in [THREAT_CURVE, PAWN_CURVE, WEALTH_CURVE, LOOT_VALUE_CURVE] {
            let mut last = f32::MIN;
            for step in 0..2_000u16 {
                let y = curve.evaluate(f32::from(step) * 150.0);
                assert!(y >= last);
                last = y;
            }
        }
    }
}
