//! Cubic Bezier easing
//!
//! Control points follow the `(x1, y1, x2, y2)` easing convention with fixed
//! endpoints at (0, 0) and (1, 1). Evaluating the curve at progress `t` solves
//! `x(s) = t` for the curve parameter and returns `y(s)`.

use safety_state::SafetyState;
use serde::{Deserialize, Serialize};

const NEWTON_ITERATIONS: usize = 8;
const BISECTION_ITERATIONS: usize = 60;
const EPSILON: f64 = 1e-9;

/// Cubic Bezier easing curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    pub control_points: [f64; 4],
}

impl CubicBezier {
    pub const fn new(control_points: [f64; 4]) -> Self {
        Self { control_points }
    }

    /// Eased value for progress `t`, clamped to [0, 1].
    ///
    /// Returns exactly 0 at `t <= 0` and exactly 1 at `t >= 1`.
    pub fn ease(&self, t: f64) -> f64 {
        if t.is_nan() || t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        let [x1, y1, x2, y2] = self.control_points;
        let s = solve_parameter(x1, x2, t);
        bezier_component(y1, y2, s)
    }
}

/// One coordinate of the curve at parameter `s`
fn bezier_component(p1: f64, p2: f64, s: f64) -> f64 {
    let c = 3.0 * p1;
    let b = 3.0 * (p2 - p1) - c;
    let a = 1.0 - c - b;
    ((a * s + b) * s + c) * s
}

fn bezier_derivative(p1: f64, p2: f64, s: f64) -> f64 {
    let c = 3.0 * p1;
    let b = 3.0 * (p2 - p1) - c;
    let a = 1.0 - c - b;
    (3.0 * a * s + 2.0 * b) * s + c
}

/// Find `s` with x(s) = x. Newton first, bisection when the slope vanishes.
fn solve_parameter(x1: f64, x2: f64, x: f64) -> f64 {
    let mut s = x;
    for _ in 0..NEWTON_ITERATIONS {
        let error = bezier_component(x1, x2, s) - x;
        if error.abs() < EPSILON {
            return s;
        }
        let slope = bezier_derivative(x1, x2, s);
        if slope.abs() < 1e-6 {
            break;
        }
        s -= error / slope;
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    s = x;
    for _ in 0..BISECTION_ITERATIONS {
        let value = bezier_component(x1, x2, s);
        if (value - x).abs() < EPSILON {
            break;
        }
        if value < x {
            lo = s;
        } else {
            hi = s;
        }
        s = 0.5 * (lo + hi);
    }
    s
}

/// Transition curve family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveClass {
    /// Instant switch into CRITICAL or THREAT
    Emergency,
    /// Escalations, lateral moves and overlay changes
    Standard,
    /// De-escalation between core states
    Graceful,
}

impl CurveClass {
    /// Pick the curve for a state change
    pub fn select(from: SafetyState, to: SafetyState) -> Self {
        if to.is_emergency() {
            return CurveClass::Emergency;
        }
        match (from.severity(), to.severity()) {
            (Some(from), Some(to)) if to < from => CurveClass::Graceful,
            _ => CurveClass::Standard,
        }
    }

    pub fn curve(self) -> CubicBezier {
        match self {
            CurveClass::Emergency => CubicBezier::new([0.0, 0.0, 0.0, 1.0]),
            CurveClass::Standard | CurveClass::Graceful => CubicBezier::new([0.4, 0.0, 0.2, 1.0]),
        }
    }

    pub fn duration_ms(self) -> u32 {
        match self {
            CurveClass::Emergency => 0,
            CurveClass::Standard => 500,
            CurveClass::Graceful => 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_endpoints_exact() {
        for class in [CurveClass::Emergency, CurveClass::Standard, CurveClass::Graceful] {
            let curve = class.curve();
            assert_eq!(curve.ease(0.0), 0.0);
            assert_eq!(curve.ease(1.0), 1.0);
            assert_eq!(curve.ease(-3.0), 0.0);
            assert_eq!(curve.ease(7.0), 1.0);
        }
    }

    #[test]
    fn test_linear_curve() {
        let linear = CubicBezier::new([1.0 / 3.0, 1.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0]);
        for t in [0.1, 0.25, 0.5, 0.9] {
            assert!((linear.ease(t) - t).abs() < 1e-6);
        }
    }

    #[test]
    fn test_standard_curve_shape() {
        let curve = CurveClass::Standard.curve();
        // Slow start, fast finish past the midpoint
        assert!(curve.ease(0.1) < 0.1);
        assert!(curve.ease(0.5) > 0.5);
        assert!(curve.ease(0.9) > 0.95);
    }

    #[test]
    fn test_class_selection() {
        use SafetyState::*;
        assert_eq!(CurveClass::select(Idle, Threat), CurveClass::Emergency);
        assert_eq!(CurveClass::select(Threat, Critical), CurveClass::Emergency);
        assert_eq!(CurveClass::select(LowConf, Critical), CurveClass::Emergency);
        assert_eq!(CurveClass::select(Idle, Intent), CurveClass::Standard);
        assert_eq!(CurveClass::select(Care, MedConf), CurveClass::Standard);
        assert_eq!(CurveClass::select(Integrity, Idle), CurveClass::Standard);
        assert_eq!(CurveClass::select(Critical, Care), CurveClass::Graceful);
        assert_eq!(CurveClass::select(Awareness, Idle), CurveClass::Graceful);
    }

    proptest! {
        #[test]
        fn prop_ease_monotonic_and_bounded(a in 0.0f64..1.0, b in 0.0f64..1.0) {
            let curve = CurveClass::Standard.curve();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let (ya, yb) = (curve.ease(lo), curve.ease(hi));
            prop_assert!((0.0..=1.0).contains(&ya));
            prop_assert!((0.0..=1.0).contains(&yb));
            prop_assert!(ya <= yb + 1e-9);
        }
    }
}
