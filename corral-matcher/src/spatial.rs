//! Great-circle distance and its decayed credit.

use geo::{Coord, Distance, Haversine, Point};

/// Haversine distance between two WGS84 coordinates in metres.
#[must_use]
pub fn distance_m(a: Coord, b: Coord) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b))
}

/// Linear decay: `1.0` within `full_credit_m`, `0.0` beyond `zero_credit_m`.
///
/// # Examples
///
/// ```
/// use corral_matcher::spatial_credit;
///
/// assert_eq!(spatial_credit(10.0, 50.0, 500.0), 1.0);
/// assert_eq!(spatial_credit(275.0, 50.0, 500.0), 0.5);
/// assert_eq!(spatial_credit(800.0, 50.0, 500.0), 0.0);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "interpolates between the decay bounds"
)]
pub fn spatial_credit(distance_m: f64, full_credit_m: f64, zero_credit_m: f64) -> f64 {
    if distance_m <= full_credit_m {
        1.0
    } else if distance_m >= zero_credit_m {
        0.0
    } else {
        (zero_credit_m - distance_m) / (zero_credit_m - full_credit_m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn fifty_metres_apart_is_about_fifty_metres() {
        // 0.00045 degrees of latitude is roughly 50 m.
        let a = Coord { x: -97.33, y: 32.75 };
        let b = Coord {
            x: -97.33,
            y: 32.750_45,
        };
        let d = distance_m(a, b);
        assert!((d - 50.0).abs() < 1.0, "got {d}");
    }

    #[rstest]
    #[case(50.0, 1.0)]
    #[case(500.0, 0.0)]
    #[case(140.0, 0.8)]
    fn decays_linearly(#[case] distance: f64, #[case] expected: f64) {
        assert!((spatial_credit(distance, 50.0, 500.0) - expected).abs() < 1e-12);
    }
}
