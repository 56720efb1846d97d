//! Ellipsoidal distance on the WGS84 ellipsoid.
//!
//! Uses Vincenty's inverse formula, which iterates on the longitude
//! difference on the auxiliary sphere until it converges. Nearly antipodal
//! point pairs may never converge; those return
//! [`StoreError::DistanceDidNotConverge`] instead of a distance.

use crate::error::{Result, StoreError};
use geo::Point;
use std::f64::consts::PI;

/// WGS84 semi-major axis in meters.
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 semi-minor axis in meters.
const WGS84_B: f64 = (1.0 - WGS84_F) * WGS84_A;

const CONVERGENCE_THRESHOLD: f64 = 1e-12;

/// Geodesic distance in meters between two points (x = longitude, y = latitude).
///
/// # Examples
///
/// ```rust
/// use geo::Point;
/// use store_locator::compute::distance::vincenty_distance;
///
/// let nyc = Point::new(-74.0060, 40.7128);
/// let la = Point::new(-118.2437, 34.0522);
///
/// let meters = vincenty_distance(&nyc, &la, 200).unwrap();
/// assert!(meters > 3_900_000.0 && meters < 4_000_000.0);
/// ```
pub fn vincenty_distance(from: &Point<f64>, to: &Point<f64>, max_iterations: usize) -> Result<f64> {
    let l = normalize_longitude((to.x() - from.x()).to_radians());
    let u1 = ((1.0 - WGS84_F) * from.y().to_radians().tan()).atan();
    let u2 = ((1.0 - WGS84_F) * to.y().to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..max_iterations {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();

        // Coincident points
        if sin_sigma == 0.0 {
            return Ok(0.0);
        }

        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // Equatorial lines have cos_sq_alpha == 0
        let cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };
        let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));

        let lambda_prev = lambda;
        lambda = l
            + (1.0 - c)
                * WGS84_F
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));

        if !lambda.is_finite() || lambda.abs() > PI {
            break;
        }

        if (lambda - lambda_prev).abs() < CONVERGENCE_THRESHOLD {
            let u_sq = cos_sq_alpha * (WGS84_A.powi(2) - WGS84_B.powi(2)) / WGS84_B.powi(2);
            let a = 1.0
                + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = b
                * sin_sigma
                * (cos_2sigma_m
                    + b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                            - b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma.powi(2))
                                * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));

            return Ok(WGS84_B * a * (sigma - delta_sigma));
        }
    }

    Err(StoreError::DistanceDidNotConverge {
        iterations: max_iterations,
    })
}

/// Geodesic distance in kilometers, see [`vincenty_distance`].
pub fn distance_km(from: &Point<f64>, to: &Point<f64>, max_iterations: usize) -> Result<f64> {
    Ok(vincenty_distance(from, to, max_iterations)? / 1000.0)
}

/// Wraps a longitude difference into [-PI, PI].
fn normalize_longitude(radians: f64) -> f64 {
    if radians > PI {
        radians - 2.0 * PI
    } else if radians < -PI {
        radians + 2.0 * PI
    } else {
        radians
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Distance, Geodesic};

    const ITERATIONS: usize = 200;

    fn assert_matches_karney(from: Point<f64>, to: Point<f64>) {
        let expected = Geodesic.distance(from, to);
        let actual = vincenty_distance(&from, &to, ITERATIONS).unwrap();
        // Vincenty is accurate to well under a millimeter on non-antipodal lines
        assert!(
            (expected - actual).abs() < 0.01,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_coincident_points() {
        let p = Point::new(114.2017, 22.3407);
        assert_eq!(vincenty_distance(&p, &p, ITERATIONS).unwrap(), 0.0);
    }

    #[test]
    fn test_matches_geodesic_reference() {
        assert_matches_karney(Point::new(-74.0060, 40.7128), Point::new(-118.2437, 34.0522));
        assert_matches_karney(Point::new(-0.1278, 51.5074), Point::new(2.3522, 48.8566));
        assert_matches_karney(Point::new(114.20, 22.34), Point::new(114.2134, 22.3229));
        assert_matches_karney(Point::new(151.2093, -33.8688), Point::new(-70.6693, -33.4489));
    }

    #[test]
    fn test_crosses_antimeridian() {
        assert_matches_karney(Point::new(179.5, 10.0), Point::new(-179.5, 10.0));
    }

    #[test]
    fn test_along_equator() {
        assert_matches_karney(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
    }

    #[test]
    fn test_symmetry() {
        let a = Point::new(114.15818, 22.28393);
        let b = Point::new(114.16461, 22.27765);
        let ab = vincenty_distance(&a, &b, ITERATIONS).unwrap();
        let ba = vincenty_distance(&b, &a, ITERATIONS).unwrap();
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn test_kilometers() {
        let a = Point::new(114.20, 22.34);
        let b = Point::new(114.20169067382812, 22.340700149536133);
        let km = distance_km(&a, &b, ITERATIONS).unwrap();
        assert!(km > 0.15 && km < 0.25, "got {km}");
    }

    #[test]
    fn test_nearly_antipodal_does_not_converge() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(179.7, 0.5);
        assert!(matches!(
            vincenty_distance(&a, &b, ITERATIONS),
            Err(StoreError::DistanceDidNotConverge { .. })
        ));
    }

    #[test]
    fn test_iteration_limit_is_respected() {
        let nyc = Point::new(-74.0060, 40.7128);
        let la = Point::new(-118.2437, 34.0522);
        assert!(matches!(
            vincenty_distance(&nyc, &la, 1),
            Err(StoreError::DistanceDidNotConverge { iterations: 1 })
        ));
    }
}
