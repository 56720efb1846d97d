//! Quadrant bisection hash used as the spatial bucket key.
//!
//! Each character of a key encodes one refinement step: the current latitude
//! range and longitude range are both halved, and the pair of chosen halves
//! (latitude bit first, then longitude bit) selects one of four characters.
//!
//! ```text
//! lat bit  lon bit  char
//!    0        0      'a'
//!    0        1      'b'
//!    1        1      'c'
//!    1        0      'd'
//! ```
//!
//! A key is a lossy identifier for a rectangle, so decoding yields the
//! rectangle's midpoint rather than the original coordinates.
//!
//! # Examples
//!
//! ```rust
//! use store_locator::compute::quadhash;
//!
//! let key = quadhash::encode(22.3407, 114.2017, 8).unwrap();
//! assert_eq!(key.len(), 8);
//!
//! let bounds = quadhash::bounds(&key).unwrap();
//! assert!(bounds.min().y <= 22.3407 && 22.3407 <= bounds.max().y);
//! ```

use crate::compute::validation::validate_coordinates;
use crate::error::{Result, StoreError};
use geo::{Point, Rect, coord};

/// Longest key `encode` will produce; larger requests are capped.
pub const MAX_PRECISION: usize = 12;

const LAT_RANGE: (f64, f64) = (-90.0, 90.0);
const LON_RANGE: (f64, f64) = (-180.0, 180.0);

fn quadrant_char(lat_bit: bool, lon_bit: bool) -> char {
    match (lat_bit, lon_bit) {
        (false, false) => 'a',
        (false, true) => 'b',
        (true, true) => 'c',
        (true, false) => 'd',
    }
}

fn quadrant_bits(c: char) -> Option<(bool, bool)> {
    match c {
        'a' => Some((false, false)),
        'b' => Some((false, true)),
        'c' => Some((true, true)),
        'd' => Some((true, false)),
        _ => None,
    }
}

/// Encode a coordinate pair into a bucket key of `precision` characters.
///
/// Precision above [`MAX_PRECISION`] is capped. Fails with
/// [`StoreError::Encoding`] for a zero precision or for coordinates that are
/// non-finite or outside the WGS84 ranges.
pub fn encode(lat: f64, lon: f64, precision: usize) -> Result<String> {
    if precision == 0 {
        return Err(StoreError::Encoding(
            "precision must be at least 1".to_string(),
        ));
    }
    validate_coordinates(lat, lon).map_err(|e| StoreError::Encoding(e.to_string()))?;

    let precision = precision.min(MAX_PRECISION);
    let (mut lat_min, mut lat_max) = LAT_RANGE;
    let (mut lon_min, mut lon_max) = LON_RANGE;
    let mut hash = String::with_capacity(precision);

    while hash.len() < precision {
        let lat_mid = (lat_min + lat_max) / 2.0;
        let lat_bit = lat >= lat_mid;
        if lat_bit {
            lat_min = lat_mid;
        } else {
            lat_max = lat_mid;
        }

        let lon_mid = (lon_min + lon_max) / 2.0;
        let lon_bit = lon >= lon_mid;
        if lon_bit {
            lon_min = lon_mid;
        } else {
            lon_max = lon_mid;
        }

        hash.push(quadrant_char(lat_bit, lon_bit));
    }

    Ok(hash)
}

/// Rectangle denoted by a bucket key (x = longitude, y = latitude).
pub fn bounds(hash: &str) -> Result<Rect<f64>> {
    let (mut lat_min, mut lat_max) = LAT_RANGE;
    let (mut lon_min, mut lon_max) = LON_RANGE;

    for c in hash.chars() {
        let (lat_bit, lon_bit) = quadrant_bits(c)
            .ok_or_else(|| StoreError::InvalidBucketKey(format!("unexpected character {c:?} in {hash:?}")))?;

        let lat_mid = (lat_min + lat_max) / 2.0;
        if lat_bit {
            lat_min = lat_mid;
        } else {
            lat_max = lat_mid;
        }

        let lon_mid = (lon_min + lon_max) / 2.0;
        if lon_bit {
            lon_min = lon_mid;
        } else {
            lon_max = lon_mid;
        }
    }

    Ok(Rect::new(
        coord! { x: lon_min, y: lat_min },
        coord! { x: lon_max, y: lat_max },
    ))
}

/// Midpoint of the rectangle denoted by a bucket key.
pub fn decode(hash: &str) -> Result<Point<f64>> {
    Ok(bounds(hash)?.center().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(rect: &Rect<f64>, lat: f64, lon: f64) -> bool {
        rect.min().y <= lat && lat <= rect.max().y && rect.min().x <= lon && lon <= rect.max().x
    }

    #[test]
    fn test_encode_first_quadrants() {
        assert_eq!(encode(-45.0, -90.0, 1).unwrap(), "a");
        assert_eq!(encode(-45.0, 90.0, 1).unwrap(), "b");
        assert_eq!(encode(45.0, 90.0, 1).unwrap(), "c");
        assert_eq!(encode(45.0, -90.0, 1).unwrap(), "d");
    }

    #[test]
    fn test_midpoint_goes_to_upper_half() {
        assert_eq!(encode(0.0, 0.0, 1).unwrap(), "c");
        assert_eq!(encode(90.0, 180.0, 3).unwrap(), "ccc");
        assert_eq!(encode(-90.0, -180.0, 3).unwrap(), "aaa");
    }

    #[test]
    fn test_encode_is_deterministic_and_fixed_length() {
        let a = encode(42.62889, -79.4472, 8).unwrap();
        let b = encode(42.62889, -79.4472, 8).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[test]
    fn test_precision_is_capped() {
        let hash = encode(42.72889, -80.5472, 40).unwrap();
        assert_eq!(hash.len(), MAX_PRECISION);
    }

    #[test]
    fn test_encode_rejects_bad_input() {
        assert!(matches!(encode(f64::NAN, 0.0, 8), Err(StoreError::Encoding(_))));
        assert!(matches!(encode(0.0, f64::INFINITY, 8), Err(StoreError::Encoding(_))));
        assert!(matches!(encode(91.0, 0.0, 8), Err(StoreError::Encoding(_))));
        assert!(matches!(encode(0.0, -181.0, 8), Err(StoreError::Encoding(_))));
        assert!(matches!(encode(10.0, 10.0, 0), Err(StoreError::Encoding(_))));
    }

    #[test]
    fn test_decode_roundtrip_within_bounds() {
        let points = [
            (42.62889, -79.4472),
            (43.72989, -79.4472),
            (44.72889, -79.44722),
            (42.72889, -78.5472),
            (-33.8688, 151.2093),
            (22.3407, 114.2017),
            (89.9, -179.9),
        ];

        for (lat, lon) in points {
            for precision in 1..=MAX_PRECISION {
                let hash = encode(lat, lon, precision).unwrap();
                let rect = bounds(&hash).unwrap();
                assert!(contains(&rect, lat, lon), "{lat},{lon} outside {hash}");

                let center = decode(&hash).unwrap();
                assert!(contains(&rect, center.y(), center.x()));
            }
        }
    }

    #[test]
    fn test_higher_precision_never_grows_the_cell() {
        let (lat, lon) = (51.5074, -0.1278);
        let mut prev_width = f64::INFINITY;
        let mut prev_height = f64::INFINITY;

        for precision in 1..=MAX_PRECISION {
            let rect = bounds(&encode(lat, lon, precision).unwrap()).unwrap();
            assert!(rect.width() <= prev_width);
            assert!(rect.height() <= prev_height);
            prev_width = rect.width();
            prev_height = rect.height();
        }
    }

    #[test]
    fn test_cell_size_at_default_precision() {
        let rect = bounds(&encode(0.0, 0.0, 8).unwrap()).unwrap();
        assert!((rect.height() - 180.0 / 256.0).abs() < 1e-12);
        assert!((rect.width() - 360.0 / 256.0).abs() < 1e-12);
    }

    #[test]
    fn test_prefix_property() {
        let long = encode(22.28, 114.16, 12).unwrap();
        let short = encode(22.28, 114.16, 5).unwrap();
        assert!(long.starts_with(&short));
    }

    #[test]
    fn test_bounds_rejects_unknown_characters() {
        assert!(matches!(bounds("abcz"), Err(StoreError::InvalidBucketKey(_))));
        assert!(decode("dr5r").is_err());
    }

    #[test]
    fn test_empty_key_is_whole_plane() {
        let rect = bounds("").unwrap();
        assert_eq!(rect.min().x, -180.0);
        assert_eq!(rect.max().y, 90.0);
    }
}
