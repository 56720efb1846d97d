//! Compute layer for bucket hashing and distance calculations.
//!
//! This module separates the spatial arithmetic from the index's storage
//! concerns. It provides:
//! - The quadrant bisection hash used as the bucket key
//! - Ellipsoidal distance with a bounded iteration count
//! - Coordinate and query parameter validation

pub mod distance;
pub mod quadhash;
pub mod validation;
