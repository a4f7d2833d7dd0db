// src/footprint.rs
//
// Pure geometry: four-corner world-space footprint of a vehicle body from
// its pose and extents.

use crate::errors::ReviewError;
use crate::types::{Extent, Footprint, Pose};

/// The replay source encodes heading supplementary to standard mathematical
/// rotation; the drawn angle is `π − heading`. Changing this constant would
/// silently mis-orient every rendered vehicle against the road graph.
pub const HEADING_TO_ROTATION: f64 = std::f64::consts::PI;

/// Compute the four-corner polygon of a vehicle body in world coordinates.
///
/// Corner order before rotation is fixed: (+l/2,+w/2), (+l/2,−w/2),
/// (−l/2,−w/2), (−l/2,+w/2). Each corner is rotated by `π − heading` and
/// translated by (x, y). The output preserves that corner order.
pub fn vehicle_footprint(
    x: f64,
    y: f64,
    heading: f64,
    length: f64,
    width: f64,
) -> Result<Footprint, ReviewError> {
    if !(length > 0.0 && width > 0.0) {
        return Err(ReviewError::InvalidExtent { length, width });
    }

    let radian = HEADING_TO_ROTATION - heading;
    let (sin, cos) = radian.sin_cos();

    let half_length = length / 2.0;
    let half_width = width / 2.0;
    let corners = [
        [half_length, half_width],
        [half_length, -half_width],
        [-half_length, -half_width],
        [-half_length, half_width],
    ];

    let mut footprint = [[0.0f64; 2]; 4];
    for (out, [cx, cy]) in footprint.iter_mut().zip(corners) {
        // Row-vector rotation, matching the replay source's convention.
        out[0] = cx * cos + cy * sin + x;
        out[1] = cy * cos - cx * sin + y;
    }
    Ok(footprint)
}

/// Convenience wrapper over a full vehicle record.
pub fn record_footprint(pose: &Pose, extent: &Extent) -> Result<Footprint, ReviewError> {
    vehicle_footprint(pose.x, pose.y, pose.heading, extent.length, extent.width)
}
