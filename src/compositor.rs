// src/compositor.rs
//
// Frame index → renderable Scene. Seeks the replay source, computes every
// vehicle footprint, frames the ego-centered viewport, and passes the
// camera bundle through untouched.

use crate::errors::ReviewError;
use crate::footprint::record_footprint;
use crate::replay::ReplaySource;
use crate::types::{ImageBundle, Scene, ShapeRole, VehicleRecord, VehicleShape, Viewport};
use tracing::debug;

/// Half-extents of the rendered window, in world units. Design constants,
/// not derived from vehicle size or speed.
pub const VIEW_HALF_WIDTH: f64 = 60.0;
pub const VIEW_HALF_HEIGHT: f64 = 40.0;

/// Compose the scene for `frame`, centered on the ego vehicle.
///
/// A frame without an ego record cannot be framed and fails with
/// `NoEgoRecord`; an empty agent list is a valid (ego-only) scene.
/// Agents keep accessor order, which the renderer uses as layering order.
pub fn compose_scene(
    frame: usize,
    source: &mut dyn ReplaySource,
) -> Result<(Scene, Option<ImageBundle>), ReviewError> {
    source.seek(frame)?;

    let road = source.road_geometry().clone();
    let records = source.vehicle_records().clone();

    let ego_record = records
        .ego
        .as_ref()
        .ok_or(ReviewError::NoEgoRecord { frame })?;
    let ego = vehicle_shape(ego_record, ShapeRole::Ego)?;

    let agents = records
        .agents
        .iter()
        .map(|record| vehicle_shape(record, ShapeRole::Agent))
        .collect::<Result<Vec<_>, _>>()?;

    let viewport = Viewport {
        center_x: ego_record.pose.x,
        center_y: ego_record.pose.y,
        half_width: VIEW_HALF_WIDTH,
        half_height: VIEW_HALF_HEIGHT,
    };

    debug!(
        "Composed frame {}: {} road segments, {} agents",
        frame,
        road.segments.len(),
        agents.len()
    );

    let scene = Scene {
        road,
        ego,
        agents,
        viewport,
    };
    Ok((scene, source.image_bundle()))
}

fn vehicle_shape(record: &VehicleRecord, role: ShapeRole) -> Result<VehicleShape, ReviewError> {
    let label = match role {
        ShapeRole::Ego => "ego".to_string(),
        ShapeRole::Agent => record.id.clone(),
    };
    Ok(VehicleShape {
        label,
        role,
        footprint: record_footprint(&record.pose, &record.extent)?,
        anchor: [record.pose.x, record.pose.y],
    })
}
