use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub replay: ReplayConfig,
    pub render: RenderConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    pub episode_path: String,
    pub output_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub image_width: u32,
    pub image_height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            replay: ReplayConfig {
                episode_path: "experiments/episode.json".to_string(),
                output_dir: "renders".to_string(),
            },
            render: RenderConfig {
                image_width: 900,
                image_height: 600,
            },
            logging: LoggingConfig {
                level: "episode_review=info".to_string(),
            },
        }
    }
}

/// World-space position and orientation of a vehicle body.
///
/// `heading` is in radians in the replay source's convention, which is
/// supplementary to standard mathematical rotation (see `footprint`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

/// Body dimensions of a vehicle, both strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub length: f64,
    pub width: f64,
}

/// One vehicle's state at a single frame, as exported by the replay source.
/// Recomputed on every frame change; never cached across frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub id: String,
    pub pose: Pose,
    pub extent: Extent,
}

/// Four-corner polygon of a vehicle body in world coordinates, in the
/// fixed winding produced by `footprint::vehicle_footprint`.
pub type Footprint = [[f64; 2]; 4];

/// Road geometry for one frame. Opaque to scene composition; the renderer
/// draws each segment as a thick polyline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoadGeometry {
    pub segments: Vec<RoadSegment>,
}

/// A single lane centerline with its drawable width.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadSegment {
    pub points: Vec<[f64; 2]>,
    pub width: f64,
}

/// Whether a shape is the highlighted ego body or a secondary agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeRole {
    Ego,
    Agent,
}

/// A computed footprint plus the label anchored at the vehicle position.
#[derive(Debug, Clone)]
pub struct VehicleShape {
    pub label: String,
    pub role: ShapeRole,
    pub footprint: Footprint,
    pub anchor: [f64; 2],
}

/// Fixed-size world-coordinate window rendered each frame, centered on ego.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center_x: f64,
    pub center_y: f64,
    pub half_width: f64,
    pub half_height: f64,
}

impl Viewport {
    pub fn min_x(&self) -> f64 {
        self.center_x - self.half_width
    }

    pub fn max_x(&self) -> f64 {
        self.center_x + self.half_width
    }

    pub fn min_y(&self) -> f64 {
        self.center_y - self.half_height
    }

    pub fn max_y(&self) -> f64 {
        self.center_y + self.half_height
    }

    pub fn width(&self) -> f64 {
        2.0 * self.half_width
    }

    pub fn height(&self) -> f64 {
        2.0 * self.half_height
    }
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct Scene {
    pub road: RoadGeometry,
    pub ego: VehicleShape,
    /// Accessor order preserved; later agents draw on top of earlier ones.
    pub agents: Vec<VehicleShape>,
    pub viewport: Viewport,
}

/// Logged camera captures correlated with one frame. Pass-through bytes;
/// the core never decodes them.
#[derive(Debug, Clone, Default)]
pub struct ImageBundle {
    pub front: Option<Vec<u8>>,
    pub front_left: Option<Vec<u8>>,
    pub front_right: Option<Vec<u8>>,
    pub back: Option<Vec<u8>>,
    pub back_left: Option<Vec<u8>>,
    pub back_right: Option<Vec<u8>>,
}

impl ImageBundle {
    pub fn is_empty(&self) -> bool {
        self.views().is_empty()
    }

    /// Named views present in this bundle, in dashboard display order.
    pub fn views(&self) -> Vec<(&'static str, &[u8])> {
        [
            ("front_left", &self.front_left),
            ("front", &self.front),
            ("front_right", &self.front_right),
            ("back_left", &self.back_left),
            ("back", &self.back),
            ("back_right", &self.back_right),
        ]
        .into_iter()
        .filter_map(|(name, data)| data.as_deref().map(|d| (name, d)))
        .collect()
    }
}

/// Result of one render request: the PNG scene plus camera pass-through.
/// Owned by the caller after return.
#[derive(Debug, Clone)]
pub struct FrameRender {
    pub scene_png: Vec<u8>,
    pub images: Option<ImageBundle>,
}
