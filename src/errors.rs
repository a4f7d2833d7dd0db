// src/errors.rs
//
// Error taxonomy for the review pipeline. All four variants surface to the
// caller unmodified; the pipeline performs no retries and no silent
// recovery. A bad frame is skipped or reported, never rendered wrong.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
    /// Vehicle dimensions must be strictly positive and finite.
    #[error("invalid vehicle extent: length={length}, width={width}")]
    InvalidExtent { length: f64, width: f64 },

    /// The scene has no ego record, so the viewport cannot be centered.
    #[error("frame {frame} has no ego record to center the viewport on")]
    NoEgoRecord { frame: usize },

    /// Frame index beyond the replay source's recorded range.
    #[error("frame {frame} is out of range, episode has {frame_count} frames")]
    FrameOutOfRange { frame: usize, frame_count: usize },

    /// Non-finite or otherwise undrawable geometry reached the renderer.
    #[error("render geometry failure: {detail}")]
    RenderGeometry { detail: String },
}
