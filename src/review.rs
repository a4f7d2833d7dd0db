// src/review.rs
//
// One review session per replay source. The session owns the source, so
// the seek position is never shared mutable state; every render is a
// synchronous function of (frame index, source state at seek time).

use crate::compositor::compose_scene;
use crate::errors::ReviewError;
use crate::renderer::render;
use crate::replay::ReplaySource;
use crate::types::{FrameRender, RenderConfig};
use tracing::debug;

pub struct ReviewSession<S: ReplaySource> {
    source: S,
    render_config: RenderConfig,
}

impl<S: ReplaySource> ReviewSession<S> {
    pub fn new(source: S, render_config: RenderConfig) -> Self {
        Self {
            source,
            render_config,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Render one frame: seek → fetch → transform → draw → encode.
    ///
    /// Completes or fails synchronously; errors surface unmodified with no
    /// retries. The returned buffers are owned by the caller.
    pub fn render_frame(&mut self, frame: usize) -> Result<FrameRender, ReviewError> {
        let (scene, images) = compose_scene(frame, &mut self.source)?;
        let scene_png = render(&scene, &self.render_config)?;
        debug!(
            "Rendered frame {} ({} bytes, bundle: {})",
            frame,
            scene_png.len(),
            images.is_some()
        );
        Ok(FrameRender { scene_png, images })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::{EpisodeLog, FrameLog, FrameRecords, RecordedEpisode};
    use crate::types::{Extent, ImageBundle, Pose, RoadGeometry, VehicleRecord};
    use std::path::PathBuf;

    fn ego() -> VehicleRecord {
        VehicleRecord {
            id: "egoCar".to_string(),
            pose: Pose {
                x: 0.0,
                y: 0.0,
                heading: 0.0,
            },
            extent: Extent {
                length: 4.0,
                width: 2.0,
            },
        }
    }

    fn config() -> RenderConfig {
        RenderConfig {
            image_width: 300,
            image_height: 200,
        }
    }

    #[test]
    fn test_render_frame_end_to_end() {
        let log = EpisodeLog {
            frames: vec![FrameLog {
                ego: Some(ego()),
                ..Default::default()
            }],
        };
        let episode = RecordedEpisode::from_log(log, PathBuf::from("."));
        let mut session = ReviewSession::new(episode, config());

        let result = session.render_frame(0).unwrap();
        assert!(!result.scene_png.is_empty());
        assert!(result.images.is_none());
    }

    #[test]
    fn test_out_of_range_yields_no_image() {
        let episode = RecordedEpisode::from_log(EpisodeLog::default(), PathBuf::from("."));
        let mut session = ReviewSession::new(episode, config());
        assert!(matches!(
            session.render_frame(0),
            Err(ReviewError::FrameOutOfRange { .. })
        ));
    }

    #[test]
    fn test_missing_ego_yields_no_partial_render() {
        let log = EpisodeLog {
            frames: vec![FrameLog::default()],
        };
        let episode = RecordedEpisode::from_log(log, PathBuf::from("."));
        let mut session = ReviewSession::new(episode, config());
        assert!(matches!(
            session.render_frame(0),
            Err(ReviewError::NoEgoRecord { frame: 0 })
        ));
    }

    /// Fake accessor carrying a bundle, to check pass-through end to end.
    struct BundledFake {
        records: FrameRecords,
        road: RoadGeometry,
    }

    impl ReplaySource for BundledFake {
        fn seek(&mut self, _frame: usize) -> Result<(), ReviewError> {
            Ok(())
        }

        fn road_geometry(&self) -> &RoadGeometry {
            &self.road
        }

        fn vehicle_records(&self) -> &FrameRecords {
            &self.records
        }

        fn image_bundle(&self) -> Option<ImageBundle> {
            Some(ImageBundle {
                front: Some(vec![1, 2, 3]),
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_bundle_passed_through_unmodified() {
        let source = BundledFake {
            records: FrameRecords {
                ego: Some(ego()),
                agents: vec![],
            },
            road: RoadGeometry::default(),
        };
        let mut session = ReviewSession::new(source, config());

        let result = session.render_frame(0).unwrap();
        assert_eq!(result.images.unwrap().front.unwrap(), vec![1, 2, 3]);
    }
}
