// src/replay.rs
//
// Scene replay access: the four-method accessor contract plus a file-backed
// implementation over a recorded episode log. One seek position per source;
// records are re-exported on every seek, never cached across frames.

use crate::errors::ReviewError;
use crate::types::{ImageBundle, RoadGeometry, VehicleRecord};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Per-frame vehicle export: one optional ego record plus agents of
/// interest in recorded order. This is the tagged replacement for the
/// upstream dictionary-of-lists shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameRecords {
    pub ego: Option<VehicleRecord>,
    #[serde(default)]
    pub agents: Vec<VehicleRecord>,
}

/// Contract consumed by scene composition. The seek position is the only
/// implicit state, owned entirely by the source; callers serialize access
/// (at most one in-flight render per source).
pub trait ReplaySource {
    /// Position the source at `frame`. Out-of-range indices fail with
    /// `FrameOutOfRange` and must leave the position unchanged.
    fn seek(&mut self, frame: usize) -> Result<(), ReviewError>;

    /// Road geometry at the current position.
    fn road_geometry(&self) -> &RoadGeometry;

    /// Vehicle records at the current position.
    fn vehicle_records(&self) -> &FrameRecords;

    /// Correlated camera captures at the current position, if any.
    fn image_bundle(&self) -> Option<ImageBundle>;
}

/// Per-frame decision evaluation carried by the episode log. Read-only
/// metadata for the review host; the render pipeline never interprets it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationInfo {
    pub decision_score: f64,
    pub comfort_score: f64,
    pub safety_score: f64,
    pub efficiency_score: f64,
    #[serde(default)]
    pub caution: String,
}

/// Logged prompt/response pair for the frame's decision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QaInfo {
    pub description: String,
    pub navigation: String,
    pub actions: String,
    pub response: String,
}

/// Camera capture files for one frame, relative to the episode file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CameraPaths {
    pub front: Option<String>,
    pub front_left: Option<String>,
    pub front_right: Option<String>,
    pub back: Option<String>,
    pub back_left: Option<String>,
    pub back_right: Option<String>,
}

/// One recorded frame of the episode log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameLog {
    #[serde(default)]
    pub road: RoadGeometry,
    pub ego: Option<VehicleRecord>,
    #[serde(default)]
    pub agents: Vec<VehicleRecord>,
    #[serde(default)]
    pub cameras: Option<CameraPaths>,
    #[serde(default)]
    pub evaluation: Option<EvaluationInfo>,
    #[serde(default)]
    pub qa: Option<QaInfo>,
}

/// Serialized episode: one entry per recorded time-step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpisodeLog {
    pub frames: Vec<FrameLog>,
}

/// File-backed replay source over a recorded episode.
pub struct RecordedEpisode {
    frames: Vec<FrameLog>,
    base_dir: PathBuf,
    cursor: usize,
    // Exports for the current seek position, rebuilt on every seek.
    road: RoadGeometry,
    records: FrameRecords,
    bundle: Option<ImageBundle>,
}

impl RecordedEpisode {
    /// Load an episode log from a JSON file. Camera captures stay on disk
    /// until the frame is seeked.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading episode log {}", path.display()))?;
        let log: EpisodeLog = serde_json::from_str(&contents)
            .with_context(|| format!("parsing episode log {}", path.display()))?;
        let base_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        info!(
            "Loaded episode {} ({} frames)",
            path.display(),
            log.frames.len()
        );
        Ok(Self::from_log(log, base_dir))
    }

    pub fn from_log(log: EpisodeLog, base_dir: PathBuf) -> Self {
        Self {
            frames: log.frames,
            base_dir,
            cursor: 0,
            road: RoadGeometry::default(),
            records: FrameRecords::default(),
            bundle: None,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn current_frame(&self) -> usize {
        self.cursor
    }

    /// Evaluation metadata for the current seek position.
    pub fn evaluation(&self) -> Option<&EvaluationInfo> {
        self.frames.get(self.cursor)?.evaluation.as_ref()
    }

    /// QA metadata for the current seek position.
    pub fn qa(&self) -> Option<&QaInfo> {
        self.frames.get(self.cursor)?.qa.as_ref()
    }

    fn load_bundle(&self, cameras: &CameraPaths) -> Option<ImageBundle> {
        let bundle = ImageBundle {
            front: self.read_view(cameras.front.as_deref()),
            front_left: self.read_view(cameras.front_left.as_deref()),
            front_right: self.read_view(cameras.front_right.as_deref()),
            back: self.read_view(cameras.back.as_deref()),
            back_left: self.read_view(cameras.back_left.as_deref()),
            back_right: self.read_view(cameras.back_right.as_deref()),
        };
        if bundle.is_empty() {
            None
        } else {
            Some(bundle)
        }
    }

    fn read_view(&self, rel: Option<&str>) -> Option<Vec<u8>> {
        let rel = rel?;
        let path = self.base_dir.join(rel);
        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Camera capture {} unreadable: {}", path.display(), e);
                None
            }
        }
    }
}

impl ReplaySource for RecordedEpisode {
    fn seek(&mut self, frame: usize) -> Result<(), ReviewError> {
        let frame_count = self.frames.len();
        let entry = self
            .frames
            .get(frame)
            .ok_or(ReviewError::FrameOutOfRange { frame, frame_count })?;

        self.cursor = frame;
        self.road = entry.road.clone();
        self.records = FrameRecords {
            ego: entry.ego.clone(),
            agents: entry.agents.clone(),
        };
        self.bundle = match &entry.cameras {
            Some(cameras) => self.load_bundle(cameras),
            None => None,
        };
        debug!(
            "Seeked to frame {} ({} agents, cameras: {})",
            frame,
            self.records.agents.len(),
            self.bundle.is_some()
        );
        Ok(())
    }

    fn road_geometry(&self) -> &RoadGeometry {
        &self.road
    }

    fn vehicle_records(&self) -> &FrameRecords {
        &self.records
    }

    fn image_bundle(&self) -> Option<ImageBundle> {
        self.bundle.clone()
    }
}

/// Find episode logs under an experiments directory tree.
pub fn find_episodes(root: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "json")
        })
        .map(|entry| entry.into_path())
        .collect();
    found.sort();
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Extent, Pose, VehicleRecord};

    fn record(id: &str, x: f64, y: f64) -> VehicleRecord {
        VehicleRecord {
            id: id.to_string(),
            pose: Pose {
                x,
                y,
                heading: 0.0,
            },
            extent: Extent {
                length: 4.0,
                width: 2.0,
            },
        }
    }

    fn two_frame_episode() -> RecordedEpisode {
        let log = EpisodeLog {
            frames: vec![
                FrameLog {
                    ego: Some(record("egoCar", 0.0, 0.0)),
                    agents: vec![record("7", 5.0, 1.0), record("12", -6.0, -2.0)],
                    ..Default::default()
                },
                FrameLog {
                    ego: Some(record("egoCar", 1.5, 0.5)),
                    ..Default::default()
                },
            ],
        };
        RecordedEpisode::from_log(log, PathBuf::from("."))
    }

    #[test]
    fn test_seek_exports_tagged_records() {
        let mut episode = two_frame_episode();
        episode.seek(0).unwrap();

        let records = episode.vehicle_records();
        assert_eq!(records.ego.as_ref().unwrap().id, "egoCar");
        assert_eq!(records.agents.len(), 2);
        // Recorded order is preserved for layering.
        assert_eq!(records.agents[0].id, "7");
        assert_eq!(records.agents[1].id, "12");
        assert!(episode.image_bundle().is_none());
    }

    #[test]
    fn test_seek_out_of_range() {
        let mut episode = two_frame_episode();
        episode.seek(1).unwrap();

        let err = episode.seek(2).unwrap_err();
        assert!(matches!(
            err,
            ReviewError::FrameOutOfRange {
                frame: 2,
                frame_count: 2
            }
        ));
        // Failed seek leaves the position unchanged.
        assert_eq!(episode.current_frame(), 1);
        assert_eq!(
            episode.vehicle_records().ego.as_ref().unwrap().pose.x,
            1.5
        );
    }

    #[test]
    fn test_records_rebuilt_per_seek() {
        let mut episode = two_frame_episode();
        episode.seek(0).unwrap();
        assert_eq!(episode.vehicle_records().agents.len(), 2);

        episode.seek(1).unwrap();
        assert!(episode.vehicle_records().agents.is_empty());
    }
}
