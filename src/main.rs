// src/main.rs
//
// Review host: walks a recorded decision episode and renders each frame's
// top-down scene to PNG, saving correlated camera captures alongside and
// logging the frame's evaluation scores and LLM reasoning metadata. The
// render pipeline itself lives in the library modules; this is glue.

mod compositor;
mod config;
mod errors;
mod font;
mod footprint;
mod renderer;
mod replay;
mod review;
mod types;

use anyhow::{Context, Result};
use replay::{find_episodes, RecordedEpisode};
use review::ReviewSession;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

fn main() -> Result<()> {
    let config = types::Config::load_or_default("config.yaml")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.clone())),
        )
        .init();

    info!("🚗 Episode Review Starting");

    let episode_path = resolve_episode_path(&config.replay.episode_path)?;
    info!("Episode: {}", episode_path.display());

    let episode = RecordedEpisode::load(&episode_path)?;
    let frame_count = episode.frame_count();
    if frame_count == 0 {
        error!("Episode contains no frames");
        return Ok(());
    }

    let output_dir = PathBuf::from(&config.replay.output_dir);
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating output dir {}", output_dir.display()))?;

    // Optional single-frame selection from the command line; the full
    // episode is rendered otherwise.
    let selected: Option<usize> = std::env::args()
        .nth(1)
        .map(|arg| arg.parse().context("frame index must be a non-negative integer"))
        .transpose()?;

    let frames: Vec<usize> = match selected {
        Some(frame) => vec![frame],
        None => (0..frame_count).collect(),
    };

    let mut session = ReviewSession::new(episode, config.render.clone());
    let mut rendered = 0usize;
    let mut skipped = 0usize;

    for frame in frames {
        match session.render_frame(frame) {
            Ok(result) => {
                let png_path = output_dir.join(format!("frame_{frame:05}.png"));
                fs::write(&png_path, &result.scene_png)
                    .with_context(|| format!("writing {}", png_path.display()))?;

                if let Some(bundle) = &result.images {
                    for (view, bytes) in bundle.views() {
                        let view_path =
                            output_dir.join(format!("frame_{frame:05}_{view}.jpg"));
                        fs::write(&view_path, bytes)
                            .with_context(|| format!("writing {}", view_path.display()))?;
                    }
                }

                log_frame_metadata(frame, session.source());
                rendered += 1;
            }
            // A bad frame is skipped visibly, never rendered incorrectly.
            Err(e) => {
                warn!("Frame {frame} skipped: {e}");
                skipped += 1;
            }
        }
    }

    info!("✓ Review complete");
    info!("  Frames rendered: {rendered}");
    info!("  Frames skipped:  {skipped}");
    info!("  Output: {}", output_dir.display());
    Ok(())
}

fn resolve_episode_path(configured: &str) -> Result<PathBuf> {
    let configured = PathBuf::from(configured);
    if configured.exists() {
        return Ok(configured);
    }

    // Fall back to scanning the experiments tree for recorded episodes.
    let root = Path::new("experiments");
    let candidates = find_episodes(root);
    match candidates.into_iter().next() {
        Some(path) => {
            warn!(
                "Configured episode {} not found, using {}",
                configured.display(),
                path.display()
            );
            Ok(path)
        }
        None => anyhow::bail!(
            "no episode log at {} and none found under {}",
            configured.display(),
            root.display()
        ),
    }
}

fn log_frame_metadata(frame: usize, episode: &RecordedEpisode) {
    if let Some(eval) = episode.evaluation() {
        info!(
            "Frame {frame}: decision={:.2} comfort={:.2} safety={:.2} efficiency={:.2}",
            eval.decision_score, eval.comfort_score, eval.safety_score, eval.efficiency_score
        );
        for line in eval.caution.lines().filter(|l| !l.is_empty()) {
            info!("  ⚠️  {line}");
        }
    }
    if let Some(qa) = episode.qa() {
        let reasoning = qa.response.lines().next().unwrap_or("");
        if !reasoning.is_empty() {
            info!("  🧠 {reasoning}");
        }
    }
}
