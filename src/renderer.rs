// src/renderer.rs
//
// Serializes a composed Scene to PNG bytes with a small software
// rasterizer: road base layer first, then agent footprints in accessor
// order, then the ego footprint last so it is never occluded, then labels.
// The viewport bounds frame the visible area; no axes or chrome are drawn.

use crate::errors::ReviewError;
use crate::font;
use crate::types::{RenderConfig, Scene, VehicleShape, Viewport};
use image::codecs::png::PngEncoder;
use image::{Rgb, RgbImage};
use std::io::Cursor;

// ============================================================================
// PALETTE
// ============================================================================

/// Scene colors. Ego and agent fills keep the upstream dashboard palette.
pub mod colors {
    use image::Rgb;

    pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
    pub const ROAD: Rgb<u8> = Rgb([208, 208, 208]);
    pub const EGO_FILL: Rgb<u8> = Rgb([0xFF, 0x6D, 0x7D]);
    pub const AGENT_FILL: Rgb<u8> = Rgb([0x47, 0xC5, 0xFF]);
    pub const LABEL: Rgb<u8> = Rgb([25, 25, 25]);
}

// ============================================================================
// RENDER ENTRY POINT
// ============================================================================

/// Rasterize `scene` and encode it as PNG.
///
/// Fails with `RenderGeometry` if any footprint or road point is
/// non-finite; nothing partial is returned and the caller decides whether
/// to skip the frame.
pub fn render(scene: &Scene, config: &RenderConfig) -> Result<Vec<u8>, ReviewError> {
    validate_scene(scene)?;

    let mut canvas = Canvas::new(config.image_width, config.image_height, scene.viewport);

    // 1. Road base layer
    for segment in &scene.road.segments {
        for pair in segment.points.windows(2) {
            canvas.draw_thick_segment(pair[0], pair[1], segment.width, colors::ROAD);
        }
    }

    // 2. Agent footprints, accessor order (later agents draw on top)
    for agent in &scene.agents {
        canvas.fill_polygon(&agent.footprint, colors::AGENT_FILL);
    }

    // 3. Ego footprint last
    canvas.fill_polygon(&scene.ego.footprint, colors::EGO_FILL);

    // 4. Labels on top of all fills
    for agent in &scene.agents {
        canvas.draw_label(agent.anchor, &agent.label, colors::LABEL);
    }
    canvas.draw_label(scene.ego.anchor, &scene.ego.label, colors::LABEL);

    canvas.into_png()
}

fn validate_scene(scene: &Scene) -> Result<(), ReviewError> {
    for segment in &scene.road.segments {
        if !segment.width.is_finite() {
            return Err(ReviewError::RenderGeometry {
                detail: "road segment width is not finite".to_string(),
            });
        }
        for point in &segment.points {
            if !(point[0].is_finite() && point[1].is_finite()) {
                return Err(ReviewError::RenderGeometry {
                    detail: "road segment point is not finite".to_string(),
                });
            }
        }
    }
    validate_shape(&scene.ego)?;
    for agent in &scene.agents {
        validate_shape(agent)?;
    }
    Ok(())
}

fn validate_shape(shape: &VehicleShape) -> Result<(), ReviewError> {
    let finite = shape
        .footprint
        .iter()
        .chain(std::iter::once(&shape.anchor))
        .all(|v| v[0].is_finite() && v[1].is_finite());
    if finite {
        Ok(())
    } else {
        Err(ReviewError::RenderGeometry {
            detail: format!("footprint of '{}' contains non-finite vertices", shape.label),
        })
    }
}

// ============================================================================
// SOFTWARE RASTERIZER
// ============================================================================

/// Raster target with a world→pixel transform derived from the viewport.
/// All drawing clips to the canvas bounds, which realizes the viewport
/// framing: world coordinates outside the window land off-canvas.
struct Canvas {
    img: RgbImage,
    viewport: Viewport,
}

impl Canvas {
    fn new(width: u32, height: u32, viewport: Viewport) -> Self {
        let img = RgbImage::from_pixel(width, height, colors::BACKGROUND);
        Self { img, viewport }
    }

    /// World → pixel coordinates. Pixel y grows downward, world y upward.
    fn to_px(&self, x: f64, y: f64) -> (f64, f64) {
        let w = f64::from(self.img.width());
        let h = f64::from(self.img.height());
        let px = (x - self.viewport.min_x()) / self.viewport.width() * w;
        let py = (self.viewport.max_y() - y) / self.viewport.height() * h;
        (px, py)
    }

    /// Scanline fill of a closed polygon given in world coordinates.
    fn fill_polygon(&mut self, vertices: &[[f64; 2]], color: Rgb<u8>) {
        if vertices.len() < 3 {
            return;
        }
        let pts: Vec<(f64, f64)> = vertices.iter().map(|v| self.to_px(v[0], v[1])).collect();

        let height = self.img.height() as i64;
        let width = self.img.width() as i64;
        let y_lo = pts
            .iter()
            .map(|p| p.1)
            .fold(f64::INFINITY, f64::min)
            .floor()
            .max(0.0) as i64;
        let y_hi = pts
            .iter()
            .map(|p| p.1)
            .fold(f64::NEG_INFINITY, f64::max)
            .ceil()
            .min((height - 1) as f64) as i64;

        let mut crossings: Vec<f64> = Vec::with_capacity(pts.len());
        for row in y_lo..=y_hi {
            let yc = row as f64 + 0.5;
            crossings.clear();
            for i in 0..pts.len() {
                let (x1, y1) = pts[i];
                let (x2, y2) = pts[(i + 1) % pts.len()];
                // Half-open test so shared vertices count once.
                if (y1 <= yc && yc < y2) || (y2 <= yc && yc < y1) {
                    let t = (yc - y1) / (y2 - y1);
                    crossings.push(x1 + t * (x2 - x1));
                }
            }
            crossings.sort_by(f64::total_cmp);
            for span in crossings.chunks_exact(2) {
                let x_start = ((span[0] - 0.5).ceil().max(0.0)) as i64;
                let x_end = ((span[1] - 0.5).floor().min((width - 1) as f64)) as i64;
                for col in x_start..=x_end {
                    self.img
                        .put_pixel(col as u32, row as u32, color);
                }
            }
        }
    }

    /// Draw one road segment as a filled quad of the given world width.
    fn draw_thick_segment(&mut self, a: [f64; 2], b: [f64; 2], width: f64, color: Rgb<u8>) {
        let dx = b[0] - a[0];
        let dy = b[1] - a[1];
        let len = dx.hypot(dy);
        if len == 0.0 || width <= 0.0 {
            return;
        }
        let half = width / 2.0;
        let nx = -dy / len * half;
        let ny = dx / len * half;
        let quad = [
            [a[0] + nx, a[1] + ny],
            [b[0] + nx, b[1] + ny],
            [b[0] - nx, b[1] - ny],
            [a[0] - nx, a[1] - ny],
        ];
        self.fill_polygon(&quad, color);
    }

    /// Draw a bitmap-font label with its left edge just right of `anchor`.
    fn draw_label(&mut self, anchor: [f64; 2], text: &str, color: Rgb<u8>) {
        let (px, py) = self.to_px(anchor[0], anchor[1]);
        let mut cursor_x = px as i64 + 4;
        let top = py as i64 - (font::GLYPH_HEIGHT as i64) / 2;

        // Entirely off-canvas labels need no per-pixel work.
        if cursor_x + font::text_width(text) as i64 <= 0
            || cursor_x >= self.img.width() as i64
            || top + font::GLYPH_HEIGHT as i64 <= 0
            || top >= self.img.height() as i64
        {
            return;
        }

        for c in text.chars() {
            if let Some(rows) = font::glyph(c) {
                for (row_idx, row_bits) in rows.iter().enumerate() {
                    for col_idx in 0..font::GLYPH_WIDTH {
                        if (*row_bits >> (font::GLYPH_WIDTH - 1 - col_idx)) & 1 == 1 {
                            self.put_pixel_checked(
                                cursor_x + col_idx as i64,
                                top + row_idx as i64,
                                color,
                            );
                        }
                    }
                }
            }
            cursor_x += font::GLYPH_ADVANCE as i64;
        }
    }

    fn put_pixel_checked(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && x < self.img.width() as i64 && y < self.img.height() as i64 {
            self.img.put_pixel(x as u32, y as u32, color);
        }
    }

    fn into_png(self) -> Result<Vec<u8>, ReviewError> {
        let mut buf = Cursor::new(Vec::new());
        let encoder = PngEncoder::new(&mut buf);
        self.img
            .write_with_encoder(encoder)
            .map_err(|e| ReviewError::RenderGeometry {
                detail: format!("png encode failed: {e}"),
            })?;
        Ok(buf.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint::vehicle_footprint;
    use crate::types::{RoadGeometry, RoadSegment, ShapeRole};

    fn shape(label: &str, role: ShapeRole, x: f64, y: f64, l: f64, w: f64) -> VehicleShape {
        VehicleShape {
            label: label.to_string(),
            role,
            footprint: vehicle_footprint(x, y, 0.0, l, w).unwrap(),
            anchor: [x, y],
        }
    }

    fn test_config() -> RenderConfig {
        RenderConfig {
            image_width: 600,
            image_height: 400,
        }
    }

    fn ego_centered_scene(agents: Vec<VehicleShape>) -> Scene {
        Scene {
            road: RoadGeometry::default(),
            ego: shape("ego", ShapeRole::Ego, 0.0, 0.0, 4.0, 2.0),
            agents,
            viewport: Viewport {
                center_x: 0.0,
                center_y: 0.0,
                half_width: 60.0,
                half_height: 40.0,
            },
        }
    }

    fn decode(png: &[u8]) -> RgbImage {
        image::load_from_memory(png).unwrap().to_rgb8()
    }

    #[test]
    fn test_png_signature() {
        let png = render(&ego_centered_scene(vec![]), &test_config()).unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn test_ego_filled_at_center() {
        let png = render(&ego_centered_scene(vec![]), &test_config()).unwrap();
        let img = decode(&png);
        // Ego spans x ∈ [-2, 2] ⇒ pixels 290..310; sample left of the label.
        assert_eq!(*img.get_pixel(292, 200), colors::EGO_FILL);
        // Well outside every shape: background.
        assert_eq!(*img.get_pixel(30, 30), colors::BACKGROUND);
    }

    #[test]
    fn test_ego_drawn_over_agents() {
        // Two larger agents dead on top of ego; ego must still be visible.
        let agents = vec![
            shape("7", ShapeRole::Agent, 0.0, 0.0, 8.0, 4.0),
            shape("12", ShapeRole::Agent, 0.0, 0.0, 8.0, 4.0),
        ];
        let png = render(&ego_centered_scene(agents), &test_config()).unwrap();
        let img = decode(&png);
        assert_eq!(*img.get_pixel(292, 200), colors::EGO_FILL);
    }

    #[test]
    fn test_agent_layer_under_ego() {
        let agents = vec![shape("7", ShapeRole::Agent, 10.0, 0.0, 4.0, 2.0)];
        let png = render(&ego_centered_scene(agents), &test_config()).unwrap();
        let img = decode(&png);
        // Agent at x=10 ⇒ pixel x = (10+60)/120*600 = 350, spans 340..360.
        assert_eq!(*img.get_pixel(342, 200), colors::AGENT_FILL);
    }

    #[test]
    fn test_road_base_layer() {
        let mut scene = ego_centered_scene(vec![]);
        scene.road = RoadGeometry {
            segments: vec![RoadSegment {
                points: vec![[-60.0, 10.0], [60.0, 10.0]],
                width: 3.5,
            }],
        };
        let png = render(&scene, &test_config()).unwrap();
        let img = decode(&png);
        // y=10 ⇒ pixel row (40-10)/80*400 = 150.
        assert_eq!(*img.get_pixel(100, 150), colors::ROAD);
    }

    #[test]
    fn test_non_finite_footprint_rejected() {
        let mut scene = ego_centered_scene(vec![]);
        scene.ego.footprint[2][0] = f64::NAN;
        let err = render(&scene, &test_config()).unwrap_err();
        assert!(matches!(err, ReviewError::RenderGeometry { .. }));
    }

    #[test]
    fn test_non_finite_road_rejected() {
        let mut scene = ego_centered_scene(vec![]);
        scene.road = RoadGeometry {
            segments: vec![RoadSegment {
                points: vec![[0.0, 0.0], [f64::INFINITY, 1.0]],
                width: 3.5,
            }],
        };
        let err = render(&scene, &test_config()).unwrap_err();
        assert!(matches!(err, ReviewError::RenderGeometry { .. }));
    }

    #[test]
    fn test_offscreen_geometry_clips_cleanly() {
        let agents = vec![shape("99", ShapeRole::Agent, 500.0, 500.0, 4.0, 2.0)];
        let png = render(&ego_centered_scene(agents), &test_config()).unwrap();
        let img = decode(&png);
        assert_eq!(img.width(), 600);
        assert_eq!(img.height(), 400);
    }
}
