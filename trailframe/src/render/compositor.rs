//! Drawing a map frame through an external compositor.
//!
//! The library decides what goes where; a [`Compositor`] owns the pixel
//! work. [`FramePainter`] lays out one frame: tiles, track, markers,
//! position indicator and the two text labels.

use std::sync::Arc;

use image::{Rgba, RgbaImage};

use super::RenderError;
use crate::frame::{FrameState, Indicator, MarkerKind, ViewFrame};

/// Pixel operations on RGBA frame buffers.
pub trait Compositor: Send + Sync {
    /// Copies `source` onto `dest` with its top-left corner at `(x, y)`.
    fn paste(&self, dest: &mut RgbaImage, x: i64, y: i64, source: &RgbaImage) -> Result<(), RenderError>;

    /// Blends `source` over `dest` with its top-left corner at `(x, y)`.
    fn overlay_with_alpha(&self, dest: &mut RgbaImage, source: &RgbaImage, x: i64, y: i64) -> Result<(), RenderError>;

    /// Draws a polyline.
    fn render_line(&self, dest: &mut RgbaImage, points: &[(i64, i64)], color: Rgba<u8>, width: u32) -> Result<(), RenderError>;

    /// Draws `text` horizontally centred on `x` with its baseline at `y`.
    fn render_text(&self, dest: &mut RgbaImage, x: i64, y: i64, text: &str, size: f32, color: Rgba<u8>) -> Result<(), RenderError>;
}

/// Icons drawn on top of the map.
#[derive(Debug, Clone)]
pub struct MarkerImages {
    /// Anchored at its bottom centre.
    pub start: Arc<RgbaImage>,
    /// Anchored at its top centre.
    pub finish: Arc<RgbaImage>,
    /// Current position, anchored at its centre.
    pub position: Arc<RgbaImage>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintStyle {
    pub track_color: Rgba<u8>,
    pub track_width: u32,
    pub arrow_color: Rgba<u8>,
    pub arrow_length: u32,
    pub label_color: Rgba<u8>,
    pub label_size: f32,
}

impl Default for PaintStyle {
    fn default() -> Self {
        Self {
            track_color: Rgba([220, 30, 30, 255]),
            track_width: 3,
            arrow_color: Rgba([20, 20, 200, 255]),
            arrow_length: 24,
            label_color: Rgba([0, 0, 0, 255]),
            label_size: 32.0,
        }
    }
}

pub struct FramePainter<C: Compositor> {
    compositor: C,
    images: MarkerImages,
    style: PaintStyle,
}

impl<C: Compositor> FramePainter<C> {
    pub fn new(compositor: C, images: MarkerImages) -> Self {
        Self {
            compositor,
            images,
            style: PaintStyle::default(),
        }
    }

    pub fn with_style(mut self, style: PaintStyle) -> Self {
        self.style = style;
        self
    }

    pub fn compositor(&self) -> &C {
        &self.compositor
    }

    /// Paints the map view and labels of one frame into `dest`.
    pub fn paint(&self, dest: &mut RgbaImage, view: &ViewFrame, state: &FrameState) -> Result<(), RenderError> {
        let (vx, vy) = view.viewport;
        let (w, h) = (i64::from(dest.width()), i64::from(dest.height()));

        for (gx, gy, tile) in view.grid.placed_tiles() {
            if let Some(image) = tile.image() {
                self.compositor
                    .paste(dest, i64::from(gx) - vx, i64::from(gy) - vy, &image)?;
            }
        }

        for line in view.track.iter().filter(|l| l.len() > 1) {
            let points: Vec<(i64, i64)> = line.iter().map(|&(x, y)| (x - vx, y - vy)).collect();
            self.compositor
                .render_line(dest, &points, self.style.track_color, self.style.track_width)?;
        }

        for marker in &view.markers {
            let (image, anchor_y) = match marker.kind {
                MarkerKind::Start => (&self.images.start, i64::from(self.images.start.height())),
                MarkerKind::Finish => (&self.images.finish, 0),
            };
            let anchor_x = i64::from(image.width() / 2);
            self.compositor
                .overlay_with_alpha(dest, image, marker.x - anchor_x, marker.y - anchor_y)?;
        }

        // the view keeps the current position in the middle of the frame
        let (cx, cy) = (w / 2, h / 2);
        if let Indicator::Arrow { bearing } = view.indicator {
            let rad = bearing.to_radians();
            let len = f64::from(self.style.arrow_length);
            let tip = (
                cx + (len * rad.sin()).round() as i64,
                cy - (len * rad.cos()).round() as i64,
            );
            self.compositor
                .render_line(dest, &[(cx, cy), tip], self.style.arrow_color, self.style.track_width)?;
        }
        let dot = &self.images.position;
        self.compositor.overlay_with_alpha(
            dest,
            dot,
            cx - i64::from(dot.width() / 2),
            cy - i64::from(dot.height() / 2),
        )?;

        let size = self.style.label_size;
        self.compositor
            .render_text(dest, cx, size as i64 - 5, &state.time_label(), size, self.style.label_color)?;
        self.compositor
            .render_text(dest, cx, h - 5, &state.stats_label(), size, self.style.label_color)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::MapView;
    use crate::tile::source::tests::BlankSource;
    use crate::tile::TileCache;
    use crate::track::{Segment, TrackPoint};
    use parking_lot::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingCompositor {
        ops: Mutex<Vec<String>>,
    }

    impl Compositor for RecordingCompositor {
        fn paste(&self, _dest: &mut RgbaImage, x: i64, y: i64, _source: &RgbaImage) -> Result<(), RenderError> {
            self.ops.lock().push(format!("paste {} {}", x, y));
            Ok(())
        }

        fn overlay_with_alpha(&self, _dest: &mut RgbaImage, source: &RgbaImage, x: i64, y: i64) -> Result<(), RenderError> {
            self.ops.lock().push(format!("overlay {}x{} {} {}", source.width(), source.height(), x, y));
            Ok(())
        }

        fn render_line(&self, _dest: &mut RgbaImage, points: &[(i64, i64)], _color: Rgba<u8>, _width: u32) -> Result<(), RenderError> {
            self.ops.lock().push(format!("line {:?}", points));
            Ok(())
        }

        fn render_text(&self, _dest: &mut RgbaImage, x: i64, y: i64, text: &str, _size: f32, _color: Rgba<u8>) -> Result<(), RenderError> {
            self.ops.lock().push(format!("text {} {} {}", x, y, text));
            Ok(())
        }
    }

    fn images() -> MarkerImages {
        MarkerImages {
            start: Arc::new(RgbaImage::new(10, 20)),
            finish: Arc::new(RgbaImage::new(12, 14)),
            position: Arc::new(RgbaImage::new(8, 8)),
        }
    }

    fn frame(zoom: u8, dir: &TempDir) -> (ViewFrame, FrameState) {
        let mut seg = Segment::new(0.0, 0.0);
        seg.add_point(TrackPoint::new(0.0, 48.0, 2.0));
        seg.add_point(TrackPoint::new(1.0, 48.0005, 2.0005));
        let overview = Arc::new(seg);

        let cache = Arc::new(TileCache::new(dir.path(), BlankSource::new(256)).unwrap());
        let mut view = MapView::new(cache, zoom, (256, 256), Arc::clone(&overview));
        view.update(48.0, 2.0).unwrap();

        let mut point = overview[0].clone();
        point.bearing = 90.0;
        let state = FrameState::new(0, &point, 0, zoom);
        (view.frame(point.bearing).unwrap(), state)
    }

    #[test]
    fn test_paint_order_and_anchors() {
        let dir = TempDir::new().unwrap();
        let (view, state) = frame(16, &dir);
        let painter = FramePainter::new(RecordingCompositor::default(), images());
        let mut dest = RgbaImage::new(256, 256);

        painter.paint(&mut dest, &view, &state).unwrap();
        let ops = painter.compositor().ops.lock().clone();

        assert_eq!(ops.iter().filter(|o| o.starts_with("paste")).count(), 9);
        assert!(ops[9].starts_with("line"));

        // start marker is anchored at its bottom centre, on the current position
        assert!(ops.contains(&"overlay 10x20 123 108".to_string()));
        // heading east: arrow points right from the centre
        assert!(ops.contains(&"line [(128, 128), (152, 128)]".to_string()));
        assert!(ops.contains(&"overlay 8x8 124 124".to_string()));
        assert!(ops.last().unwrap().contains("km/h"));
    }

    #[test]
    fn test_low_zoom_draws_no_arrow() {
        let dir = TempDir::new().unwrap();
        let (view, state) = frame(5, &dir);
        let painter = FramePainter::new(RecordingCompositor::default(), images());
        let mut dest = RgbaImage::new(256, 256);

        painter.paint(&mut dest, &view, &state).unwrap();
        let ops = painter.compositor().ops.lock().clone();
        assert!(!ops.iter().any(|o| o.starts_with("line [(128, 128)")));
    }
}
