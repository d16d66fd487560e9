//! Screen-space overlay: lines and the composited 3D target, painted through egui.

use collscope_core::PackedColor;
use glam::Vec2;

/// One screen-space line of the current frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OverlayLine {
    pub from: Vec2,
    pub to: Vec2,
    pub color: PackedColor,
    pub thickness: f32,
}

/// Immediate-mode sink for the overlay at the end of a frame.
pub trait OverlayPainter {
    fn overlay_line(&mut self, line: &OverlayLine);

    /// Composite a rendered target at `min` with `size` pixels.
    fn overlay_image(&mut self, texture: egui::TextureId, min: Vec2, size: Vec2);
}

fn to_pos2(v: Vec2) -> egui::Pos2 {
    egui::pos2(v.x, v.y)
}

fn to_color32(color: PackedColor) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), color.a())
}

impl OverlayPainter for egui::Painter {
    fn overlay_line(&mut self, line: &OverlayLine) {
        self.line_segment(
            [to_pos2(line.from), to_pos2(line.to)],
            egui::Stroke::new(line.thickness, to_color32(line.color)),
        );
    }

    fn overlay_image(&mut self, texture: egui::TextureId, min: Vec2, size: Vec2) {
        let rect = egui::Rect::from_min_size(to_pos2(min), egui::vec2(size.x, size.y));
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        self.image(texture, rect, uv, egui::Color32::WHITE);
    }
}

/// Painter for the full-screen overlay layer, drawn below every window.
pub fn overlay_painter(ctx: &egui::Context) -> egui::Painter {
    ctx.layer_painter(egui::LayerId::new(
        egui::Order::Background,
        egui::Id::new("collscope_world_overlay"),
    ))
}

/// Painter that keeps what it was given.
#[derive(Debug, Default)]
pub struct RecordedOverlay {
    pub lines: Vec<OverlayLine>,
    pub images: Vec<(egui::TextureId, Vec2, Vec2)>,
}

impl OverlayPainter for RecordedOverlay {
    fn overlay_line(&mut self, line: &OverlayLine) {
        self.lines.push(*line);
    }

    fn overlay_image(&mut self, texture: egui::TextureId, min: Vec2, size: Vec2) {
        self.images.push((texture, min, size));
    }
}
