//! View transform: pan/zoom between model and screen space.

use crate::config::EditorConfig;
use crate::layout::ViewState;
use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Direction of a single zoom step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Maps model coordinates to screen pixels: `screen = model * scale + pan`.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewTransform {
    /// Screen-space translation.
    pub pan: Vec2,
    scale: f64,
    min_scale: f64,
    max_scale: f64,
    zoom_step: f64,
    fit_margin: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl ViewTransform {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            pan: Vec2::ZERO,
            scale: 1.0,
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            zoom_step: config.zoom_step,
            fit_margin: config.fit_margin,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Set the scale, clamped to the configured range.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = self.clamp(scale);
    }

    fn clamp(&self, scale: f64) -> f64 {
        if scale.is_finite() {
            scale.clamp(self.min_scale, self.max_scale)
        } else {
            self.scale
        }
    }

    /// Model → screen affine for rendering.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.scale)
    }

    /// Screen → model affine for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.pan)
    }

    pub fn to_model(&self, screen: Point) -> Point {
        self.inverse_transform() * screen
    }

    pub fn to_screen(&self, model: Point) -> Point {
        self.transform() * model
    }

    /// Convert a screen-pixel distance into model units.
    pub fn screen_to_model_dist(&self, pixels: f64) -> f64 {
        pixels / self.scale
    }

    /// Pan by a delta in screen pixels.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Zoom one step toward or away from a screen point, keeping the model
    /// point under it fixed.
    pub fn zoom_at(&mut self, screen_point: Point, direction: ZoomDirection) {
        let factor = match direction {
            ZoomDirection::In => self.zoom_step,
            ZoomDirection::Out => 1.0 / self.zoom_step,
        };
        let new_scale = self.clamp(self.scale * factor);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }

        let model_point = self.to_model(screen_point);
        self.scale = new_scale;

        // Shift pan so model_point lands back on screen_point.
        let new_screen = self.to_screen(model_point);
        self.pan += screen_point - new_screen;
    }

    /// Scale `content` to fill `fit_margin` of the surface and center it.
    /// Degenerate content or surface leaves the transform unchanged.
    pub fn fit_to_content(&mut self, content: Rect, surface: Size) {
        if content.width() <= 0.0 || content.height() <= 0.0 || surface.width <= 0.0 || surface.height <= 0.0 {
            return;
        }
        let scale_x = surface.width / content.width();
        let scale_y = surface.height / content.height();
        self.scale = self.clamp(scale_x.min(scale_y) * self.fit_margin);

        let content_center = content.center();
        let surface_center = Point::new(surface.width / 2.0, surface.height / 2.0);
        self.pan = Vec2::new(
            surface_center.x - content_center.x * self.scale,
            surface_center.y - content_center.y * self.scale,
        );
    }

    pub fn state(&self) -> ViewState {
        ViewState {
            scale: self.scale,
            pan: self.pan,
        }
    }

    pub fn restore(&mut self, state: ViewState) {
        self.scale = self.clamp(state.scale);
        self.pan = state.pan;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_view() {
        let view = ViewTransform::default();
        assert_eq!(view.pan, Vec2::ZERO);
        assert!((view.scale() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_to_model_with_pan_and_scale() {
        let mut view = ViewTransform::default();
        view.pan = Vec2::new(50.0, 100.0);
        view.set_scale(2.0);
        let model = view.to_model(Point::new(150.0, 300.0));
        assert!((model.x - 50.0).abs() < f64::EPSILON);
        assert!((model.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut view = ViewTransform::default();
        view.pan = Vec2::new(30.0, -20.0);
        view.set_scale(1.5);
        let original = Point::new(123.0, 456.0);
        let back = view.to_screen(view.to_model(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_zoom_keeps_pointer_fixed() {
        let mut view = ViewTransform::default();
        let pointer = Point::new(320.0, 240.0);
        let before = view.to_model(pointer);
        view.zoom_at(pointer, ZoomDirection::In);
        let after = view.to_model(pointer);
        assert!((view.scale() - 1.1).abs() < 1e-12);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut view = ViewTransform::default();
        for _ in 0..100 {
            view.zoom_at(Point::ZERO, ZoomDirection::Out);
        }
        assert!((view.scale() - 0.1).abs() < f64::EPSILON);
        for _ in 0..200 {
            view.zoom_at(Point::ZERO, ZoomDirection::In);
        }
        assert!((view.scale() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_to_content_centers() {
        let mut view = ViewTransform::default();
        view.fit_to_content(Rect::new(0.0, 0.0, 1000.0, 500.0), Size::new(500.0, 500.0));
        assert!((view.scale() - 0.45).abs() < 1e-12);
        let center = view.to_screen(Point::new(500.0, 250.0));
        assert!((center.x - 250.0).abs() < 1e-9);
        assert!((center.y - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_to_empty_content_is_noop() {
        let mut view = ViewTransform::default();
        view.fit_to_content(Rect::ZERO, Size::new(500.0, 500.0));
        assert_eq!(view.state(), ViewState::default());
    }
}
