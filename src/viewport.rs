//! Camera state for mapping model coordinates to the screen
//!
//! `screen = (model - pan_offset) * zoom_scale`. The renderer and the
//! pointer hit testing both go through this one mapping.

use crate::config::ViewportConfig;
use crate::geometry::{BoundingBox, Vec2};

/// Pan and zoom of the graph canvas
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Model point shown at the screen origin
    pub pan_offset: Vec2,
    /// Screen pixels per model unit
    pub zoom_scale: f32,
    /// Canvas size in screen pixels
    pub size: Vec2,
    min_zoom: f32,
    max_zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(&ViewportConfig::default())
    }
}

impl Viewport {
    pub fn new(config: &ViewportConfig) -> Self {
        let min_zoom = config.min_zoom.min(config.max_zoom);
        Self {
            pan_offset: Vec2::ZERO,
            zoom_scale: 1.0_f32.clamp(min_zoom, config.max_zoom.max(min_zoom)),
            size: Vec2::new(config.width, config.height),
            min_zoom,
            max_zoom: config.max_zoom.max(min_zoom),
        }
    }

    pub fn zoom_bounds(&self) -> (f32, f32) {
        (self.min_zoom, self.max_zoom)
    }

    pub fn model_to_screen(&self, point: Vec2) -> Vec2 {
        (point - self.pan_offset) * self.zoom_scale
    }

    pub fn screen_to_model(&self, point: Vec2) -> Vec2 {
        point / self.zoom_scale + self.pan_offset
    }

    /// Model point currently shown at the middle of the canvas
    pub fn center(&self) -> Vec2 {
        self.screen_to_model(self.size * 0.5)
    }

    /// Change zoom by an additive delta, clamped to the zoom bounds.
    ///
    /// Infinite deltas clamp like any other; NaN is ignored.
    pub fn zoom(&mut self, delta: f32) {
        if delta.is_nan() {
            return;
        }
        self.zoom_scale = (self.zoom_scale + delta).clamp(self.min_zoom, self.max_zoom);
    }

    /// Zoom while keeping the model point under `anchor` fixed on screen
    pub fn zoom_at(&mut self, delta: f32, anchor: Vec2) {
        if !anchor.is_finite() {
            self.zoom(delta);
            return;
        }
        let pinned = self.screen_to_model(anchor);
        self.zoom(delta);
        self.pan_offset = pinned - anchor / self.zoom_scale;
    }

    /// Shift the pan offset by a model-space delta (unbounded)
    pub fn pan(&mut self, delta: Vec2) {
        if delta.is_finite() {
            self.pan_offset += delta;
        }
    }

    pub fn reset(&mut self) {
        self.pan_offset = Vec2::ZERO;
        self.zoom_scale = 1.0_f32.clamp(self.min_zoom, self.max_zoom);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        if width.is_finite() && height.is_finite() {
            self.size = Vec2::new(width.max(0.0), height.max(0.0));
        }
    }

    /// Zoom and pan so `bounds` fills the canvas, leaving `padding` pixels
    pub fn fit_to_bounds(&mut self, bounds: &BoundingBox, padding: f32) {
        if bounds.is_empty() {
            return;
        }

        let available = Vec2::new(
            (self.size.x - 2.0 * padding).max(1.0),
            (self.size.y - 2.0 * padding).max(1.0),
        );
        let scale = (available.x / bounds.width()).min(available.y / bounds.height());
        self.zoom_scale = scale.clamp(self.min_zoom, self.max_zoom);
        self.pan_offset = bounds.center() - self.size * (0.5 / self.zoom_scale);
    }
}
