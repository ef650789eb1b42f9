//! SVG drawing backend
//!
//! Records draw calls into three layers (edges, node circles, text) and
//! renders them through an askama template.

use askama::Template;

use crate::geometry::Vec2;
use crate::render::{DrawSurface, RenderScene, Segment, TextAlign};

#[derive(Debug, Clone)]
pub struct SvgLine {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub width: f32,
    pub opacity: f32,
}

#[derive(Debug, Clone)]
pub struct SvgCircle {
    pub cx: f32,
    pub cy: f32,
    pub r: f32,
    pub opacity: f32,
    pub stroke: &'static str,
}

#[derive(Debug, Clone)]
pub struct SvgText {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub anchor: &'static str,
    pub content: String,
}

#[derive(Template)]
#[template(path = "graph.svg", escape = "html")]
struct SvgDocument<'a> {
    width: f32,
    height: f32,
    lines: &'a [SvgLine],
    circles: &'a [SvgCircle],
    texts: &'a [SvgText],
}

/// A `DrawSurface` that produces a standalone SVG document
#[derive(Debug, Clone, Default)]
pub struct SvgSurface {
    size: Vec2,
    lines: Vec<SvgLine>,
    circles: Vec<SvgCircle>,
    texts: Vec<SvgText>,
}

impl SvgSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render everything drawn so far
    pub fn render(&self) -> Result<String, askama::Error> {
        SvgDocument {
            width: self.size.x,
            height: self.size.y,
            lines: &self.lines,
            circles: &self.circles,
            texts: &self.texts,
        }
        .render()
    }
}

impl DrawSurface for SvgSurface {
    fn begin(&mut self, size: Vec2) {
        self.size = size;
        self.lines.clear();
        self.circles.clear();
        self.texts.clear();
    }

    fn line(&mut self, segment: Segment, width: f32, opacity: f32) {
        self.lines.push(SvgLine {
            x1: segment.from.x,
            y1: segment.from.y,
            x2: segment.to.x,
            y2: segment.to.y,
            width,
            opacity,
        });
    }

    fn circle(&mut self, center: Vec2, radius: f32, opacity: f32, highlighted: bool) {
        self.circles.push(SvgCircle {
            cx: center.x,
            cy: center.y,
            r: radius,
            opacity,
            stroke: if highlighted { "#ffffff" } else { "none" },
        });
    }

    fn text(&mut self, anchor: Vec2, text: &str, size: f32, align: TextAlign) {
        self.texts.push(SvgText {
            x: anchor.x,
            y: anchor.y,
            size,
            anchor: match align {
                TextAlign::Center => "middle",
                TextAlign::Start => "start",
            },
            content: text.to_string(),
        });
    }

    fn finish(&mut self) {}
}

/// Draw a scene onto a fresh SVG surface and render it
pub fn render_svg(scene: &RenderScene) -> Result<String, askama::Error> {
    let mut surface = SvgSurface::new();
    scene.draw(&mut surface);
    surface.render()
}
