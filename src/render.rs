//! Read-only render snapshot and the drawing interface
//!
//! The scene is built in screen space from the model and viewport, so a
//! drawing backend only has to stroke lines, fill circles, and place text.
//! Dashed edges arrive pre-split into segments.

use crate::config::EdgeStyleConfig;
use crate::geometry::Vec2;
use crate::model::{EdgeStyle, GraphModel, NodeId, NodeKind, RelationKind};
use crate::viewport::Viewport;

/// Zoom below which labels are only drawn for emphasized nodes
pub const LABEL_MIN_ZOOM: f32 = 0.6;

const LABEL_FONT_SIZE: f32 = 12.0;

/// Arrowhead stroke length in screen pixels
const ARROW_LENGTH: f32 = 8.0;

/// Half-angle between the two arrowhead strokes, in radians
const ARROW_SPREAD: f32 = 0.45;

/// A line segment in screen space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Vec2,
    pub to: Vec2,
}

/// Per-node render data
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
    pub id: NodeId,
    pub screen: Vec2,
    /// Radius in screen pixels
    pub radius: f32,
    pub visual_weight: f32,
    pub label: String,
    pub kind: NodeKind,
    /// Selected, hovered, or adjacent to either
    pub highlighted: bool,
    pub show_label: bool,
}

/// Per-edge render data
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeView {
    pub source: Vec2,
    pub target: Vec2,
    /// Target node's screen radius, for arrowhead placement
    pub target_radius: f32,
    pub relation: RelationKind,
    pub style: EdgeStyle,
    /// Dash geometry for dashed styles, empty for solid edges
    pub segments: Vec<Segment>,
    pub highlighted: bool,
}

impl EdgeView {
    /// Arrowhead strokes for directed relations, empty otherwise
    pub fn arrowhead(&self) -> Vec<Segment> {
        if !self.relation.is_directed() {
            return Vec::new();
        }
        arrowhead(self.source, self.target, self.target_radius, ARROW_LENGTH)
    }
}

/// Everything a drawing backend needs for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderScene {
    pub size: Vec2,
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
}

/// Horizontal placement of text relative to its anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Center,
    Start,
}

/// Minimal drawing backend
pub trait DrawSurface {
    fn begin(&mut self, size: Vec2);
    fn line(&mut self, segment: Segment, width: f32, opacity: f32);
    fn circle(&mut self, center: Vec2, radius: f32, opacity: f32, highlighted: bool);
    fn text(&mut self, anchor: Vec2, text: &str, size: f32, align: TextAlign);
    fn finish(&mut self);
}

/// Two strokes of an arrowhead whose tip sits where `from -> to` meets the
/// target circle of radius `target_radius`.
///
/// Nothing is produced when the source lies inside the target circle.
pub fn arrowhead(from: Vec2, to: Vec2, target_radius: f32, length: f32) -> Vec<Segment> {
    let distance = from.distance(to);
    if !(distance.is_finite() && target_radius.is_finite() && length > 0.0)
        || distance <= target_radius.max(0.0)
    {
        return Vec::new();
    }

    let back = (from - to) / distance;
    let tip = to + back * target_radius.max(0.0);
    let angle = back.y.atan2(back.x);
    [angle + ARROW_SPREAD, angle - ARROW_SPREAD]
        .into_iter()
        .map(|a| Segment {
            from: tip,
            to: tip + Vec2::from_angle(a) * length,
        })
        .collect()
}

/// Split the straight line `from -> to` into dashes.
///
/// Produces `floor(length / (dash + gap))` segments of length `dash`,
/// starting at `from` and repeating every `dash + gap`.
pub fn dash_segments(from: Vec2, to: Vec2, dash: f32, gap: f32) -> Vec<Segment> {
    let period = dash + gap;
    let length = from.distance(to);
    if !(dash > 0.0 && gap >= 0.0 && period.is_finite() && length.is_finite()) || length == 0.0 {
        return Vec::new();
    }

    let direction = (to - from) / length;
    let count = (length / period).floor() as usize;
    (0..count)
        .map(|i| {
            let start = from + direction * (i as f32 * period);
            Segment {
                from: start,
                to: start + direction * dash,
            }
        })
        .collect()
}

/// Emphasis applied while building a scene
#[derive(Debug, Clone, Copy, Default)]
pub struct Emphasis<'a> {
    pub selected: Option<&'a NodeId>,
    pub hovered: Option<&'a NodeId>,
}

impl Emphasis<'_> {
    fn focus(&self, id: &NodeId) -> bool {
        self.selected == Some(id) || self.hovered == Some(id)
    }
}

impl RenderScene {
    /// Snapshot the model through the viewport
    pub fn build(
        model: &GraphModel,
        viewport: &Viewport,
        dashes: &EdgeStyleConfig,
        emphasis: Emphasis<'_>,
    ) -> Self {
        let zoom = viewport.zoom_scale;
        let labels_visible = zoom >= LABEL_MIN_ZOOM;

        let mut focused = vec![false; model.len()];
        for (i, node) in model.nodes().iter().enumerate() {
            if emphasis.focus(&node.id) {
                focused[i] = true;
            }
        }
        let mut highlighted = focused.clone();
        for (i, _) in focused.iter().enumerate().filter(|(_, f)| **f) {
            for inc in model.incident(i) {
                highlighted[inc.neighbor] = true;
            }
        }

        let nodes = model
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, node)| NodeView {
                id: node.id.clone(),
                screen: viewport.model_to_screen(node.position),
                radius: node.radius * zoom,
                visual_weight: node.visual_weight,
                label: node.label.clone(),
                kind: node.kind,
                highlighted: highlighted[i],
                show_label: labels_visible || highlighted[i],
            })
            .collect();

        let edges = model
            .edges()
            .iter()
            .filter_map(|edge| {
                let (s, t) = model.endpoints(edge)?;
                let source = viewport.model_to_screen(model.nodes()[s].position);
                let target = viewport.model_to_screen(model.nodes()[t].position);
                let style = edge.relation.style();
                let segments = if style.dashed {
                    dash_segments(source, target, dashes.dash_length, dashes.gap_length)
                } else {
                    Vec::new()
                };
                Some(EdgeView {
                    source,
                    target,
                    target_radius: model.nodes()[t].radius * zoom,
                    relation: edge.relation,
                    style,
                    segments,
                    highlighted: focused[s] || focused[t],
                })
            })
            .collect();

        Self {
            size: viewport.size,
            nodes,
            edges,
        }
    }

    /// Draw edges, then nodes, then labels
    pub fn draw<S: DrawSurface>(&self, surface: &mut S) {
        surface.begin(self.size);

        for edge in &self.edges {
            let opacity = if edge.highlighted {
                1.0
            } else {
                edge.style.opacity
            };
            if edge.style.dashed {
                for segment in &edge.segments {
                    surface.line(*segment, edge.style.width, opacity);
                }
            } else {
                surface.line(
                    Segment {
                        from: edge.source,
                        to: edge.target,
                    },
                    edge.style.width,
                    opacity,
                );
            }
            for segment in edge.arrowhead() {
                surface.line(segment, edge.style.width, opacity);
            }
        }

        for node in &self.nodes {
            surface.circle(node.screen, node.radius, node.visual_weight, node.highlighted);
            surface.text(node.screen, node.kind.glyph(), node.radius, TextAlign::Center);
        }

        for node in self.nodes.iter().filter(|n| n.show_label) {
            let anchor = node.screen + Vec2::new(node.radius + 4.0, 0.0);
            surface.text(anchor, &node.label, LABEL_FONT_SIZE, TextAlign::Start);
        }

        surface.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GraphConfig, NodeStyleConfig};
    use crate::model::{EdgeInput, NodeInput, Placement};

    #[derive(Default)]
    struct Recorder {
        lines: usize,
        circles: usize,
        texts: Vec<String>,
        finished: bool,
    }

    impl DrawSurface for Recorder {
        fn begin(&mut self, _size: Vec2) {}
        fn line(&mut self, _segment: Segment, _width: f32, _opacity: f32) {
            self.lines += 1;
        }
        fn circle(&mut self, _center: Vec2, _radius: f32, _opacity: f32, _highlighted: bool) {
            self.circles += 1;
        }
        fn text(&mut self, _anchor: Vec2, text: &str, _size: f32, _align: TextAlign) {
            self.texts.push(text.to_string());
        }
        fn finish(&mut self) {
            self.finished = true;
        }
    }

    fn model() -> GraphModel {
        let nodes = [
            NodeInput::new("a", "Alpha", NodeKind::Note, 0.0),
            NodeInput::new("b", "Beta", NodeKind::Article, 1.0),
            NodeInput::new("c", "Gamma", NodeKind::Highlight, 0.5),
        ];
        let edges = [
            EdgeInput::new("a", "b", RelationKind::Link),
            EdgeInput::new("b", "c", RelationKind::Related),
        ];
        let mut model = GraphModel::load(
            &nodes,
            &edges,
            &NodeStyleConfig::default(),
            &Placement::new(Vec2::ZERO, &GraphConfig::default().placement),
        );
        model.set_position(&NodeId::from("a"), Vec2::new(0.0, 0.0));
        model.set_position(&NodeId::from("b"), Vec2::new(100.0, 0.0));
        model.set_position(&NodeId::from("c"), Vec2::new(100.0, 100.0));
        model
    }

    #[test]
    fn dash_count_follows_floor_of_length_over_period() {
        let dashes = dash_segments(Vec2::ZERO, Vec2::new(100.0, 0.0), 6.0, 4.0);
        assert_eq!(dashes.len(), 10);
        assert_eq!(dashes[0].from, Vec2::ZERO);
        assert_eq!(dashes[0].to, Vec2::new(6.0, 0.0));
        assert_eq!(dashes[1].from, Vec2::new(10.0, 0.0));

        let dashes = dash_segments(Vec2::ZERO, Vec2::new(0.0, 25.0), 6.0, 4.0);
        assert_eq!(dashes.len(), 2);
        assert!((dashes[1].to.y - 16.0).abs() < 1e-4);
    }

    #[test]
    fn degenerate_dash_input_yields_nothing() {
        assert!(dash_segments(Vec2::ZERO, Vec2::ZERO, 6.0, 4.0).is_empty());
        assert!(dash_segments(Vec2::ZERO, Vec2::new(5.0, 0.0), 6.0, 4.0).is_empty());
        assert!(dash_segments(Vec2::ZERO, Vec2::new(50.0, 0.0), 0.0, 4.0).is_empty());
        assert!(dash_segments(Vec2::ZERO, Vec2::new(50.0, 0.0), f32::NAN, 4.0).is_empty());
    }

    #[test]
    fn scene_maps_through_viewport() {
        let model = model();
        let mut vp = Viewport::default();
        vp.pan_offset = Vec2::new(-10.0, -20.0);
        vp.zoom_scale = 2.0;

        let scene = RenderScene::build(&model, &vp, &EdgeStyleConfig::default(), Emphasis::default());

        assert_eq!(scene.nodes.len(), 3);
        assert_eq!(scene.nodes[1].screen, Vec2::new(220.0, 40.0));
        assert_eq!(scene.nodes[1].radius, 36.0);
        assert_eq!(scene.edges[0].source, Vec2::new(20.0, 40.0));
        assert!(scene.edges[0].segments.is_empty());
        // 200px dashed edge at the default 6/4 pattern
        assert_eq!(scene.edges[1].segments.len(), 20);
        assert!(scene.nodes.iter().all(|n| n.show_label));
    }

    #[test]
    fn emphasis_highlights_neighbors() {
        let model = model();
        let vp = Viewport::default();
        let selected = NodeId::from("a");
        let scene = RenderScene::build(
            &model,
            &vp,
            &EdgeStyleConfig::default(),
            Emphasis {
                selected: Some(&selected),
                hovered: None,
            },
        );

        let flags: Vec<bool> = scene.nodes.iter().map(|n| n.highlighted).collect();
        assert_eq!(flags, [true, true, false]);
        assert!(scene.edges[0].highlighted);
        assert!(!scene.edges[1].highlighted);
    }

    #[test]
    fn labels_hidden_when_zoomed_out() {
        let model = model();
        let mut vp = Viewport::default();
        vp.zoom(-0.8);
        let hovered = NodeId::from("c");
        let scene = RenderScene::build(
            &model,
            &vp,
            &EdgeStyleConfig::default(),
            Emphasis {
                selected: None,
                hovered: Some(&hovered),
            },
        );

        let shown: Vec<&str> = scene
            .nodes
            .iter()
            .filter(|n| n.show_label)
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(shown, ["b", "c"]);
    }

    #[test]
    fn arrowhead_tip_touches_target_circle() {
        let strokes = arrowhead(Vec2::ZERO, Vec2::new(100.0, 0.0), 18.0, 8.0);
        assert_eq!(strokes.len(), 2);
        for stroke in &strokes {
            assert_eq!(stroke.from, Vec2::new(82.0, 0.0));
            assert!((stroke.from.distance(stroke.to) - 8.0).abs() < 1e-4);
            // strokes point back toward the source
            assert!(stroke.to.x < stroke.from.x);
        }
        assert!((strokes[0].to.y + strokes[1].to.y).abs() < 1e-4);
    }

    #[test]
    fn no_arrowhead_inside_target_or_for_undirected() {
        assert!(arrowhead(Vec2::ZERO, Vec2::new(10.0, 0.0), 18.0, 8.0).is_empty());
        assert!(arrowhead(Vec2::ZERO, Vec2::ZERO, 0.0, 8.0).is_empty());

        let scene = RenderScene::build(
            &model(),
            &Viewport::default(),
            &EdgeStyleConfig::default(),
            Emphasis::default(),
        );
        assert_eq!(scene.edges[0].arrowhead().len(), 2);
        assert_eq!(scene.edges[0].arrowhead()[0].from, Vec2::new(82.0, 0.0));
        assert!(scene.edges[1].arrowhead().is_empty());
    }

    #[test]
    fn draw_walks_edges_then_nodes() {
        let model = model();
        let vp = Viewport::default();
        let scene = RenderScene::build(&model, &vp, &EdgeStyleConfig::default(), Emphasis::default());
        let mut recorder = Recorder::default();

        scene.draw(&mut recorder);

        // solid link + its two arrowhead strokes, then 10 dashes for the
        // undirected 100px edge
        assert_eq!(recorder.lines, 1 + 2 + 10);
        assert_eq!(recorder.circles, 3);
        assert_eq!(recorder.texts, ["N", "A", "H", "Alpha", "Beta", "Gamma"]);
        assert!(recorder.finished);
    }
}
