//! Composition root for one graph view
//!
//! Owns the model exclusively. The layout engine and the interaction
//! controller borrow it for one call at a time. The host drives `tick`
//! once per frame and forwards pointer events; the only thing that flows
//! back out is the node-selected callback.

use std::fmt;

use tracing::info;

use crate::config::GraphConfig;
use crate::geometry::Vec2;
use crate::interaction::{InteractionController, InteractionOutcome};
use crate::layout::{LayoutDelta, LayoutEngine};
use crate::model::{EdgeInput, GraphModel, NodeId, NodeInput, Placement};
use crate::render::{Emphasis, RenderScene};
use crate::viewport::Viewport;

type SelectionCallback = Box<dyn FnMut(&NodeId)>;

pub struct GraphCoordinator {
    config: GraphConfig,
    model: GraphModel,
    engine: LayoutEngine,
    viewport: Viewport,
    interaction: InteractionController,
    selected: Option<NodeId>,
    on_node_selected: Option<SelectionCallback>,
    /// Last collaborator payload, kept so `reset` can rebuild from it
    source: (Vec<NodeInput>, Vec<EdgeInput>),
}

impl fmt::Debug for GraphCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphCoordinator")
            .field("nodes", &self.model.len())
            .field("edges", &self.model.edges().len())
            .field("step_count", &self.engine.step_count())
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

impl Default for GraphCoordinator {
    fn default() -> Self {
        Self::new(GraphConfig::default())
    }
}

impl GraphCoordinator {
    pub fn new(config: GraphConfig) -> Self {
        let viewport = Viewport::new(&config.viewport);
        let engine = LayoutEngine::new(config.layout.clone(), viewport.center());
        let interaction = InteractionController::new(config.interaction.clone());
        Self {
            config,
            model: GraphModel::default(),
            engine,
            viewport,
            interaction,
            selected: None,
            on_node_selected: None,
            source: (Vec::new(), Vec::new()),
        }
    }

    /// Register the host's selection handler
    pub fn on_node_selected(&mut self, callback: impl FnMut(&NodeId) + 'static) {
        self.on_node_selected = Some(Box::new(callback));
    }

    /// Replace the graph with fresh collaborator data.
    ///
    /// All simulation state, including any drag in progress, is discarded.
    pub fn rebuild(&mut self, nodes: Vec<NodeInput>, edges: Vec<EdgeInput>) {
        self.interaction.clear();

        let center = self.viewport.center();
        let placement = Placement::new(center, &self.config.placement);
        self.model = GraphModel::load(&nodes, &edges, &self.config.style, &placement);
        self.engine.center = center;
        self.engine.reset();

        if let Some(id) = &self.selected {
            if self.model.node(id).is_none() {
                self.selected = None;
            }
        }
        self.source = (nodes, edges);

        info!(
            nodes = self.model.len(),
            edges = self.model.edges().len(),
            "graph rebuilt"
        );
    }

    /// Rebuild from the last payload, restarting the layout from scratch
    pub fn reset(&mut self) {
        let (nodes, edges) = std::mem::take(&mut self.source);
        self.rebuild(nodes, edges);
    }

    /// Advance the layout by one frame
    pub fn tick(&mut self, dt: f32) -> LayoutDelta {
        self.engine.step(&mut self.model, dt)
    }

    /// Tick until the layout settles, at most `max_ticks` times
    pub fn run_until_settled(&mut self, max_ticks: usize) -> usize {
        let ticks = self.engine.run_to_settled(&mut self.model, max_ticks);
        info!(ticks, "layout settled");
        ticks
    }

    pub fn is_settled(&self) -> bool {
        self.model.is_empty() || self.engine.is_settled()
    }

    pub fn pointer_down(&mut self, screen: Vec2) {
        self.interaction
            .pointer_down(screen, &mut self.model, &self.viewport);
    }

    pub fn pointer_move(&mut self, screen: Vec2) {
        self.interaction
            .pointer_move(screen, &mut self.model, &mut self.viewport);
    }

    pub fn pointer_up(&mut self, screen: Vec2) -> InteractionOutcome {
        let outcome = self
            .interaction
            .pointer_up(screen, &mut self.model, &mut self.viewport);

        match &outcome {
            InteractionOutcome::Selected(id) => {
                self.selected = Some(id.clone());
                if let Some(callback) = self.on_node_selected.as_mut() {
                    callback(id);
                }
            }
            InteractionOutcome::DragReleased(_) => self.engine.settle_after_release(),
            InteractionOutcome::CanvasClicked
            | InteractionOutcome::Panned
            | InteractionOutcome::None => {}
        }
        outcome
    }

    pub fn scroll(&mut self, delta: f32, anchor: Vec2) {
        self.interaction.scroll(delta, anchor, &mut self.viewport);
    }

    pub fn pinch(&mut self, scale: f32, anchor: Vec2) {
        self.interaction.pinch(scale, anchor, &mut self.viewport);
    }

    /// Canvas resize; the layout center stays where it was until the next rebuild
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport.resize(width, height);
    }

    /// Frame the whole graph, leaving `padding` pixels at the edges
    pub fn fit_to_content(&mut self, padding: f32) {
        self.viewport.fit_to_bounds(&self.model.bounds(), padding);
    }

    /// Snapshot for the renderer
    pub fn scene(&self) -> RenderScene {
        RenderScene::build(
            &self.model,
            &self.viewport,
            &self.config.edges,
            Emphasis {
                selected: self.selected.as_ref(),
                hovered: self.interaction.hovered(),
            },
        )
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    pub fn selected(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::layout::FRAME_TIME;
    use crate::model::{NodeKind, RelationKind};

    fn nodes() -> Vec<NodeInput> {
        vec![
            NodeInput::new("a", "Alpha", NodeKind::Note, 0.2),
            NodeInput::new("b", "Beta", NodeKind::Article, 0.8),
            NodeInput::new("c", "Gamma", NodeKind::Highlight, 0.5),
        ]
    }

    fn edges() -> Vec<EdgeInput> {
        vec![
            EdgeInput::new("a", "b", RelationKind::Link),
            EdgeInput::new("b", "c", RelationKind::Related),
            EdgeInput::new("c", "ghost", RelationKind::SharedTag),
        ]
    }

    fn coordinator() -> GraphCoordinator {
        let mut graph = GraphCoordinator::default();
        graph.rebuild(nodes(), edges());
        graph
    }

    fn screen_of(graph: &GraphCoordinator, id: &str) -> Vec2 {
        let node = graph.model().node(&NodeId::from(id)).unwrap();
        graph.viewport().model_to_screen(node.position)
    }

    fn record_selections(graph: &mut GraphCoordinator) -> Rc<RefCell<Vec<NodeId>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        graph.on_node_selected(move |id| sink.borrow_mut().push(id.clone()));
        seen
    }

    #[test]
    fn rebuild_filters_dangling_edges() {
        let graph = coordinator();
        assert_eq!(graph.model().len(), 3);
        assert_eq!(graph.model().edges().len(), 2);
        assert!(!graph.is_settled());
    }

    #[test]
    fn empty_graph_is_trivially_settled() {
        let mut graph = GraphCoordinator::default();
        graph.rebuild(Vec::new(), Vec::new());
        assert!(graph.is_settled());
        assert!(!graph.tick(FRAME_TIME).advanced);
        assert!(graph.scene().nodes.is_empty());
    }

    #[test]
    fn ticks_until_cap() {
        let mut graph = coordinator();
        let ticks = graph.run_until_settled(10_000);
        assert!(ticks <= graph.config().layout.step_cap as usize);
        assert!(graph.is_settled());
        assert!(!graph.tick(FRAME_TIME).advanced);
    }

    #[test]
    fn click_fires_callback_once() {
        let mut graph = coordinator();
        graph.run_until_settled(1000);
        let seen = record_selections(&mut graph);
        let before = graph.model().node(&NodeId::from("b")).unwrap().position;

        let at = screen_of(&graph, "b");
        graph.pointer_down(at);
        let outcome = graph.pointer_up(at);

        assert_eq!(outcome, InteractionOutcome::Selected(NodeId::from("b")));
        assert_eq!(*seen.borrow(), vec![NodeId::from("b")]);
        assert_eq!(graph.selected(), Some(&NodeId::from("b")));
        assert_eq!(graph.model().node(&NodeId::from("b")).unwrap().position, before);
        assert!(graph.engine().is_settled());
    }

    #[test]
    fn drag_and_pan_do_not_select() {
        let mut graph = coordinator();
        graph.run_until_settled(1000);
        let seen = record_selections(&mut graph);

        let at = screen_of(&graph, "a");
        graph.pointer_down(at);
        graph.pointer_move(at + Vec2::new(50.0, 0.0));
        let outcome = graph.pointer_up(at + Vec2::new(80.0, 10.0));
        assert_eq!(outcome, InteractionOutcome::DragReleased(NodeId::from("a")));

        graph.pointer_down(Vec2::new(5.0, 5.0));
        graph.pointer_move(Vec2::new(40.0, 40.0));
        assert_eq!(graph.pointer_up(Vec2::new(40.0, 40.0)), InteractionOutcome::Panned);

        assert!(seen.borrow().is_empty());
        assert_eq!(graph.selected(), None);
    }

    #[test]
    fn drag_release_resettles_neighbors_only() {
        let mut graph = coordinator();
        graph.run_until_settled(1000);

        let at = screen_of(&graph, "a");
        let drop = at + Vec2::new(-150.0, -120.0);
        graph.pointer_down(at);
        graph.pointer_move(drop);
        graph.pointer_up(drop);

        let dropped = graph.viewport().screen_to_model(drop);
        let neighbor_before = graph.model().node(&NodeId::from("b")).unwrap().position;
        assert!(!graph.is_settled());

        let window = graph.config().layout.settle_window;
        for _ in 0..window {
            graph.tick(FRAME_TIME);
            assert_eq!(graph.model().node(&NodeId::from("a")).unwrap().position, dropped);
        }
        let neighbor_after = graph.model().node(&NodeId::from("b")).unwrap().position;
        assert!(neighbor_after.distance(neighbor_before) > 1.0);
        assert!(graph.is_settled());
    }

    #[test]
    fn rebuild_restarts_settled_layout() {
        let mut graph = coordinator();
        graph.run_until_settled(1000);
        assert!(graph.is_settled());
        assert!(graph.engine().step_count() > 0);

        graph.rebuild(nodes(), edges());
        assert_eq!(graph.engine().step_count(), 0);
        assert!(!graph.is_settled());
        assert!(graph.tick(FRAME_TIME).advanced);
    }

    #[test]
    fn zero_dt_first_frame_does_not_freeze_layout() {
        let mut graph = coordinator();
        let start: Vec<Vec2> = graph.model().nodes().iter().map(|n| n.position).collect();

        assert!(!graph.tick(0.0).advanced);
        assert!(!graph.is_settled());
        for _ in 0..100 {
            graph.tick(FRAME_TIME);
        }

        let moved = graph
            .model()
            .nodes()
            .iter()
            .zip(&start)
            .any(|(node, old)| node.position.distance(*old) > 1e-3);
        assert!(moved);
    }

    #[test]
    fn rebuild_discards_drag_in_progress() {
        let mut graph = coordinator();
        let at = screen_of(&graph, "a");
        graph.pointer_down(at);
        assert!(graph.model().pinned().is_some());

        graph.rebuild(nodes(), edges());
        assert_eq!(graph.model().pinned(), None);
        assert_eq!(graph.engine().step_count(), 0);
        assert_eq!(graph.pointer_up(at), InteractionOutcome::None);
    }

    #[test]
    fn rebuild_is_reproducible_and_drops_stale_selection() {
        let mut graph = coordinator();
        let first: Vec<Vec2> = graph.model().nodes().iter().map(|n| n.position).collect();
        graph.run_until_settled(1000);

        let at = screen_of(&graph, "c");
        graph.pointer_down(at);
        graph.pointer_up(at);
        assert_eq!(graph.selected(), Some(&NodeId::from("c")));

        graph.reset();
        let again: Vec<Vec2> = graph.model().nodes().iter().map(|n| n.position).collect();
        assert_eq!(first, again);
        assert_eq!(graph.selected(), Some(&NodeId::from("c")));

        graph.rebuild(nodes()[..2].to_vec(), edges());
        assert_eq!(graph.selected(), None);
    }

    #[test]
    fn scroll_zoom_clamped_and_scene_follows() {
        let mut graph = coordinator();
        for _ in 0..10 {
            graph.scroll(1.0e6, Vec2::new(400.0, 300.0));
        }
        assert_eq!(graph.viewport().zoom_scale, 3.0);

        let scene = graph.scene();
        let a = graph.model().node(&NodeId::from("a")).unwrap();
        assert_eq!(scene.nodes[0].radius, a.radius * 3.0);
    }

    #[test]
    fn resize_keeps_layout_center_until_rebuild() {
        let mut graph = coordinator();
        let center = graph.engine().center;

        graph.resize(1200.0, 900.0);
        assert_eq!(graph.viewport().size, Vec2::new(1200.0, 900.0));
        assert_eq!(graph.engine().center, center);

        graph.reset();
        assert_eq!(graph.engine().center, Vec2::new(600.0, 450.0));
    }

    #[test]
    fn fit_to_content_frames_all_nodes() {
        let mut graph = coordinator();
        graph.run_until_settled(1000);
        graph.fit_to_content(20.0);

        let size = graph.viewport().size;
        for node in graph.scene().nodes {
            assert!(node.screen.x >= 0.0 && node.screen.x <= size.x);
            assert!(node.screen.y >= 0.0 && node.screen.y <= size.y);
        }
    }
}
