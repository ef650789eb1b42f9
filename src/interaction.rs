//! Pointer input: hit testing, node dragging, panning, and zoom
//!
//! The controller borrows the model and viewport for the duration of one
//! event and keeps only the gesture in progress between events.

use tracing::debug;

use crate::config::InteractionConfig;
use crate::geometry::Vec2;
use crate::model::{GraphModel, NodeId};
use crate::viewport::Viewport;

/// Result of a completed (or ignored) pointer gesture
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    /// Nothing the host needs to react to
    None,
    /// Press and release on a node without dragging
    Selected(NodeId),
    /// A node drag ended; the layout should resettle around it
    DragReleased(NodeId),
    /// Press and release on empty canvas without dragging
    CanvasClicked,
    /// A canvas drag ended
    Panned,
}

#[derive(Debug, Clone, PartialEq)]
enum Gesture {
    Idle,
    /// Pointer went down on a node, which now holds the pin lock
    Node {
        id: NodeId,
        origin: Vec2,
        /// Velocity the node had before pinning, restored on a plain click
        velocity: Vec2,
        dragging: bool,
    },
    /// Pointer went down on empty canvas
    Canvas {
        origin: Vec2,
        last: Vec2,
        dragging: bool,
    },
}

/// First node (in render order) whose circle, grown by `tolerance`,
/// contains `point`
pub fn hit_test(model: &GraphModel, point: Vec2, tolerance: f32) -> Option<NodeId> {
    model
        .nodes()
        .iter()
        .find(|node| node.position.distance(point) <= node.radius + tolerance)
        .map(|node| node.id.clone())
}

/// Translates raw pointer events into model and viewport changes
#[derive(Debug, Clone)]
pub struct InteractionController {
    pub config: InteractionConfig,
    gesture: Gesture,
    hovered: Option<NodeId>,
}

impl InteractionController {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            gesture: Gesture::Idle,
            hovered: None,
        }
    }

    /// Node under the pointer while no button is held
    pub fn hovered(&self) -> Option<&NodeId> {
        self.hovered.as_ref()
    }

    /// Node currently being pressed or dragged
    pub fn active_node(&self) -> Option<&NodeId> {
        match &self.gesture {
            Gesture::Node { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(
            self.gesture,
            Gesture::Node { dragging: true, .. } | Gesture::Canvas { dragging: true, .. }
        )
    }

    pub fn pointer_down(&mut self, screen: Vec2, model: &mut GraphModel, viewport: &Viewport) {
        if !screen.is_finite() {
            return;
        }
        self.cancel(model);

        let point = viewport.screen_to_model(screen);
        let pressed = hit_test(model, point, self.config.hit_tolerance)
            .and_then(|id| model.pin(&id).map(|velocity| (id, velocity)));

        self.gesture = match pressed {
            Some((id, velocity)) => {
                debug!(%id, "node pressed");
                Gesture::Node {
                    id,
                    origin: screen,
                    velocity,
                    dragging: false,
                }
            }
            None => Gesture::Canvas {
                origin: screen,
                last: screen,
                dragging: false,
            },
        };
    }

    pub fn pointer_move(&mut self, screen: Vec2, model: &mut GraphModel, viewport: &mut Viewport) {
        if !screen.is_finite() {
            return;
        }
        let threshold = self.config.click_threshold;

        match &mut self.gesture {
            Gesture::Idle => {
                let point = viewport.screen_to_model(screen);
                self.hovered = hit_test(model, point, self.config.hit_tolerance);
            }
            Gesture::Node {
                id,
                origin,
                dragging,
                ..
            } => {
                if !*dragging && screen.distance(*origin) > threshold {
                    *dragging = true;
                }
                if *dragging {
                    model.set_position(id, viewport.screen_to_model(screen));
                }
            }
            Gesture::Canvas {
                origin,
                last,
                dragging,
            } => {
                if !*dragging && screen.distance(*origin) > threshold {
                    *dragging = true;
                }
                // Below the threshold `last` stays at the origin, so the
                // first real pan covers the whole distance. Content follows
                // the pointer.
                if *dragging {
                    viewport.pan(-(screen - *last) / viewport.zoom_scale);
                    *last = screen;
                }
            }
        }
    }

    pub fn pointer_up(&mut self, screen: Vec2, model: &mut GraphModel, viewport: &mut Viewport) -> InteractionOutcome {
        if screen.is_finite() {
            self.pointer_move(screen, model, viewport);
        }

        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Idle => InteractionOutcome::None,
            Gesture::Node {
                id,
                velocity,
                dragging,
                ..
            } => {
                model.unpin();
                if dragging {
                    model.anchor(&id);
                    debug!(%id, "node dropped");
                    InteractionOutcome::DragReleased(id)
                } else {
                    model.set_velocity(&id, velocity);
                    InteractionOutcome::Selected(id)
                }
            }
            Gesture::Canvas { dragging, .. } => {
                if dragging {
                    InteractionOutcome::Panned
                } else {
                    InteractionOutcome::CanvasClicked
                }
            }
        }
    }

    /// Abandon the gesture in progress, releasing any pin without an outcome
    pub fn cancel(&mut self, model: &mut GraphModel) {
        if let Gesture::Node { id, velocity, dragging, .. } =
            std::mem::replace(&mut self.gesture, Gesture::Idle)
        {
            model.unpin();
            if !dragging {
                model.set_velocity(&id, velocity);
            }
        }
    }

    /// Forget gesture state that referred to a discarded model
    pub fn clear(&mut self) {
        self.gesture = Gesture::Idle;
        self.hovered = None;
    }

    /// Scroll-wheel zoom around the pointer
    pub fn scroll(&mut self, delta: f32, anchor: Vec2, viewport: &mut Viewport) {
        viewport.zoom_at(delta * self.config.zoom_sensitivity, anchor);
    }

    /// Pinch zoom: `scale` is the gesture's relative magnification
    pub fn pinch(&mut self, scale: f32, anchor: Vec2, viewport: &mut Viewport) {
        viewport.zoom_at(viewport.zoom_scale * (scale - 1.0), anchor);
    }
}
