//! Force-directed layout engine
//!
//! Each step computes every node's force from one position snapshot, then
//! integrates all of them. Three forces act on each mobile node:
//!
//! - **Repulsion**: every other node pushes with `repulsion / max(d², 1)`
//! - **Spring**: each incident edge pulls with `(d - rest_length) * spring_strength`
//! - **Center gravity**: a weak pull toward the layout center
//!
//! Velocity is damped every step and the engine freezes after a fixed
//! number of steps, or earlier once every node has slowed to a crawl.

use std::f32::consts::PI;

use tracing::{debug, trace};

use crate::config::LayoutConfig;
use crate::geometry::Vec2;
use crate::model::GraphModel;

/// Nominal frame duration; a `dt` of this length advances exactly one unit step
pub const FRAME_TIME: f32 = 1.0 / 60.0;

/// Squared distances below this count as coincident
const COINCIDENT_EPSILON: f32 = 1e-6;

/// Floor for squared distance in the repulsion denominator
const MIN_DISTANCE_SQ: f32 = 1.0;

const GOLDEN_ANGLE: f32 = PI * 0.763_932;

/// Per-node force for one step, indexed like `GraphModel::nodes`
#[derive(Debug, Clone, PartialEq)]
pub struct ForceField {
    pub forces: Vec<Vec2>,
}

/// What a single step did to the model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutDelta {
    /// Position change per node, indexed like `GraphModel::nodes`
    pub displacements: Vec<Vec2>,
    pub max_displacement: f32,
    /// False when the step was skipped (settled or empty graph)
    pub advanced: bool,
}

impl LayoutDelta {
    fn idle() -> Self {
        Self::default()
    }
}

/// CPU force simulation with a step-capped settling policy
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    pub config: LayoutConfig,
    /// Point the center force pulls toward
    pub center: Vec2,
    step_count: u32,
    /// Set once the fastest node drops below `stop_speed`
    at_rest: bool,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig, center: Vec2) -> Self {
        Self {
            config,
            center,
            step_count: 0,
            at_rest: false,
        }
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    /// True once the step cap is reached or all motion has died down
    pub fn is_settled(&self) -> bool {
        self.at_rest || self.step_count >= self.config.step_cap
    }

    /// Start a new layout session (after a rebuild)
    pub fn reset(&mut self) {
        self.step_count = 0;
        self.at_rest = false;
    }

    /// Replay the last `settle_window` steps so neighbors adjust to a
    /// freshly dropped node before the layout freezes again
    pub fn settle_after_release(&mut self) {
        self.step_count = self
            .config
            .step_cap
            .saturating_sub(self.config.settle_window);
        self.at_rest = false;
        debug!(step_count = self.step_count, "resettling after drag release");
    }

    /// Advance the simulation by one step.
    ///
    /// Does nothing once settled, when the model is empty, or when `dt`
    /// covers no time at all (zero, negative or non-finite). Such a frame
    /// neither counts toward the step cap nor puts the layout to rest.
    pub fn step(&mut self, model: &mut GraphModel, dt: f32) -> LayoutDelta {
        if model.is_empty() || self.is_settled() {
            return LayoutDelta::idle();
        }
        if time_scale(dt, self.config.max_time_scale) <= 0.0 {
            trace!(dt, "skipping zero-length frame");
            return LayoutDelta::idle();
        }

        let field = self.compute_forces(model);
        let delta = self.apply(model, &field, dt);
        self.step_count += 1;

        let fastest = model
            .nodes()
            .iter()
            .map(|n| n.velocity.length())
            .fold(0.0_f32, f32::max);
        if fastest < self.config.stop_speed {
            self.at_rest = true;
        }

        trace!(
            step = self.step_count,
            max_displacement = delta.max_displacement,
            "layout step"
        );
        if self.is_settled() {
            debug!(steps = self.step_count, "layout settled");
        }
        delta
    }

    /// Run steps until settled or `max_steps` have been taken.
    ///
    /// Returns the number of steps that advanced the layout.
    pub fn run_to_settled(&mut self, model: &mut GraphModel, max_steps: usize) -> usize {
        let mut steps = 0;
        for _ in 0..max_steps {
            if !self.step(model, FRAME_TIME).advanced {
                break;
            }
            steps += 1;
        }
        steps
    }

    /// Forces on every node from the current positions.
    ///
    /// Pure: the model is not touched, so calling this twice yields the
    /// same field. Pinned and anchored nodes receive zero force.
    pub fn compute_forces(&self, model: &GraphModel) -> ForceField {
        let n = model.len();
        let mut forces = vec![Vec2::ZERO; n];

        self.accumulate_repulsion(model, &mut forces);
        self.accumulate_springs(model, &mut forces);
        self.accumulate_center(model, &mut forces);

        for (i, force) in forces.iter_mut().enumerate() {
            if model.is_immobile(i) {
                *force = Vec2::ZERO;
            }
        }

        ForceField { forces }
    }

    /// Integrate a force field into velocities and positions.
    ///
    /// Pinned and anchored nodes are skipped entirely.
    pub fn apply(&self, model: &mut GraphModel, field: &ForceField, dt: f32) -> LayoutDelta {
        let scale = time_scale(dt, self.config.max_time_scale);
        let mut displacements = vec![Vec2::ZERO; model.len()];
        let mut max_displacement = 0.0_f32;

        let immobile: Vec<bool> = (0..model.len()).map(|i| model.is_immobile(i)).collect();
        for (i, node) in model.nodes_mut().iter_mut().enumerate() {
            if immobile[i] {
                continue;
            }
            let force = field.forces.get(i).copied().unwrap_or(Vec2::ZERO);
            let velocity =
                ((node.velocity + force * scale) * self.config.damping).clamp_length(self.config.max_speed);
            if !velocity.is_finite() {
                node.velocity = Vec2::ZERO;
                continue;
            }
            let moved = velocity * scale;
            node.velocity = velocity;
            node.position += moved;
            displacements[i] = moved;
            max_displacement = max_displacement.max(moved.length());
        }

        LayoutDelta {
            displacements,
            max_displacement,
            advanced: true,
        }
    }

    /// Every node repels every other node; pairs are visited once
    fn accumulate_repulsion(&self, model: &GraphModel, forces: &mut [Vec2]) {
        let nodes = model.nodes();
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let offset = nodes[i].position - nodes[j].position;
                let dist_sq = offset.length_sq();

                let direction = if dist_sq < COINCIDENT_EPSILON {
                    tie_break(i, j)
                } else {
                    offset / dist_sq.sqrt()
                };
                let push = direction * (self.config.repulsion / dist_sq.max(MIN_DISTANCE_SQ));

                forces[i] += push;
                forces[j] -= push;
            }
        }
    }

    /// Hooke springs along each node's incident edges
    fn accumulate_springs(&self, model: &GraphModel, forces: &mut [Vec2]) {
        let nodes = model.nodes();
        for (i, node) in nodes.iter().enumerate() {
            for inc in model.incident(i) {
                let offset = nodes[inc.neighbor].position - node.position;
                let dist = offset.length();
                if dist * dist < COINCIDENT_EPSILON {
                    continue;
                }
                let stretch = dist - self.config.rest_length;
                forces[i] += offset / dist * (stretch * self.config.spring_strength);
            }
        }
    }

    fn accumulate_center(&self, model: &GraphModel, forces: &mut [Vec2]) {
        for (force, node) in forces.iter_mut().zip(model.nodes()) {
            *force += (self.center - node.position) * self.config.center_gravity;
        }
    }
}

/// Deterministic push direction for a coincident pair `i < j`.
///
/// Antisymmetric by construction: node `i` gets `+dir`, node `j` gets `-dir`.
fn tie_break(i: usize, j: usize) -> Vec2 {
    let seed = (i * 7 + j * 13 + 1) as f32;
    Vec2::from_angle(GOLDEN_ANGLE * seed)
}

fn time_scale(dt: f32, max_scale: f32) -> f32 {
    if dt.is_finite() {
        (dt / FRAME_TIME).clamp(0.0, max_scale.max(0.0))
    } else {
        0.0
    }
}
