//! Tunable constants for layout, viewport, interaction, and styling
//!
//! Everything here can be overridden from a YAML or JSON file; missing
//! fields fall back to the defaults below. Nothing is persisted.

use serde::{Deserialize, Serialize};

// =============================================================================
// Default Constants
// =============================================================================

/// Default repulsion strength (force = strength / distance²)
pub const DEFAULT_REPULSION: f32 = 3000.0;

/// Default spring rest length
pub const DEFAULT_REST_LENGTH: f32 = 120.0;

/// Default spring constant
pub const DEFAULT_SPRING_STRENGTH: f32 = 0.04;

/// Default pull toward the layout center, per unit of displacement
pub const DEFAULT_CENTER_GRAVITY: f32 = 0.005;

/// Default velocity damping applied every step (must be < 1)
pub const DEFAULT_DAMPING: f32 = 0.85;

/// Default maximum speed per step (prevents numerical explosion)
pub const DEFAULT_MAX_SPEED: f32 = 40.0;

/// Default speed below which the layout counts as settled
pub const DEFAULT_STOP_SPEED: f32 = 0.01;

/// Default number of steps before the simulation freezes
pub const DEFAULT_STEP_CAP: u32 = 100;

/// Default number of steps replayed after a drag release
pub const DEFAULT_SETTLE_WINDOW: u32 = 30;

/// Default zoom bounds
pub const DEFAULT_MIN_ZOOM: f32 = 0.2;
pub const DEFAULT_MAX_ZOOM: f32 = 3.0;

/// Default hit-test slack added to each node radius
pub const DEFAULT_HIT_TOLERANCE: f32 = 6.0;

/// Default pointer travel (screen px) separating a click from a drag
pub const DEFAULT_CLICK_THRESHOLD: f32 = 4.0;

/// All tunables for one graph view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub layout: LayoutConfig,
    pub placement: PlacementConfig,
    pub viewport: ViewportConfig,
    pub interaction: InteractionConfig,
    pub style: NodeStyleConfig,
    pub edges: EdgeStyleConfig,
}

/// Physics constants for the force simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub repulsion: f32,
    pub rest_length: f32,
    pub spring_strength: f32,
    pub center_gravity: f32,
    pub damping: f32,
    pub max_speed: f32,
    pub stop_speed: f32,
    pub step_cap: u32,
    pub settle_window: u32,
    /// Upper bound on how many nominal frames a single long `dt` may cover
    pub max_time_scale: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            repulsion: DEFAULT_REPULSION,
            rest_length: DEFAULT_REST_LENGTH,
            spring_strength: DEFAULT_SPRING_STRENGTH,
            center_gravity: DEFAULT_CENTER_GRAVITY,
            damping: DEFAULT_DAMPING,
            max_speed: DEFAULT_MAX_SPEED,
            stop_speed: DEFAULT_STOP_SPEED,
            step_cap: DEFAULT_STEP_CAP,
            settle_window: DEFAULT_SETTLE_WINDOW,
            max_time_scale: 3.0,
        }
    }
}

/// Initial placement on a circle around the layout center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub seed: u64,
    pub min_radius: f32,
    pub max_radius: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            seed: 0x6e6f_7465,
            min_radius: 60.0,
            max_radius: 180.0,
        }
    }
}

/// Camera limits and initial canvas size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Pointer handling thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub hit_tolerance: f32,
    pub click_threshold: f32,
    /// Zoom change per unit of scroll delta
    pub zoom_sensitivity: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hit_tolerance: DEFAULT_HIT_TOLERANCE,
            click_threshold: DEFAULT_CLICK_THRESHOLD,
            zoom_sensitivity: 0.002,
        }
    }
}

/// How domain weight maps to node size and intensity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeStyleConfig {
    pub min_radius: f32,
    pub max_radius: f32,
    pub min_visual_weight: f32,
    pub max_label_chars: usize,
}

impl Default for NodeStyleConfig {
    fn default() -> Self {
        Self {
            min_radius: 6.0,
            max_radius: 18.0,
            min_visual_weight: 0.35,
            max_label_chars: 24,
        }
    }
}

/// Dash pattern for weak relation kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeStyleConfig {
    pub dash_length: f32,
    pub gap_length: f32,
}

impl Default for EdgeStyleConfig {
    fn default() -> Self {
        Self {
            dash_length: 6.0,
            gap_length: 4.0,
        }
    }
}
