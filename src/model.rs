//! Graph model: nodes, edges, and simulation state
//!
//! The model owns nodes by value in insertion order. Edges hold plain id
//! references which are resolved through the id index; a per-node
//! incidence list is built once per load so the spring pass never rescans
//! the edge list.

use std::collections::HashMap;
use std::f32::consts::TAU;
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{NodeStyleConfig, PlacementConfig};
use crate::geometry::{BoundingBox, Vec2};

/// Stable node identifier, equal to the domain entity's id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Category of the domain entity behind a node.
///
/// Only affects the glyph drawn inside the node, never the physics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    #[default]
    Note,
    Article,
    Highlight,
    Image,
}

impl NodeKind {
    /// Single-character glyph drawn at the node center
    pub fn glyph(&self) -> &'static str {
        match self {
            NodeKind::Note => "N",
            NodeKind::Article => "A",
            NodeKind::Highlight => "H",
            NodeKind::Image => "I",
        }
    }
}

/// Category of a connection between two nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Explicit link written by the user
    #[default]
    Link,
    /// Citation or quotation of another item
    Reference,
    /// Suggested similarity
    Related,
    /// Items that share a tag
    SharedTag,
}

/// Fixed stroke style for a relation kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeStyle {
    pub opacity: f32,
    pub width: f32,
    pub dashed: bool,
}

impl RelationKind {
    pub fn style(&self) -> EdgeStyle {
        match self {
            RelationKind::Link => EdgeStyle {
                opacity: 0.8,
                width: 2.0,
                dashed: false,
            },
            RelationKind::Reference => EdgeStyle {
                opacity: 0.6,
                width: 1.5,
                dashed: false,
            },
            RelationKind::Related => EdgeStyle {
                opacity: 0.45,
                width: 1.0,
                dashed: true,
            },
            RelationKind::SharedTag => EdgeStyle {
                opacity: 0.3,
                width: 1.0,
                dashed: true,
            },
        }
    }

    /// Whether the renderer should draw an arrowhead at the target
    pub fn is_directed(&self) -> bool {
        matches!(self, RelationKind::Link | RelationKind::Reference)
    }
}

/// Node tuple supplied by the data layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInput {
    pub id: NodeId,
    pub label: String,
    #[serde(default)]
    pub kind: NodeKind,
    /// Domain weight (e.g. depth score), expected in `0.0..=1.0`
    #[serde(default)]
    pub weight: f32,
}

impl NodeInput {
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>, kind: NodeKind, weight: f32) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            weight,
        }
    }
}

/// Edge tuple supplied by the data layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeInput {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub relation: RelationKind,
}

impl EdgeInput {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>, relation: RelationKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation,
        }
    }
}

/// Complete collaborator payload for one rebuild
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphInput {
    #[serde(default)]
    pub nodes: Vec<NodeInput>,
    #[serde(default)]
    pub edges: Vec<EdgeInput>,
}

/// A node with simulation state and derived display attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub visual_weight: f32,
    pub label: String,
    pub kind: NodeKind,
}

impl Node {
    fn from_input(input: &NodeInput, style: &NodeStyleConfig, position: Vec2) -> Self {
        let w = normalized_weight(input.weight);
        Self {
            id: input.id.clone(),
            position,
            velocity: Vec2::ZERO,
            radius: style.min_radius + (style.max_radius - style.min_radius) * w,
            visual_weight: style.min_visual_weight + (1.0 - style.min_visual_weight) * w,
            label: truncate_label(&input.label, style.max_label_chars),
            kind: input.kind,
        }
    }
}

/// An edge between two nodes, by id
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub relation: RelationKind,
}

/// One entry of a node's incidence list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Incidence {
    /// Index into the edge list
    pub edge: usize,
    /// Index of the node at the other end
    pub neighbor: usize,
}

/// Where and how initial positions are seeded
#[derive(Debug, Clone)]
pub struct Placement {
    pub center: Vec2,
    pub seed: u64,
    pub min_radius: f32,
    pub max_radius: f32,
}

impl Placement {
    pub fn new(center: Vec2, config: &PlacementConfig) -> Self {
        Self {
            center,
            seed: config.seed,
            min_radius: config.min_radius,
            max_radius: config.max_radius,
        }
    }

    /// Positions for `count` nodes on a circle with a random radius each
    fn positions(&self, count: usize) -> Vec<Vec2> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let ranged = self.min_radius.is_finite()
            && self.max_radius.is_finite()
            && self.min_radius < self.max_radius;

        (0..count)
            .map(|i| {
                let angle = TAU * (i as f32) / (count as f32);
                let radius = if ranged {
                    rng.gen_range(self.min_radius..=self.max_radius)
                } else {
                    self.min_radius
                };
                self.center + Vec2::from_angle(angle) * radius
            })
            .collect()
    }
}

/// Authoritative snapshot of nodes, edges, and the per-session pin state
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<NodeId, usize>,
    incidence: Vec<Vec<Incidence>>,
    /// Node under drag control (at most one)
    pinned: Option<usize>,
    /// Last released node, held in place while the layout resettles
    anchored: Option<usize>,
}

impl GraphModel {
    /// Build a fresh model from collaborator data.
    ///
    /// Duplicate node ids keep their first occurrence. Edges with a missing
    /// endpoint and self-loops are dropped.
    pub fn load(
        nodes: &[NodeInput],
        edges: &[EdgeInput],
        style: &NodeStyleConfig,
        placement: &Placement,
    ) -> Self {
        let mut index = HashMap::with_capacity(nodes.len());
        let mut unique = Vec::with_capacity(nodes.len());
        for input in nodes {
            if index.contains_key(&input.id) {
                debug!(id = %input.id, "dropping duplicate node");
                continue;
            }
            index.insert(input.id.clone(), unique.len());
            unique.push(input);
        }

        let positions = placement.positions(unique.len());
        let nodes: Vec<Node> = unique
            .iter()
            .zip(positions)
            .map(|(input, position)| Node::from_input(input, style, position))
            .collect();

        let mut incidence = vec![Vec::new(); nodes.len()];
        let mut kept = Vec::with_capacity(edges.len());
        for input in edges {
            let (Some(&source), Some(&target)) = (index.get(&input.source), index.get(&input.target))
            else {
                debug!(source = %input.source, target = %input.target, "dropping dangling edge");
                continue;
            };
            if source == target {
                debug!(id = %input.source, "dropping self-loop");
                continue;
            }
            let edge = kept.len();
            incidence[source].push(Incidence {
                edge,
                neighbor: target,
            });
            incidence[target].push(Incidence {
                edge,
                neighbor: source,
            });
            kept.push(Edge {
                source: input.source.clone(),
                target: input.target.clone(),
                relation: input.relation,
            });
        }

        debug!(
            nodes = nodes.len(),
            edges = kept.len(),
            dropped = edges.len() - kept.len(),
            "graph model loaded"
        );

        Self {
            nodes,
            edges: kept,
            index,
            incidence,
            pinned: None,
            anchored: None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in insertion (render) order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    pub fn node_at(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Edges touching the node at `index`
    pub fn incident(&self, index: usize) -> &[Incidence] {
        self.incidence.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids of nodes adjacent to `id`
    pub fn neighbors(&self, id: &NodeId) -> impl Iterator<Item = &NodeId> + '_ {
        self.index_of(id)
            .map(|i| self.incident(i))
            .unwrap_or(&[])
            .iter()
            .map(|inc| &self.nodes[inc.neighbor].id)
    }

    /// Resolve an edge's endpoints to node indices
    pub fn endpoints(&self, edge: &Edge) -> Option<(usize, usize)> {
        Some((self.index_of(&edge.source)?, self.index_of(&edge.target)?))
    }

    /// Move a node directly. Non-finite positions are ignored.
    pub fn set_position(&mut self, id: &NodeId, position: Vec2) -> bool {
        if !position.is_finite() {
            return false;
        }
        match self.index_of(id) {
            Some(i) => {
                self.nodes[i].position = position;
                true
            }
            None => false,
        }
    }

    /// Set a node's velocity. Refused for the pinned node, whose velocity
    /// stays zero until it is unpinned.
    pub fn set_velocity(&mut self, id: &NodeId, velocity: Vec2) -> bool {
        match self.index_of(id) {
            Some(i) if velocity.is_finite() && self.pinned != Some(i) => {
                self.nodes[i].velocity = velocity;
                true
            }
            _ => false,
        }
    }

    /// Take the pin lock for `id` and zero its velocity.
    ///
    /// Returns the velocity the node had before pinning, or `None` if the
    /// node is unknown or another node already holds the lock.
    pub fn pin(&mut self, id: &NodeId) -> Option<Vec2> {
        if self.pinned.is_some() {
            return None;
        }
        let i = self.index_of(id)?;
        let previous = std::mem::replace(&mut self.nodes[i].velocity, Vec2::ZERO);
        self.pinned = Some(i);
        Some(previous)
    }

    /// Release the pin lock, returning the node that held it
    pub fn unpin(&mut self) -> Option<NodeId> {
        self.pinned.take().map(|i| self.nodes[i].id.clone())
    }

    pub fn pinned(&self) -> Option<&NodeId> {
        self.pinned.map(|i| &self.nodes[i].id)
    }

    /// Hold `id` in place until the anchor is cleared or moved
    pub fn anchor(&mut self, id: &NodeId) -> bool {
        match self.index_of(id) {
            Some(i) => {
                self.nodes[i].velocity = Vec2::ZERO;
                self.anchored = Some(i);
                true
            }
            None => false,
        }
    }

    pub fn clear_anchor(&mut self) {
        self.anchored = None;
    }

    pub fn anchored(&self) -> Option<&NodeId> {
        self.anchored.map(|i| &self.nodes[i].id)
    }

    /// Pinned and anchored nodes are not moved by the simulation
    pub fn is_immobile(&self, index: usize) -> bool {
        self.pinned == Some(index) || self.anchored == Some(index)
    }

    /// Bounds of all node circles in model space
    pub fn bounds(&self) -> BoundingBox {
        let mut bounds = BoundingBox::empty();
        for node in &self.nodes {
            bounds.include_circle(node.position, node.radius);
        }
        bounds
    }
}

fn normalized_weight(weight: f32) -> f32 {
    if weight.is_finite() {
        weight.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Trim and cut a label to `max` characters, marking the cut with an ellipsis
fn truncate_label(label: &str, max: usize) -> String {
    let label = label.trim();
    if label.chars().count() <= max {
        return label.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut cut: String = label.chars().take(max - 1).collect();
    cut.push('…');
    cut
}
