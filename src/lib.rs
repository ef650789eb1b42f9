//! notegraph - force-directed layout and pointer interaction for personal
//! knowledge graphs.
//!
//! The data layer hands over node and edge tuples; a [`GraphCoordinator`]
//! lays them out one frame at a time, turns pointer events into drags, pans
//! and selections, and produces a [`RenderScene`] for any [`DrawSurface`].

pub mod config;
pub mod coordinator;
pub mod geometry;
pub mod interaction;
pub mod io;
pub mod layout;
pub mod model;
pub mod render;
pub mod svg;
pub mod viewport;

pub use config::GraphConfig;
pub use coordinator::GraphCoordinator;
pub use geometry::Vec2;
pub use interaction::InteractionOutcome;
pub use layout::{LayoutDelta, LayoutEngine};
pub use model::{EdgeInput, GraphInput, GraphModel, NodeId, NodeInput, NodeKind, RelationKind};
pub use render::{DrawSurface, RenderScene};
pub use viewport::Viewport;
