// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph engine for interactive editors.
//!
//! This crate computes what a node editor draws and allows, without drawing
//! anything itself:
//! - Port placement: side, segment, absolute and percent anchors
//! - Connection compatibility: data types, port predicates, capacity and
//!   node-level vetoes
//! - Curve geometry: control points, path strings, sampling and hit-testing
//! - Drag-to-connect: an explicit gesture state machine
//!
//! ## Architecture
//!
//! The host owns the [`Graph`] and hands the engine a [`GraphSnapshot`] for
//! each computation. Node types ([`NodeType`]) attach placement and
//! validation policy as plain callbacks; [`definition`] builds them from
//! serialized data. Mutations go back through the [`GraphHost`] trait.

pub mod callback;
pub mod compatibility;
pub mod config;
pub mod connection;
pub mod curve;
pub mod definition;
pub mod geometry;
pub mod graph;
pub mod graphs;
pub mod host;
pub mod interaction;
pub mod node;
pub mod placement;
pub mod port;
pub mod snapshot;

pub use compatibility::{can_connect_refs, can_create_connection, ConnectionDecision, RejectionKind};
pub use config::{ConfigError, EngineConfig};
pub use connection::{Connection, ConnectionId, PortRef};
pub use curve::{ConnectionCurve, CubicBezier, CurveStyle};
pub use definition::{DefinitionError, NodeTypeDef};
pub use geometry::{Point, Size};
pub use graph::{Graph, GraphError};
pub use host::{GraphHost, GraphStore, HostError};
pub use interaction::{ConnectionInteraction, GesturePhase, Transition};
pub use node::{Node, NodeId, NodeRegistry, NodeType};
pub use placement::{PortLayout, PortPlacement, ResolvedPort, Side};
pub use port::{Capacity, DataType, Port, PortDirection, PortId, PortTemplate};
pub use snapshot::GraphSnapshot;
