// SPDX-License-Identifier: MIT OR Apache-2.0
//! Read-only view of a graph with its ports expanded.
//!
//! Capturing a snapshot runs the dynamic port expansion once; placement,
//! compatibility checks and the interaction state machine then read from it
//! without touching the store.

use crate::config::EngineConfig;
use crate::connection::{Connection, PortRef};
use crate::geometry::{Point, Size};
use crate::graph::Graph;
use crate::node::{Node, NodeId, NodeRegistry, NodeType};
use crate::placement::{self, PortLayout, PortPositions};
use crate::port::{self, Port};
use indexmap::IndexMap;

/// A consistent, read-only view of the graph for one computation
#[derive(Debug, Clone)]
pub struct GraphSnapshot<'a> {
    graph: &'a Graph,
    registry: &'a NodeRegistry,
    config: &'a EngineConfig,
    ports: IndexMap<NodeId, Vec<Port>>,
}

impl<'a> GraphSnapshot<'a> {
    /// Expand every node's port templates against the current graph
    pub fn capture(graph: &'a Graph, registry: &'a NodeRegistry, config: &'a EngineConfig) -> Self {
        let max_instances = config.placement.max_dynamic_instances;
        let ports = graph
            .nodes()
            .map(|node| {
                let ports = match registry.get(&node.node_type) {
                    Some(node_type) => port::expand_templates(node, &node_type.ports, max_instances),
                    None => {
                        tracing::debug!(node = %node.id, node_type = %node.node_type, "Unknown node type, node has no ports");
                        Vec::new()
                    }
                };
                (node.id.clone(), ports)
            })
            .collect();
        Self {
            graph,
            registry,
            config,
            ports,
        }
    }

    /// The underlying graph
    pub fn graph(&self) -> &'a Graph {
        self.graph
    }

    /// The node type registry
    pub fn registry(&self) -> &'a NodeRegistry {
        self.registry
    }

    /// The engine configuration
    pub fn config(&self) -> &'a EngineConfig {
        self.config
    }

    /// Get a node by ID
    pub fn node(&self, node_id: &NodeId) -> Option<&'a Node> {
        self.graph.node(node_id)
    }

    /// Type definition of a node
    pub fn node_type(&self, node_id: &NodeId) -> Option<&'a NodeType> {
        let node = self.graph.node(node_id)?;
        self.registry.get(&node.node_type)
    }

    /// Ports of a node in declaration order
    pub fn ports(&self, node_id: &NodeId) -> &[Port] {
        self.ports.get(node_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Look up a port
    pub fn port(&self, port: &PortRef) -> Option<&Port> {
        self.ports(&port.node_id).iter().find(|p| p.id == port.port_id)
    }

    /// Whether the port currently exists
    pub fn contains_port(&self, port: &PortRef) -> bool {
        self.port(port).is_some()
    }

    /// Whether either end of a connection no longer exists
    pub fn is_dangling(&self, connection: &Connection) -> bool {
        !self.contains_port(&connection.source()) || !self.contains_port(&connection.target())
    }

    /// Connections whose endpoints both exist
    pub fn live_connections(&self) -> impl Iterator<Item = &'a Connection> + '_ {
        self.graph.connections().filter(move |c| !self.is_dangling(c))
    }

    /// Connections with a missing endpoint
    pub fn dangling_connections(&self) -> impl Iterator<Item = &'a Connection> + '_ {
        self.graph.connections().filter(move |c| self.is_dangling(c))
    }

    /// Live connections touching a port
    pub fn connection_count(&self, port: &PortRef) -> usize {
        self.live_connections().filter(|c| c.touches(port)).count()
    }

    /// Live connections involving a node; a link between two of its own
    /// ports counts once
    pub fn node_connection_count(&self, node_id: &NodeId) -> usize {
        self.graph
            .connections_for_node(node_id)
            .filter(|c| !self.is_dangling(c))
            .count()
    }

    /// Whether a port has at least one live connection
    pub fn is_connected(&self, port: &PortRef) -> bool {
        self.live_connections().any(|c| c.touches(port))
    }

    /// Measured size, else the type default
    pub fn node_size(&self, node_id: &NodeId) -> Option<Size> {
        let node = self.graph.node(node_id)?;
        match self.registry.get(&node.node_type) {
            Some(node_type) => node_type.effective_size(node),
            None => node.size.filter(|s| s.is_valid()),
        }
    }

    /// Graph-space origin of a node, including its parents
    pub fn world_origin(&self, node_id: &NodeId) -> Option<Point> {
        self.graph.absolute_position(node_id)
    }

    /// Resolve the ports of one node, honoring its type's placement override
    pub fn resolve_node(&self, node_id: &NodeId) -> Option<PortPositions> {
        let node = self.graph.node(node_id)?;
        let origin = self.world_origin(node_id).unwrap_or(node.position);
        let size = self.node_size(node_id);
        let ports = self.ports(node_id);
        let custom = self.registry.get(&node.node_type).and_then(|t| t.placement.as_ref());
        Some(match custom {
            Some(placement) => placement::resolve_with_override(node, origin, size, ports, placement),
            None => placement::resolve_positions_at(origin, size, ports, &self.config.placement),
        })
    }

    /// Resolve every node
    pub fn layout(&self) -> PortLayout {
        let mut layout = PortLayout::new();
        for node in self.graph.nodes() {
            if let Some(positions) = self.resolve_node(&node.id) {
                layout.insert(node.id.clone(), positions);
            }
        }
        layout
    }
}
