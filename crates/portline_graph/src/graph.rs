// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and connections.
//!
//! The graph is a plain store. It does not validate connections; that is the
//! compatibility engine's job (see [`crate::host::GraphStore::connect`]).

use crate::connection::{Connection, ConnectionId, PortRef};
use crate::geometry::{Point, Size};
use crate::node::{Node, NodeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Error when mutating the graph
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Connection not found
    #[error("Connection not found: {0}")]
    ConnectionNotFound(ConnectionId),

    /// A connection with this ID already exists
    #[error("Duplicate connection ID: {0}")]
    DuplicateConnection(ConnectionId),

    /// A connection endpoint names a missing node
    #[error("Connection endpoint {0} references a missing node")]
    MissingEndpoint(PortRef),
}

/// A node graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    /// Nodes in the graph
    nodes: IndexMap<NodeId, Node>,
    /// Connections between nodes
    connections: IndexMap<ConnectionId, Connection>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph, replacing any node with the same ID
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        id
    }

    /// Remove a node and its connections
    pub fn remove_node(&mut self, node_id: &NodeId) -> Option<Node> {
        let node = self.nodes.shift_remove(node_id)?;
        self.connections.retain(|_, c| !c.involves_node(node_id));
        Some(node)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Move a node
    pub fn set_node_position(&mut self, node_id: &NodeId, position: Point) -> Result<(), GraphError> {
        self.require_node_mut(node_id)?.position = position;
        Ok(())
    }

    /// Record a measured size
    pub fn set_node_size(&mut self, node_id: &NodeId, size: Option<Size>) -> Result<(), GraphError> {
        self.require_node_mut(node_id)?.size = size;
        Ok(())
    }

    /// Set one data entry, returning the previous value
    pub fn set_node_data(
        &mut self,
        node_id: &NodeId,
        key: impl Into<String>,
        value: Value,
    ) -> Result<Option<Value>, GraphError> {
        Ok(self.require_node_mut(node_id)?.data.insert(key.into(), value))
    }

    fn require_node_mut(&mut self, node_id: &NodeId) -> Result<&mut Node, GraphError> {
        self.nodes
            .get_mut(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.clone()))
    }

    /// Position of a node in graph space, accumulated along its parent chain.
    ///
    /// A missing parent ends the chain; a parent cycle is cut at the first
    /// repeated node.
    pub fn absolute_position(&self, node_id: &NodeId) -> Option<Point> {
        let mut node = self.nodes.get(node_id)?;
        let mut position = node.position;
        let mut visited = HashSet::from([node_id]);
        while let Some(parent_id) = &node.parent_id {
            if !visited.insert(parent_id) {
                tracing::debug!(node = %node_id, parent = %parent_id, "Parent cycle while resolving node position");
                break;
            }
            let Some(parent) = self.nodes.get(parent_id) else {
                break;
            };
            position = position + parent.position;
            node = parent;
        }
        Some(position)
    }

    /// Insert a connection as-is.
    ///
    /// Both endpoint nodes must exist. Ports are not checked here: a
    /// connection whose port disappears later stays stored but dangling.
    pub fn insert_connection(&mut self, connection: Connection) -> Result<ConnectionId, GraphError> {
        if self.connections.contains_key(&connection.id) {
            return Err(GraphError::DuplicateConnection(connection.id));
        }
        for endpoint in [connection.source(), connection.target()] {
            if !self.nodes.contains_key(&endpoint.node_id) {
                return Err(GraphError::MissingEndpoint(endpoint));
            }
        }
        let id = connection.id.clone();
        self.connections.insert(id.clone(), connection);
        Ok(id)
    }

    /// Remove a connection
    pub fn disconnect(&mut self, connection_id: &ConnectionId) -> Option<Connection> {
        self.connections.shift_remove(connection_id)
    }

    /// Get a connection by ID
    pub fn connection(&self, connection_id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(connection_id)
    }

    /// Get all connections
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Connections with either end on a port
    pub fn connections_touching<'a>(&'a self, port: &'a PortRef) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.values().filter(move |c| c.touches(port))
    }

    /// Get connections involving a node
    pub fn connections_for_node<'a>(&'a self, node_id: &'a NodeId) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.values().filter(move |c| c.involves_node(node_id))
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
