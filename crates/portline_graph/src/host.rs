// SPDX-License-Identifier: MIT OR Apache-2.0
//! The host contract and an in-memory reference host.
//!
//! The engine never owns the graph. It reads snapshots and asks the host to
//! create or delete connections; [`GraphStore`] is the host used by the
//! inspect tool and by tests.

use crate::compatibility::{self, ConnectionDecision, RejectionKind};
use crate::config::EngineConfig;
use crate::connection::{Connection, ConnectionId, PortRef};
use crate::graph::{Graph, GraphError};
use crate::node::{Node, NodeId, NodeRegistry};
use crate::snapshot::GraphSnapshot;

/// Error returned by a host mutation
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The compatibility engine refused the connection
    #[error("Connection rejected: {0}")]
    Rejected(RejectionKind),

    /// The underlying store refused the mutation
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Owner of the graph data model
pub trait GraphHost {
    /// Consistent read-only view of the current graph
    fn snapshot(&self) -> GraphSnapshot<'_>;

    /// Store a connection that already passed validation
    fn create_connection(&mut self, connection: Connection) -> Result<ConnectionId, HostError>;

    /// Remove a connection
    fn delete_connection(&mut self, id: &ConnectionId) -> Result<Connection, HostError>;
}

/// In-memory host bundling a graph with its node types and configuration
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    graph: Graph,
    registry: NodeRegistry,
    config: EngineConfig,
}

impl GraphStore {
    /// Create a store with an empty graph
    pub fn new(registry: NodeRegistry, config: EngineConfig) -> Self {
        Self::with_graph(Graph::new(), registry, config)
    }

    /// Create a store around an existing graph
    pub fn with_graph(graph: Graph, registry: NodeRegistry, config: EngineConfig) -> Self {
        Self {
            graph,
            registry,
            config,
        }
    }

    /// The stored graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Mutable access to the stored graph
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// The node type registry
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// The engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Add a node
    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.graph.add_node(node)
    }

    /// Remove a node and every connection touching it
    pub fn remove_node(&mut self, node_id: &NodeId) -> Result<Node, HostError> {
        self.graph
            .remove_node(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.clone()).into())
    }

    /// Validate and store a connection from `from` to `to`
    pub fn connect(&mut self, from: &PortRef, to: &PortRef) -> Result<ConnectionId, HostError> {
        let decision = compatibility::can_connect_refs(from, to, &self.snapshot());
        match decision {
            ConnectionDecision::Allowed => self.create_connection(Connection::new(from.clone(), to.clone())),
            ConnectionDecision::Rejected(kind) => Err(HostError::Rejected(kind)),
        }
    }

    /// Delete connections with a missing endpoint port and return them
    pub fn prune_dangling(&mut self) -> Vec<Connection> {
        let dangling: Vec<ConnectionId> = self
            .snapshot()
            .dangling_connections()
            .map(|c| c.id.clone())
            .collect();
        let removed: Vec<Connection> = dangling.iter().filter_map(|id| self.graph.disconnect(id)).collect();
        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), "Pruned dangling connections");
        }
        removed
    }
}

impl GraphHost for GraphStore {
    fn snapshot(&self) -> GraphSnapshot<'_> {
        GraphSnapshot::capture(&self.graph, &self.registry, &self.config)
    }

    fn create_connection(&mut self, connection: Connection) -> Result<ConnectionId, HostError> {
        let id = self.graph.insert_connection(connection)?;
        tracing::debug!(connection = %id, "Connection created");
        Ok(id)
    }

    fn delete_connection(&mut self, id: &ConnectionId) -> Result<Connection, HostError> {
        self.graph
            .disconnect(id)
            .ok_or_else(|| GraphError::ConnectionNotFound(id.clone()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeType;
    use crate::port::{DynamicPorts, PortTemplate};
    use serde_json::json;

    fn store() -> GraphStore {
        let mut registry = NodeRegistry::new();
        registry.register(NodeType::new("source", "Source").with_port(PortTemplate::output("out", "Out").unlimited()));
        registry.register(
            NodeType::new("sum", "Sum").with_port(PortTemplate::input("in", "In").dynamic(DynamicPorts::from_data_key("inputs", 2))),
        );
        let mut store = GraphStore::new(registry, EngineConfig::default());
        store.add_node(Node::new("src", "source"));
        store.add_node(Node::new("sum", "sum").with_data("inputs", json!(3)));
        store
    }

    #[test]
    fn test_connect_validates() {
        let mut store = store();
        let id = store
            .connect(&PortRef::new("src", "out"), &PortRef::new("sum", "in-0"))
            .unwrap();
        assert!(store.graph().connection(&id).is_some());
        assert!(matches!(
            store.connect(&PortRef::new("src", "out"), &PortRef::new("sum", "in-0")),
            Err(HostError::Rejected(RejectionKind::Capacity))
        ));
        assert!(matches!(
            store.connect(&PortRef::new("src", "out"), &PortRef::new("sum", "in-9")),
            Err(HostError::Rejected(RejectionKind::MissingPort))
        ));
        assert_eq!(store.graph().connection_count(), 1);
    }

    #[test]
    fn test_prune_dangling() {
        let mut store = store();
        store.connect(&PortRef::new("src", "out"), &PortRef::new("sum", "in-0")).unwrap();
        store.connect(&PortRef::new("src", "out"), &PortRef::new("sum", "in-2")).unwrap();
        assert!(store.prune_dangling().is_empty());

        store
            .graph_mut()
            .set_node_data(&NodeId::from("sum"), "inputs", json!(1))
            .unwrap();
        let removed = store.prune_dangling();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].to_port_id.as_str(), "in-2");
        assert_eq!(store.graph().connection_count(), 1);
    }

    #[test]
    fn test_delete_and_remove() {
        let mut store = store();
        let id = store.connect(&PortRef::new("src", "out"), &PortRef::new("sum", "in-1")).unwrap();
        assert!(store.delete_connection(&id).is_ok());
        assert!(matches!(
            store.delete_connection(&id),
            Err(HostError::Graph(GraphError::ConnectionNotFound(_)))
        ));
        assert!(store.remove_node(&NodeId::from("sum")).is_ok());
        assert!(store.remove_node(&NodeId::from("sum")).is_err());
    }
}
