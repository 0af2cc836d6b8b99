// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the graph.

use crate::node::NodeId;
use crate::port::PortId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    /// Create a connection ID from a string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a new random connection ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw ID
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One end of a connection: a port on a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRef {
    /// Node owning the port
    pub node_id: NodeId,
    /// Port on that node
    pub port_id: PortId,
}

impl PortRef {
    /// Create an endpoint reference
    pub fn new(node_id: impl Into<NodeId>, port_id: impl Into<PortId>) -> Self {
        Self {
            node_id: node_id.into(),
            port_id: port_id.into(),
        }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node_id, self.port_id)
    }
}

/// A directed connection between two ports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Source node ID
    pub from_node_id: NodeId,
    /// Source port ID
    pub from_port_id: PortId,
    /// Target node ID
    pub to_node_id: NodeId,
    /// Target port ID
    pub to_port_id: PortId,
    /// Free-form connection data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl Connection {
    /// Create a new connection with a random ID
    pub fn new(from: PortRef, to: PortRef) -> Self {
        Self::with_id(ConnectionId::generate(), from, to)
    }

    /// Create a connection with a known ID
    pub fn with_id(id: ConnectionId, from: PortRef, to: PortRef) -> Self {
        Self {
            id,
            from_node_id: from.node_id,
            from_port_id: from.port_id,
            to_node_id: to.node_id,
            to_port_id: to.port_id,
            data: None,
        }
    }

    /// Source endpoint
    pub fn source(&self) -> PortRef {
        PortRef::new(self.from_node_id.clone(), self.from_port_id.clone())
    }

    /// Target endpoint
    pub fn target(&self) -> PortRef {
        PortRef::new(self.to_node_id.clone(), self.to_port_id.clone())
    }

    /// Check if this connection involves a specific node
    pub fn involves_node(&self, node_id: &NodeId) -> bool {
        self.from_node_id == *node_id || self.to_node_id == *node_id
    }

    /// Check if either end is the given port
    pub fn touches(&self, port: &PortRef) -> bool {
        (self.from_node_id == port.node_id && self.from_port_id == port.port_id)
            || (self.to_node_id == port.node_id && self.to_port_id == port.port_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let from = PortRef::new("a", "out");
        let to = PortRef::new("b", "in");
        let connection = Connection::new(from.clone(), to.clone());
        assert_eq!(connection.source(), from);
        assert_eq!(connection.target(), to);
        assert!(connection.touches(&from));
        assert!(connection.touches(&to));
        assert!(!connection.touches(&PortRef::new("a", "in")));
        assert!(connection.involves_node(&NodeId::from("b")));
    }

    #[test]
    fn test_connection_serialization() {
        let connection = Connection::with_id("c1".into(), PortRef::new("a", "out"), PortRef::new("b", "in"));
        let text = serde_json::to_string(&connection).unwrap();
        assert_eq!(
            text,
            r#"{"id":"c1","fromNodeId":"a","fromPortId":"out","toNodeId":"b","toPortId":"in"}"#
        );
    }
}
