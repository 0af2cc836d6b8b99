// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions and the node type registry.

use crate::compatibility::{ConnectionValidator, ValidationContext};
use crate::geometry::{Point, Size};
use crate::placement::{PlacementFn, PortPositions};
use crate::port::{Port, PortTemplate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a node ID from a string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a new random node ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw ID
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A node instance in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Node type ID
    #[serde(rename = "type")]
    pub node_type: String,
    /// Position in graph space (relative to the parent, if any)
    #[serde(default)]
    pub position: Point,
    /// Measured size; `None` until the presentation layer reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    /// Free-form node data
    #[serde(default)]
    pub data: Map<String, Value>,
    /// Enclosing node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
}

impl Node {
    /// Create a node of the given type at the origin
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            position: Point::ZERO,
            size: None,
            data: Map::new(),
            parent_id: None,
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Point::new(x, y);
        self
    }

    /// Set the measured size
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = Some(Size::new(width, height));
        self
    }

    /// Set a data entry
    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Set the parent node
    pub fn with_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }
}

/// Node type definition.
///
/// Placement and validation hooks are optional function fields; a type
/// without them uses the default algorithms.
#[derive(Debug, Clone)]
pub struct NodeType {
    /// Unique type identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    /// Port templates in declaration order
    pub ports: Vec<PortTemplate>,
    /// Size used until the node is measured
    pub default_size: Option<Size>,
    /// Replacement for the default placement algorithm
    pub placement: Option<PlacementFn>,
    /// Final veto on connections touching nodes of this type
    pub validate_connection: Option<ConnectionValidator>,
}

impl NodeType {
    /// Create a node type with no ports
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            ports: Vec::new(),
            default_size: None,
            placement: None,
            validate_connection: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a port template
    pub fn with_port(mut self, template: PortTemplate) -> Self {
        self.ports.push(template);
        self
    }

    /// Set the default size
    pub fn with_default_size(mut self, width: f32, height: f32) -> Self {
        self.default_size = Some(Size::new(width, height));
        self
    }

    /// Replace the placement algorithm
    pub fn with_placement<F>(mut self, f: F) -> Self
    where
        F: Fn(&Node, &[Port], Option<Size>) -> PortPositions + Send + Sync + 'static,
    {
        self.placement = Some(crate::placement::placement_fn(f));
        self
    }

    /// Attach a node-level connection veto
    pub fn with_validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&ValidationContext<'_>) -> bool + Send + Sync + 'static,
    {
        let f: Arc<dyn Fn(&ValidationContext<'_>) -> bool + Send + Sync> = Arc::new(f);
        self.validate_connection = Some(f.into());
        self
    }

    /// Cap the live connections across all of this type's ports
    pub fn with_max_total_connections(self, max: usize) -> Self {
        self.with_validator(move |ctx| ctx.snapshot.node_connection_count(&ctx.node.id) < max)
    }

    /// Effective size of a node of this type
    pub fn effective_size(&self, node: &Node) -> Option<Size> {
        node.size.filter(|s| s.is_valid()).or(self.default_size)
    }
}

/// Registry of available node types
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    /// Registered node types by ID
    types: IndexMap<String, NodeType>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Register a node type, replacing any type with the same ID
    pub fn register(&mut self, node_type: NodeType) {
        self.types.insert(node_type.id.clone(), node_type);
    }

    /// Get a node type by ID
    pub fn get(&self, id: &str) -> Option<&NodeType> {
        self.types.get(id)
    }

    /// Get all registered types
    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Create a node from a type ID
    pub fn create_node(&self, type_id: &str, id: impl Into<NodeId>) -> Option<Node> {
        self.get(type_id).map(|t| Node::new(id, t.id.clone()))
    }
}
