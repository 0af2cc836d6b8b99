// SPDX-License-Identifier: MIT OR Apache-2.0
//! Declarative node types.
//!
//! A [`NodeTypeDef`] describes a node type as plain data so it can live in a
//! RON or JSON file. Dynamic instance counts and the node-level connection
//! cap compile into the same callbacks a hand-written [`NodeType`] uses.

use crate::geometry::Size;
use crate::node::{NodeRegistry, NodeType};
use crate::placement::PortPlacement;
use crate::port::{Capacity, DataType, DynamicPorts, PortDirection, PortTemplate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Error building node types from definitions
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    /// Two node types share an ID
    #[error("Duplicate node type: {0}")]
    DuplicateNodeType(String),

    /// Two templates of one node type share an ID
    #[error("Duplicate port template `{template}` on node type `{node_type}`")]
    DuplicateTemplate {
        /// Node type ID
        node_type: String,
        /// Template ID
        template: String,
    },

    /// Default size is negative or not finite
    #[error("Invalid default size on node type `{0}`")]
    InvalidSize(String),
}

/// How many ports a dynamic template produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstancesDef {
    /// Integer read from the node's data, with a fallback
    FromData {
        /// Data key
        key: String,
        /// Count used when the key is missing or not an integer
        default: i64,
    },
    /// Always this many
    Fixed(usize),
}

impl From<&InstancesDef> for DynamicPorts {
    fn from(def: &InstancesDef) -> Self {
        match def {
            InstancesDef::FromData { key, default } => DynamicPorts::from_data_key(key.clone(), *default),
            InstancesDef::Fixed(n) => DynamicPorts::fixed(*n),
        }
    }
}

/// Serializable port template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortTemplateDef {
    /// Template ID
    pub id: String,
    /// Display label
    pub label: String,
    /// Port direction
    pub direction: PortDirection,
    /// Placement; inputs default to the left side, outputs to the right
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<PortPlacement>,
    /// Accepted data types, absent for any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    /// Connection limit
    #[serde(default)]
    pub max_connections: Capacity,
    /// Instance rule; absent for a single static port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<InstancesDef>,
}

impl PortTemplateDef {
    /// Build the runtime template
    pub fn to_template(&self) -> PortTemplate {
        let mut template = PortTemplate::new(self.id.clone(), self.label.clone(), self.direction)
            .with_max_connections(self.max_connections);
        if let Some(placement) = &self.placement {
            template = template.with_placement(placement.clone());
        }
        if let Some(data_type) = &self.data_type {
            template = template.with_data_type(data_type.clone());
        }
        if let Some(instances) = &self.instances {
            template = template.dynamic(instances.into());
        }
        template
    }
}

/// Serializable node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTypeDef {
    /// Unique type ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Port templates in declaration order
    #[serde(default)]
    pub ports: Vec<PortTemplateDef>,
    /// Size used until the node is measured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_size: Option<Size>,
    /// Cap on live connections across all ports of one node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_total_connections: Option<u32>,
}

impl NodeTypeDef {
    /// Build the runtime node type
    pub fn build(&self) -> Result<NodeType, DefinitionError> {
        let mut seen = HashSet::new();
        let mut node_type = NodeType::new(self.id.clone(), self.name.clone()).with_description(self.description.clone());
        for port in &self.ports {
            if !seen.insert(port.id.as_str()) {
                return Err(DefinitionError::DuplicateTemplate {
                    node_type: self.id.clone(),
                    template: port.id.clone(),
                });
            }
            node_type = node_type.with_port(port.to_template());
        }
        if let Some(size) = self.default_size {
            if !size.is_valid() {
                return Err(DefinitionError::InvalidSize(self.id.clone()));
            }
            node_type = node_type.with_default_size(size.width, size.height);
        }
        if let Some(max) = self.max_total_connections {
            node_type = node_type.with_max_total_connections(max as usize);
        }
        Ok(node_type)
    }
}

impl NodeRegistry {
    /// Build a registry from definitions
    pub fn from_definitions<'a, I>(defs: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = &'a NodeTypeDef>,
    {
        let mut registry = NodeRegistry::new();
        for def in defs {
            if registry.get(&def.id).is_some() {
                return Err(DefinitionError::DuplicateNodeType(def.id.clone()));
            }
            registry.register(def.build()?);
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compatibility::{can_connect_refs, ConnectionDecision, RejectionKind};
    use crate::config::EngineConfig;
    use crate::connection::{Connection, PortRef};
    use crate::graph::Graph;
    use crate::node::{Node, NodeId};
    use crate::snapshot::GraphSnapshot;
    use serde_json::json;

    const DEFS: &str = r#"[
        (
            id: "sum",
            name: "Sum",
            ports: [
                (
                    id: "in",
                    label: "Input",
                    direction: input,
                    data_type: Some("number"),
                    instances: Some(FromData(key: "inputs", default: 2)),
                ),
                (
                    id: "out",
                    label: "Result",
                    direction: output,
                    data_type: Some("number"),
                    max_connections: "unlimited",
                ),
            ],
            default_size: Some((width: 120.0, height: 80.0)),
        ),
        (
            id: "hub",
            name: "Hub",
            ports: [
                (id: "a", label: "A", direction: input, max_connections: "unlimited"),
                (id: "b", label: "B", direction: input, max_connections: "unlimited"),
                (
                    id: "probe",
                    label: "Probe",
                    direction: output,
                    placement: Some(Absolute((x: 50.0, y: 100.0, unit: percent))),
                ),
            ],
            max_total_connections: Some(1),
        ),
    ]"#;

    fn registry() -> NodeRegistry {
        let defs: Vec<NodeTypeDef> = ron::from_str(DEFS).unwrap();
        NodeRegistry::from_definitions(&defs).unwrap()
    }

    #[test]
    fn test_definitions_expand() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        let config = EngineConfig::default();
        let mut graph = Graph::new();
        graph.add_node(Node::new("s", "sum").with_data("inputs", json!(4)));
        graph.add_node(Node::new("h", "hub"));
        let snapshot = GraphSnapshot::capture(&graph, &registry, &config);
        let ports = snapshot.ports(&NodeId::from("s"));
        assert_eq!(ports.len(), 5);
        assert_eq!(ports[3].label, "Input 4");
        assert!(ports[4].is_output());
        assert_eq!(snapshot.node_size(&NodeId::from("s")), Some(Size::new(120.0, 80.0)));
        assert!(matches!(
            snapshot.port(&PortRef::new("h", "probe")).map(|p| &p.placement),
            Some(PortPlacement::Absolute(_))
        ));
    }

    #[test]
    fn test_total_connection_cap() {
        let registry = registry();
        let config = EngineConfig::default();
        let mut graph = Graph::new();
        graph.add_node(Node::new("s", "sum"));
        graph.add_node(Node::new("h", "hub"));
        let first = {
            let snapshot = GraphSnapshot::capture(&graph, &registry, &config);
            can_connect_refs(&PortRef::new("s", "out"), &PortRef::new("h", "a"), &snapshot)
        };
        assert_eq!(first, ConnectionDecision::Allowed);
        graph
            .insert_connection(Connection::new(PortRef::new("s", "out"), PortRef::new("h", "a")))
            .unwrap();
        let snapshot = GraphSnapshot::capture(&graph, &registry, &config);
        assert_eq!(
            can_connect_refs(&PortRef::new("s", "out"), &PortRef::new("h", "b"), &snapshot),
            ConnectionDecision::Rejected(RejectionKind::NodeValidation)
        );
    }

    #[test]
    fn test_duplicates_are_errors() {
        let def = NodeTypeDef {
            id: "x".into(),
            name: "X".into(),
            description: String::new(),
            ports: vec![
                PortTemplateDef {
                    id: "p".into(),
                    label: "P".into(),
                    direction: PortDirection::Input,
                    placement: None,
                    data_type: None,
                    max_connections: Capacity::default(),
                    instances: None,
                };
                2
            ],
            default_size: None,
            max_total_connections: None,
        };
        assert!(matches!(def.build(), Err(DefinitionError::DuplicateTemplate { .. })));

        let ok = NodeTypeDef {
            ports: Vec::new(),
            ..def
        };
        assert!(matches!(
            NodeRegistry::from_definitions([&ok, &ok]),
            Err(DefinitionError::DuplicateNodeType(_))
        ));

        let bad_size = NodeTypeDef {
            default_size: Some(Size::new(-1.0, 10.0)),
            ..ok
        };
        assert!(matches!(bad_size.build(), Err(DefinitionError::InvalidSize(_))));
    }
}
