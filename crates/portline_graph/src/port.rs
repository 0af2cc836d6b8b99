// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port templates and the concrete ports expanded from them.

use crate::callback::Callback;
use crate::compatibility::ConnectPredicate;
use crate::connection::PortRef;
use crate::node::{Node, NodeId};
use crate::placement::{PortPlacement, Side};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Identifier of a port, unique within its node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortId(pub String);

impl PortId {
    /// Create a port ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw ID
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PortId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PortId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

/// Data type(s) a port carries.
///
/// A port without a data type accepts anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataType {
    /// A single named type
    Single(String),
    /// Any of several named types
    Many(Vec<String>),
}

impl DataType {
    /// Iterate the named types
    pub fn types(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Self::Single(t) => std::slice::from_ref(t),
            Self::Many(ts) => ts,
        };
        slice.iter().map(String::as_str)
    }

    /// Whether the two type sets share at least one name
    pub fn intersects(&self, other: &DataType) -> bool {
        let mine: HashSet<&str> = self.types().collect();
        other.types().any(|t| mine.contains(t))
    }
}

impl From<&str> for DataType {
    fn from(t: &str) -> Self {
        Self::Single(t.to_string())
    }
}

impl From<String> for DataType {
    fn from(t: String) -> Self {
        Self::Single(t)
    }
}

impl From<Vec<String>> for DataType {
    fn from(ts: Vec<String>) -> Self {
        Self::Many(ts)
    }
}

impl From<&[&str]> for DataType {
    fn from(ts: &[&str]) -> Self {
        Self::Many(ts.iter().map(|t| (*t).to_string()).collect())
    }
}

/// Maximum number of simultaneous connections on a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CapacityRepr", into = "CapacityRepr")]
pub enum Capacity {
    /// At most this many connections
    Limited(u32),
    /// No limit
    Unlimited,
}

impl Capacity {
    /// Whether a port that already has `existing` connections can take one more
    pub fn admits(self, existing: usize) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Limited(max) => existing < max as usize,
        }
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Self::Limited(1)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CapacityRepr {
    Count(u32),
    Keyword(String),
}

impl TryFrom<CapacityRepr> for Capacity {
    type Error = String;

    fn try_from(repr: CapacityRepr) -> Result<Self, Self::Error> {
        match repr {
            CapacityRepr::Count(n) => Ok(Self::Limited(n)),
            CapacityRepr::Keyword(k) if k == "unlimited" => Ok(Self::Unlimited),
            CapacityRepr::Keyword(k) => Err(format!("invalid capacity `{k}`, expected a count or \"unlimited\"")),
        }
    }
}

impl From<Capacity> for CapacityRepr {
    fn from(c: Capacity) -> Self {
        match c {
            Capacity::Limited(n) => Self::Count(n),
            Capacity::Unlimited => Self::Keyword("unlimited".to_string()),
        }
    }
}

/// A concrete port on a node, produced by expanding a [`PortTemplate`]
#[derive(Debug, Clone)]
pub struct Port {
    /// Port ID (unique within the node)
    pub id: PortId,
    /// Owning node
    pub node_id: NodeId,
    /// Port direction
    pub direction: PortDirection,
    /// Display label
    pub label: String,
    /// Where the port sits on the node
    pub placement: PortPlacement,
    /// Accepted data types, `None` for any
    pub data_type: Option<DataType>,
    /// Connection limit
    pub max_connections: Capacity,
    /// Custom compatibility predicate
    pub can_connect: Option<ConnectPredicate>,
    /// Template this port was expanded from
    pub template_id: String,
    /// Instance index for dynamic ports
    pub instance: Option<usize>,
}

impl Port {
    /// Endpoint reference for this port
    pub fn port_ref(&self) -> PortRef {
        PortRef::new(self.node_id.clone(), self.id.clone())
    }

    /// Whether this is an output
    pub fn is_output(&self) -> bool {
        self.direction == PortDirection::Output
    }
}

/// Context handed to a dynamic template's instance counter
#[derive(Debug, Clone, Copy)]
pub struct InstanceContext<'a> {
    /// Node being expanded
    pub node: &'a Node,
    /// Template being expanded
    pub template_id: &'a str,
}

/// Counts instances of a dynamic template
pub type InstanceCountFn = Callback<dyn Fn(&InstanceContext<'_>) -> i64 + Send + Sync>;
/// Derives a port ID from an instance index
pub type PortIdFn = Callback<dyn Fn(usize) -> PortId + Send + Sync>;
/// Derives a port label from an instance index
pub type PortLabelFn = Callback<dyn Fn(usize) -> String + Send + Sync>;

/// Instancing rule of a dynamic template
#[derive(Debug, Clone)]
pub struct DynamicPorts {
    instances: InstanceCountFn,
    create_port_id: Option<PortIdFn>,
    create_port_label: Option<PortLabelFn>,
}

impl DynamicPorts {
    /// Instances counted by a function of the node.
    ///
    /// Without custom generators, instance `i` of template `t` gets the ID
    /// `t-i` and the template label followed by `i + 1`.
    pub fn new<F>(instances: F) -> Self
    where
        F: Fn(&InstanceContext<'_>) -> i64 + Send + Sync + 'static,
    {
        let instances: Arc<dyn Fn(&InstanceContext<'_>) -> i64 + Send + Sync> = Arc::new(instances);
        Self {
            instances: instances.into(),
            create_port_id: None,
            create_port_label: None,
        }
    }

    /// Instance count read from an integer entry of the node's data
    pub fn from_data_key(key: impl Into<String>, default: i64) -> Self {
        let key = key.into();
        Self::new(move |ctx| {
            ctx.node
                .data
                .get(&key)
                .and_then(serde_json::Value::as_i64)
                .unwrap_or(default)
        })
    }

    /// A fixed number of instances
    pub fn fixed(count: usize) -> Self {
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        Self::new(move |_| count)
    }

    /// Custom port ID generator
    pub fn with_port_id<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) -> PortId + Send + Sync + 'static,
    {
        let f: Arc<dyn Fn(usize) -> PortId + Send + Sync> = Arc::new(f);
        self.create_port_id = Some(f.into());
        self
    }

    /// Custom port label generator
    pub fn with_port_label<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) -> String + Send + Sync + 'static,
    {
        let f: Arc<dyn Fn(usize) -> String + Send + Sync> = Arc::new(f);
        self.create_port_label = Some(f.into());
        self
    }

    /// Raw, unclamped instance count for a node
    pub fn count(&self, ctx: &InstanceContext<'_>) -> i64 {
        (self.instances.get())(ctx)
    }
}

/// Whether a template yields one port or a counted set
#[derive(Debug, Clone, Default)]
pub enum Instancing {
    /// Exactly one port
    #[default]
    Static,
    /// One port per instance
    Dynamic(DynamicPorts),
}

/// Declarative description of one port (or a family of ports) on a node type
#[derive(Debug, Clone)]
pub struct PortTemplate {
    /// Template ID, used as the port ID for static templates
    pub id: String,
    /// Port direction
    pub direction: PortDirection,
    /// Display label
    pub label: String,
    /// Placement shared by every instance
    pub placement: PortPlacement,
    /// Accepted data types, `None` for any
    pub data_type: Option<DataType>,
    /// Connection limit per instance
    pub max_connections: Capacity,
    /// Custom compatibility predicate
    pub can_connect: Option<ConnectPredicate>,
    /// Static or dynamic
    pub instancing: Instancing,
}

impl PortTemplate {
    /// Create a template
    pub fn new(id: impl Into<String>, label: impl Into<String>, direction: PortDirection) -> Self {
        let side = match direction {
            PortDirection::Input => Side::Left,
            PortDirection::Output => Side::Right,
        };
        Self {
            id: id.into(),
            direction,
            label: label.into(),
            placement: PortPlacement::side(side),
            data_type: None,
            max_connections: Capacity::default(),
            can_connect: None,
            instancing: Instancing::Static,
        }
    }

    /// Create an input template, placed on the left
    pub fn input(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, PortDirection::Input)
    }

    /// Create an output template, placed on the right
    pub fn output(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, PortDirection::Output)
    }

    /// Set the data type
    pub fn with_data_type(mut self, data_type: impl Into<DataType>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    /// Set the placement
    pub fn with_placement(mut self, placement: impl Into<PortPlacement>) -> Self {
        self.placement = placement.into();
        self
    }

    /// Set the connection limit
    pub fn with_max_connections(mut self, max: Capacity) -> Self {
        self.max_connections = max;
        self
    }

    /// Remove the connection limit
    pub fn unlimited(self) -> Self {
        self.with_max_connections(Capacity::Unlimited)
    }

    /// Attach a compatibility predicate that replaces the data type rule
    pub fn with_can_connect<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&crate::compatibility::ConnectContext<'_>) -> bool + Send + Sync + 'static,
    {
        let predicate: Arc<dyn Fn(&crate::compatibility::ConnectContext<'_>) -> bool + Send + Sync> =
            Arc::new(predicate);
        self.can_connect = Some(predicate.into());
        self
    }

    /// Make this template dynamic
    pub fn dynamic(mut self, instancing: DynamicPorts) -> Self {
        self.instancing = Instancing::Dynamic(instancing);
        self
    }

    /// Expand into concrete ports for `node`.
    ///
    /// Dynamic counts are clamped into `0..=max_instances`.
    pub fn instantiate(&self, node: &Node, max_instances: usize) -> Vec<Port> {
        match &self.instancing {
            Instancing::Static => vec![self.make_port(node, PortId::new(self.id.clone()), self.label.clone(), None)],
            Instancing::Dynamic(dynamic) => {
                let ctx = InstanceContext {
                    node,
                    template_id: &self.id,
                };
                let raw = dynamic.count(&ctx);
                let limit = i64::try_from(max_instances).unwrap_or(i64::MAX);
                let count = raw.clamp(0, limit);
                if count != raw {
                    tracing::debug!(
                        node = %node.id,
                        template = %self.id,
                        requested = raw,
                        clamped = count,
                        "Clamped dynamic port instance count"
                    );
                }
                // `count` is within 0..=max_instances here
                let count = usize::try_from(count).unwrap_or(0);
                (0..count)
                    .map(|index| {
                        let id = match &dynamic.create_port_id {
                            Some(f) => (f.get())(index),
                            None => PortId::new(format!("{}-{}", self.id, index)),
                        };
                        let label = match &dynamic.create_port_label {
                            Some(f) => (f.get())(index),
                            None => format!("{} {}", self.label, index + 1),
                        };
                        self.make_port(node, id, label, Some(index))
                    })
                    .collect()
            }
        }
    }

    fn make_port(&self, node: &Node, id: PortId, label: String, instance: Option<usize>) -> Port {
        Port {
            id,
            node_id: node.id.clone(),
            direction: self.direction,
            label,
            placement: self.placement.clone(),
            data_type: self.data_type.clone(),
            max_connections: self.max_connections,
            can_connect: self.can_connect.clone(),
            template_id: self.id.clone(),
            instance,
        }
    }
}

/// Expand every template of a node type into concrete ports.
///
/// Port IDs stay unique per node: a later port whose ID was already produced
/// is dropped.
pub fn expand_templates(node: &Node, templates: &[PortTemplate], max_instances: usize) -> Vec<Port> {
    let mut seen = HashSet::new();
    let mut ports = Vec::new();
    for template in templates {
        for port in template.instantiate(node, max_instances) {
            if seen.insert(port.id.clone()) {
                ports.push(port);
            } else {
                tracing::warn!(
                    node = %node.id,
                    port = %port.id,
                    template = %template.id,
                    "Dropping port with duplicate ID"
                );
            }
        }
    }
    ports
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node_with_count(count: i64) -> Node {
        Node::new("n1", "sum").with_data("inputs", json!(count))
    }

    #[test]
    fn test_data_type_intersection() {
        let number = DataType::from("number");
        let numeric = DataType::from(&["number", "integer"][..]);
        let text = DataType::from("string");
        assert!(number.intersects(&numeric));
        assert!(numeric.intersects(&number));
        assert!(!number.intersects(&text));
        assert!(!DataType::Many(Vec::new()).intersects(&number));
    }

    #[test]
    fn test_capacity_admits() {
        assert!(Capacity::default().admits(0));
        assert!(!Capacity::default().admits(1));
        assert!(Capacity::Limited(3).admits(2));
        assert!(!Capacity::Limited(0).admits(0));
        assert!(Capacity::Unlimited.admits(10_000));
    }

    #[test]
    fn test_capacity_serialization() {
        let unlimited = ron::to_string(&Capacity::Unlimited).unwrap();
        assert_eq!(ron::from_str::<Capacity>(&unlimited).unwrap(), Capacity::Unlimited);
        assert_eq!(ron::from_str::<Capacity>("4").unwrap(), Capacity::Limited(4));
        assert!(ron::from_str::<Capacity>("\"lots\"").is_err());
    }

    #[test]
    fn test_static_template() {
        let node = Node::new("n1", "constant");
        let template = PortTemplate::output("value", "Value").with_data_type("number");
        let ports = template.instantiate(&node, 64);
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].id, PortId::from("value"));
        assert_eq!(ports[0].node_id, NodeId::from("n1"));
        assert!(ports[0].instance.is_none());
    }

    #[test]
    fn test_dynamic_ids_are_deterministic() {
        let template = PortTemplate::input("in", "Input").dynamic(DynamicPorts::from_data_key("inputs", 2));
        let first = template.instantiate(&node_with_count(3), 64);
        let second = template.instantiate(&node_with_count(3), 64);
        let ids: Vec<_> = first.iter().map(|p| p.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["in-0", "in-1", "in-2"]);
        assert_eq!(first[2].label, "Input 3");
        assert_eq!(first[1].instance, Some(1));
        assert!(first.iter().zip(&second).all(|(a, b)| a.id == b.id));

        // Shrinking keeps the surviving prefix
        let shrunk = template.instantiate(&node_with_count(2), 64);
        assert_eq!(shrunk.len(), 2);
        assert_eq!(shrunk[1].id, first[1].id);
    }

    #[test]
    fn test_dynamic_count_is_clamped() {
        let template = PortTemplate::input("in", "Input").dynamic(DynamicPorts::from_data_key("inputs", 0));
        assert!(template.instantiate(&node_with_count(-5), 64).is_empty());
        assert_eq!(template.instantiate(&node_with_count(500), 8).len(), 8);
        // Missing key falls back to the default
        assert!(template.instantiate(&Node::new("n2", "sum"), 64).is_empty());
    }

    #[test]
    fn test_custom_generators() {
        let template = PortTemplate::output("out", "Out").dynamic(
            DynamicPorts::fixed(2)
                .with_port_id(|i| PortId::new(format!("channel_{i}")))
                .with_port_label(|i| format!("Channel {}", (b'A' + i as u8) as char)),
        );
        let ports = template.instantiate(&Node::new("n1", "split"), 64);
        assert_eq!(ports[0].id, PortId::from("channel_0"));
        assert_eq!(ports[1].label, "Channel B");
    }

    #[test]
    fn test_duplicate_ids_are_dropped() {
        let node = Node::new("n1", "dup");
        let templates = vec![
            PortTemplate::input("a", "A"),
            PortTemplate::input("a", "A again"),
            PortTemplate::output("b", "B"),
        ];
        let ports = expand_templates(&node, &templates, 64);
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].label, "A");
    }
}
