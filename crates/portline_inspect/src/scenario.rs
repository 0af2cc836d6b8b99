// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scenario files: node types, a graph, and connection attempts to evaluate.

use portline_graph::definition::{DefinitionError, NodeTypeDef};
use portline_graph::graphs::dataflow::create_dataflow_registry;
use portline_graph::{Connection, EngineConfig, Graph, GraphError, GraphStore, Node, NodeRegistry, PortRef};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};

/// Current scenario file format version
pub const SCENARIO_FORMAT_VERSION: u32 = 1;

/// Errors while loading or running a scenario
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    /// Reading the scenario file failed
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The scenario is not valid RON
    #[error("Scenario parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The scenario was written by a newer tool
    #[error("Scenario version {found} is newer than supported version {supported}")]
    Version {
        /// Version in the file
        found: u32,
        /// Highest supported version
        supported: u32,
    },

    /// A node type definition is invalid
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// A stored connection could not be inserted
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// JSON output failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A stored connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// Source endpoint
    pub from: PortRef,
    /// Target endpoint
    pub to: PortRef,
}

/// A connection to evaluate, and optionally commit when allowed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    /// Source endpoint
    pub from: PortRef,
    /// Target endpoint
    pub to: PortRef,
    /// Store the connection if it is allowed, so later attempts see it
    #[serde(default)]
    pub commit: bool,
}

/// Scenario file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// File format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Engine configuration
    #[serde(default)]
    pub config: EngineConfig,
    /// Node types; the built-in dataflow set when empty
    #[serde(default)]
    pub node_types: Vec<NodeTypeDef>,
    /// Nodes
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Stored connections, inserted without validation
    #[serde(default)]
    pub links: Vec<Link>,
    /// Connection attempts, evaluated in order
    #[serde(default)]
    pub attempts: Vec<Attempt>,
}

fn default_version() -> u32 {
    SCENARIO_FORMAT_VERSION
}

impl Scenario {
    /// Parse a scenario from RON text
    pub fn from_ron_str(text: &str) -> Result<Self, InspectError> {
        let scenario: Scenario = ron::from_str(text)?;
        if scenario.version > SCENARIO_FORMAT_VERSION {
            return Err(InspectError::Version {
                found: scenario.version,
                supported: SCENARIO_FORMAT_VERSION,
            });
        }
        Ok(scenario)
    }

    /// Load a scenario file
    pub fn load(path: &Path) -> Result<Self, InspectError> {
        let text = std::fs::read_to_string(path).map_err(|source| InspectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scenario = Self::from_ron_str(&text)?;
        tracing::info!(
            path = %path.display(),
            nodes = scenario.nodes.len(),
            attempts = scenario.attempts.len(),
            "Loaded scenario"
        );
        Ok(scenario)
    }

    /// Built-in scenario over the dataflow node set
    pub fn builtin() -> Self {
        let link = |from: (&str, &str), to: (&str, &str)| Link {
            from: PortRef::new(from.0, from.1),
            to: PortRef::new(to.0, to.1),
        };
        let attempt = |from: (&str, &str), to: (&str, &str), commit: bool| Attempt {
            from: PortRef::new(from.0, from.1),
            to: PortRef::new(to.0, to.1),
            commit,
        };
        Self {
            version: SCENARIO_FORMAT_VERSION,
            config: EngineConfig::default(),
            node_types: Vec::new(),
            nodes: vec![
                Node::new("a", "constant").with_position(0.0, 0.0),
                Node::new("b", "constant").with_position(0.0, 100.0),
                Node::new("label", "text").with_position(0.0, 200.0),
                Node::new("sum", "sum").with_position(250.0, 0.0).with_data("inputs", json!(3)),
                Node::new("out", "display").with_position(500.0, 0.0),
                Node::new("tap", "probe").with_position(500.0, 200.0).with_size(140.0, 60.0),
                Node::new("merge", "junction").with_position(250.0, 200.0),
            ],
            links: vec![
                link(("a", "value"), ("sum", "in-0")),
                link(("b", "value"), ("sum", "in-1")),
                link(("sum", "result"), ("out", "value")),
                link(("label", "value"), ("out", "caption")),
                // Left over from when the sum had more inputs
                link(("a", "value"), ("sum", "in-4")),
            ],
            attempts: vec![
                attempt(("b", "value"), ("sum", "in-1"), false),
                attempt(("label", "value"), ("sum", "in-2"), false),
                attempt(("label", "value"), ("out", "trigger"), false),
                attempt(("a", "value"), ("sum", "in-2"), true),
                attempt(("b", "value"), ("sum", "in-2"), false),
                attempt(("a", "value"), ("merge", "a"), true),
                attempt(("b", "value"), ("merge", "b"), true),
                attempt(("merge", "out"), ("tap", "in"), true),
                attempt(("label", "value"), ("merge", "b"), false),
            ],
        }
    }

    /// Node registry for this scenario
    pub fn registry(&self) -> Result<NodeRegistry, InspectError> {
        if self.node_types.is_empty() {
            Ok(create_dataflow_registry())
        } else {
            Ok(NodeRegistry::from_definitions(&self.node_types)?)
        }
    }

    /// Build the host store with nodes and stored links
    pub fn build_store(&self) -> Result<GraphStore, InspectError> {
        let mut graph = Graph::new();
        for node in &self.nodes {
            graph.add_node(node.clone());
        }
        for link in &self.links {
            graph.insert_connection(Connection::new(link.from.clone(), link.to.clone()))?;
        }
        Ok(GraphStore::with_graph(graph, self.registry()?, self.config.clone()))
    }
}
