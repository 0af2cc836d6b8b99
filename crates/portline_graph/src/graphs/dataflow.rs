// SPDX-License-Identifier: MIT OR Apache-2.0
//! Small dataflow node set.
//!
//! Covers each placement mode and every compatibility layer: typed and
//! wildcard ports, dynamic instancing, segments, percent anchors, an
//! unlimited output and a node-level connection cap.

use crate::node::{NodeRegistry, NodeType};
use crate::placement::{PortPlacement, Side, SidePlacement};
use crate::port::{DynamicPorts, PortId, PortTemplate};

/// Live connections a junction accepts across all of its ports
pub const JUNCTION_MAX_CONNECTIONS: usize = 3;

/// Create the dataflow node registry
pub fn create_dataflow_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    // ========================================================================
    // Sources
    // ========================================================================

    registry.register(
        NodeType::new("constant", "Constant")
            .with_description("Emits a fixed number")
            .with_default_size(120.0, 60.0)
            .with_port(PortTemplate::output("value", "Value").with_data_type("number").unlimited()),
    );

    registry.register(
        NodeType::new("text", "Text")
            .with_description("Emits a fixed string")
            .with_default_size(120.0, 60.0)
            .with_port(PortTemplate::output("value", "Value").with_data_type("string").unlimited()),
    );

    // ========================================================================
    // Math
    // ========================================================================

    // Input count follows `data.inputs`
    registry.register(
        NodeType::new("sum", "Sum")
            .with_description("Adds any number of inputs")
            .with_default_size(140.0, 120.0)
            .with_port(
                PortTemplate::input("in", "Input")
                    .with_data_type(&["number", "integer"][..])
                    .dynamic(DynamicPorts::from_data_key("inputs", 2)),
            )
            .with_port(PortTemplate::output("result", "Result").with_data_type("number").unlimited()),
    );

    // ========================================================================
    // Routing
    // ========================================================================

    registry.register(
        NodeType::new("splitter", "Splitter")
            .with_description("Copies its input to several channels")
            .with_default_size(140.0, 100.0)
            .with_port(PortTemplate::input("in", "In"))
            .with_port(
                PortTemplate::output("channel", "Channel").dynamic(
                    DynamicPorts::from_data_key("channels", 2)
                        .with_port_id(|i| PortId::new(format!("channel_{i}")))
                        .with_port_label(|i| format!("Channel {}", char::from(b'A' + (i % 26) as u8))),
                ),
            ),
    );

    registry.register(
        NodeType::new("junction", "Junction")
            .with_description("Merges up to three links in total")
            .with_default_size(80.0, 80.0)
            .with_port(PortTemplate::input("a", "A").unlimited())
            .with_port(PortTemplate::input("b", "B").unlimited())
            .with_port(PortTemplate::output("out", "Out").unlimited())
            .with_max_total_connections(JUNCTION_MAX_CONNECTIONS),
    );

    // ========================================================================
    // Sinks
    // ========================================================================

    // Values on the main segment, the caption below it
    registry.register(
        NodeType::new("display", "Display")
            .with_description("Shows a value with an optional caption")
            .with_default_size(160.0, 120.0)
            .with_port(
                PortTemplate::input("value", "Value")
                    .with_data_type("number")
                    .with_placement(SidePlacement::new(Side::Left).in_segment("main", 0)),
            )
            .with_port(
                PortTemplate::input("caption", "Caption")
                    .with_data_type("string")
                    .with_placement(SidePlacement::new(Side::Left).in_segment("aux", 1)),
            )
            .with_port(
                PortTemplate::input("trigger", "Trigger")
                    .with_placement(SidePlacement::new(Side::Top).aligned(0.5))
                    .with_can_connect(|ctx| ctx.from_node.node_type != "text"),
            ),
    );

    // Output pinned to the bottom center, whatever the node size
    registry.register(
        NodeType::new("probe", "Probe")
            .with_description("Taps a value for inspection")
            .with_default_size(100.0, 60.0)
            .with_port(PortTemplate::input("in", "In").with_placement(SidePlacement::new(Side::Left).inset()))
            .with_port(PortTemplate::output("tap", "Tap").with_placement(PortPlacement::percent(50.0, 100.0))),
    );

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compatibility::{can_connect_refs, ConnectionDecision, RejectionKind};
    use crate::config::EngineConfig;
    use crate::connection::PortRef;
    use crate::geometry::{Point, Size};
    use crate::host::{GraphHost, GraphStore, HostError};
    use crate::node::{Node, NodeId};
    use serde_json::json;

    fn store() -> GraphStore {
        let mut store = GraphStore::new(create_dataflow_registry(), EngineConfig::default());
        store.add_node(Node::new("c1", "constant"));
        store.add_node(Node::new("c2", "constant"));
        store.add_node(Node::new("t", "text"));
        store.add_node(Node::new("sum", "sum").with_data("inputs", json!(3)));
        store.add_node(Node::new("split", "splitter"));
        store.add_node(Node::new("j", "junction"));
        store.add_node(Node::new("d", "display"));
        store.add_node(Node::new("p", "probe").with_position(0.0, 200.0));
        store
    }

    #[test]
    fn test_registry_contents() {
        let registry = create_dataflow_registry();
        for id in ["constant", "text", "sum", "splitter", "junction", "display", "probe"] {
            assert!(registry.get(id).is_some(), "missing {id}");
        }
    }

    #[test]
    fn test_splitter_channels() {
        let store = store();
        let snapshot = store.snapshot();
        let labels: Vec<_> = snapshot
            .ports(&NodeId::from("split"))
            .iter()
            .map(|p| (p.id.as_str().to_string(), p.label.clone()))
            .collect();
        assert_eq!(labels[1], ("channel_0".to_string(), "Channel A".to_string()));
        assert_eq!(labels[2], ("channel_1".to_string(), "Channel B".to_string()));
    }

    #[test]
    fn test_junction_cap() {
        let mut store = store();
        store.connect(&PortRef::new("c1", "value"), &PortRef::new("j", "a")).unwrap();
        store.connect(&PortRef::new("c2", "value"), &PortRef::new("j", "a")).unwrap();
        store.connect(&PortRef::new("j", "out"), &PortRef::new("sum", "in-0")).unwrap();
        assert!(matches!(
            store.connect(&PortRef::new("t", "value"), &PortRef::new("j", "b")),
            Err(HostError::Rejected(RejectionKind::NodeValidation))
        ));
    }

    #[test]
    fn test_junction_self_link_counts_once() {
        let mut store = store();
        store.connect(&PortRef::new("j", "out"), &PortRef::new("j", "a")).unwrap();
        store.connect(&PortRef::new("c1", "value"), &PortRef::new("j", "a")).unwrap();
        store.connect(&PortRef::new("c2", "value"), &PortRef::new("j", "b")).unwrap();
        assert_eq!(store.snapshot().node_connection_count(&NodeId::from("j")), 3);
        assert!(matches!(
            store.connect(&PortRef::new("t", "value"), &PortRef::new("j", "b")),
            Err(HostError::Rejected(RejectionKind::NodeValidation))
        ));
    }

    #[test]
    fn test_display_segments_and_predicate() {
        let store = store();
        let snapshot = store.snapshot();
        let layout = snapshot.layout();
        let value = layout.get(&PortRef::new("d", "value")).unwrap();
        let caption = layout.get(&PortRef::new("d", "caption")).unwrap();
        assert!(value.render_position.y < caption.render_position.y);
        assert_eq!(value.render_position.x, 0.0);

        let trigger = layout.get(&PortRef::new("d", "trigger")).unwrap();
        assert_eq!(trigger.local(), Point::new(80.0, 0.0));
        assert_eq!(trigger.side, Side::Top);

        // The trigger takes any source except text nodes
        assert_eq!(
            can_connect_refs(&PortRef::new("sum", "result"), &PortRef::new("d", "trigger"), &snapshot),
            ConnectionDecision::Allowed
        );
        assert_eq!(
            can_connect_refs(&PortRef::new("t", "value"), &PortRef::new("d", "trigger"), &snapshot),
            ConnectionDecision::Rejected(RejectionKind::Predicate)
        );
    }

    #[test]
    fn test_probe_tap_follows_size() {
        let mut store = store();
        let tap = PortRef::new("p", "tap");
        let before = store.snapshot().layout().get(&tap).map(|r| r.local());
        assert_eq!(before, Some(Point::new(50.0, 60.0)));
        store
            .graph_mut()
            .set_node_size(&NodeId::from("p"), Some(Size::new(200.0, 60.0)))
            .unwrap();
        let snapshot = store.snapshot();
        let layout = snapshot.layout();
        let after = layout.get(&tap).unwrap();
        assert_eq!(after.local(), Point::new(100.0, 60.0));
        assert_eq!(after.side, Side::Bottom);
        assert_eq!(after.connection_point, Point::new(100.0, 260.0));
    }
}
