// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection compatibility.
//!
//! A proposed connection is checked in four layers, cheapest and most
//! universal first:
//! 1. Data types: the two type sets must intersect, unless either is a wildcard
//! 2. Port predicates: a port's `can_connect` replaces the data type outcome
//! 3. Capacity: neither port may already be at its connection limit
//! 4. Node validators: each endpoint's node type may veto
//!
//! The first failing layer decides the reported [`RejectionKind`]. A predicate
//! refusal of a pair the type rule also refuses reports
//! [`RejectionKind::DataType`], so a predicate that only passes the type
//! outcome through behaves exactly like no predicate.

use crate::callback::Callback;
use crate::connection::PortRef;
use crate::node::Node;
use crate::port::{DataType, Port};
use crate::snapshot::GraphSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a connection was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectionKind {
    /// An endpoint port does not exist in the snapshot
    MissingPort,
    /// The data types do not overlap
    DataType,
    /// A port predicate refused a pair the type rule accepts
    Predicate,
    /// A port is already at its connection limit
    Capacity,
    /// A node type validator refused
    NodeValidation,
}

impl RejectionKind {
    /// Stable machine-readable name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingPort => "missingPort",
            Self::DataType => "dataType",
            Self::Predicate => "predicate",
            Self::Capacity => "capacity",
            Self::NodeValidation => "nodeValidation",
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a compatibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "outcome", content = "reason")]
pub enum ConnectionDecision {
    /// The connection may be created
    Allowed,
    /// The connection is refused
    Rejected(RejectionKind),
}

impl ConnectionDecision {
    /// Whether the connection may be created
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Rejection reason, if any
    pub fn reason(self) -> Option<RejectionKind> {
        match self {
            Self::Allowed => None,
            Self::Rejected(kind) => Some(kind),
        }
    }
}

/// Context handed to a port's `can_connect` predicate
#[derive(Debug, Clone, Copy)]
pub struct ConnectContext<'a> {
    /// Source port
    pub from_port: &'a Port,
    /// Target port
    pub to_port: &'a Port,
    /// Source node
    pub from_node: &'a Node,
    /// Target node
    pub to_node: &'a Node,
    /// Outcome of the default data type rule
    pub data_type_compatible: bool,
    /// The graph being edited
    pub snapshot: &'a GraphSnapshot<'a>,
}

/// Context handed to a node type's validator
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Source port
    pub from_port: &'a Port,
    /// Target port
    pub to_port: &'a Port,
    /// The node whose type is validating
    pub node: &'a Node,
    /// The graph being edited
    pub snapshot: &'a GraphSnapshot<'a>,
}

/// Port-level predicate that replaces the data type rule
pub type ConnectPredicate = Callback<dyn Fn(&ConnectContext<'_>) -> bool + Send + Sync>;

/// Node-level veto, evaluated after every other check passed
pub type ConnectionValidator = Callback<dyn Fn(&ValidationContext<'_>) -> bool + Send + Sync>;

/// Default data type rule: a missing type is a wildcard, otherwise the sets
/// must share a name
pub fn data_types_compatible(a: Option<&DataType>, b: Option<&DataType>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.intersects(b),
        _ => true,
    }
}

/// Decide whether a connection from `from` to `to` may be created
pub fn can_create_connection(from: &Port, to: &Port, snapshot: &GraphSnapshot<'_>) -> ConnectionDecision {
    let decision = evaluate(from, to, snapshot);
    if let ConnectionDecision::Rejected(kind) = decision {
        tracing::trace!(from = %from.port_ref(), to = %to.port_ref(), reason = %kind, "Connection rejected");
    }
    decision
}

/// Like [`can_create_connection`], looking both ports up in the snapshot
pub fn can_connect_refs(from: &PortRef, to: &PortRef, snapshot: &GraphSnapshot<'_>) -> ConnectionDecision {
    match (snapshot.port(from), snapshot.port(to)) {
        (Some(from), Some(to)) => can_create_connection(from, to, snapshot),
        _ => {
            tracing::trace!(%from, %to, "Connection rejected, endpoint missing");
            ConnectionDecision::Rejected(RejectionKind::MissingPort)
        }
    }
}

fn evaluate(from: &Port, to: &Port, snapshot: &GraphSnapshot<'_>) -> ConnectionDecision {
    let from_ref = from.port_ref();
    let to_ref = to.port_ref();
    if !snapshot.contains_port(&from_ref) || !snapshot.contains_port(&to_ref) {
        return ConnectionDecision::Rejected(RejectionKind::MissingPort);
    }
    let (Some(from_node), Some(to_node)) = (snapshot.node(&from.node_id), snapshot.node(&to.node_id)) else {
        return ConnectionDecision::Rejected(RejectionKind::MissingPort);
    };

    // Data types, possibly replaced by predicates
    let data_type_compatible = data_types_compatible(from.data_type.as_ref(), to.data_type.as_ref());
    let ctx = ConnectContext {
        from_port: from,
        to_port: to,
        from_node,
        to_node,
        data_type_compatible,
        snapshot,
    };
    let predicates: Vec<&ConnectPredicate> = [&from.can_connect, &to.can_connect]
        .into_iter()
        .flatten()
        .collect();
    if predicates.is_empty() {
        if !data_type_compatible {
            return ConnectionDecision::Rejected(RejectionKind::DataType);
        }
    } else if !predicates.iter().all(|p| (p.get())(&ctx)) {
        // A refusal that agrees with the type rule is a type rejection
        let kind = if data_type_compatible {
            RejectionKind::Predicate
        } else {
            RejectionKind::DataType
        };
        return ConnectionDecision::Rejected(kind);
    }

    // Capacity
    if !from.max_connections.admits(snapshot.connection_count(&from_ref))
        || !to.max_connections.admits(snapshot.connection_count(&to_ref))
    {
        return ConnectionDecision::Rejected(RejectionKind::Capacity);
    }

    // Node validators, once per distinct node
    let mut nodes = vec![from_node];
    if to_node.id != from_node.id {
        nodes.push(to_node);
    }
    for node in nodes {
        let Some(validator) = snapshot
            .registry()
            .get(&node.node_type)
            .and_then(|t| t.validate_connection.as_ref())
        else {
            continue;
        };
        let ctx = ValidationContext {
            from_port: from,
            to_port: to,
            node,
            snapshot,
        };
        if !(validator.get())(&ctx) {
            return ConnectionDecision::Rejected(RejectionKind::NodeValidation);
        }
    }

    ConnectionDecision::Allowed
}
