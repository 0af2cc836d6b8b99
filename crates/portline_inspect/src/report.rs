// SPDX-License-Identifier: MIT OR Apache-2.0
//! Run a scenario through the engine and describe the result.

use crate::scenario::{InspectError, Scenario};
use portline_graph::compatibility::can_connect_refs;
use portline_graph::placement::RenderPosition;
use portline_graph::{
    ConnectionCurve, ConnectionDecision, ConnectionId, GraphHost, GraphStore, Point, PortDirection, PortRef, Side,
};
use serde::Serialize;
use std::fmt;

/// One resolved port
#[derive(Debug, Clone, Serialize)]
pub struct PortRow {
    /// The port
    pub port: PortRef,
    /// Port direction
    pub direction: PortDirection,
    /// Display label
    pub label: String,
    /// Node-local anchor
    pub render_position: RenderPosition,
    /// Graph-space curve endpoint
    pub connection_point: Point,
    /// Exit side
    pub side: Side,
    /// Live connections on the port
    pub connections: usize,
}

/// One drawable connection
#[derive(Debug, Clone, Serialize)]
pub struct CurveRow {
    /// Connection ID
    pub id: ConnectionId,
    /// Source endpoint
    pub from: PortRef,
    /// Target endpoint
    pub to: PortRef,
    /// SVG path
    pub path: String,
    /// Approximate length
    pub length: f32,
}

/// Outcome of one connection attempt
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRow {
    /// Source endpoint
    pub from: PortRef,
    /// Target endpoint
    pub to: PortRef,
    /// Engine decision
    pub decision: ConnectionDecision,
    /// Whether the connection was stored
    pub committed: bool,
}

/// Everything the inspector prints
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Resolved ports after all attempts
    pub ports: Vec<PortRow>,
    /// Live connections after all attempts
    pub curves: Vec<CurveRow>,
    /// Stored connections with a missing endpoint
    pub dangling: Vec<ConnectionId>,
    /// Attempt outcomes, in order
    pub attempts: Vec<AttemptRow>,
}

impl Report {
    /// Evaluate every attempt, then capture layout and curves
    pub fn run(scenario: &Scenario) -> Result<Self, InspectError> {
        let mut store = scenario.build_store()?;
        let attempts = scenario
            .attempts
            .iter()
            .map(|attempt| {
                let decision = can_connect_refs(&attempt.from, &attempt.to, &store.snapshot());
                let committed = attempt.commit && decision.is_allowed() && store.connect(&attempt.from, &attempt.to).is_ok();
                AttemptRow {
                    from: attempt.from.clone(),
                    to: attempt.to.clone(),
                    decision,
                    committed,
                }
            })
            .collect();
        Ok(Self::capture(&store, attempts))
    }

    fn capture(store: &GraphStore, attempts: Vec<AttemptRow>) -> Self {
        let snapshot = store.snapshot();
        let layout = snapshot.layout();
        let style = &snapshot.config().curve;

        let ports = layout
            .iter()
            .filter_map(|(port_ref, resolved)| {
                let port = snapshot.port(&port_ref)?;
                Some(PortRow {
                    direction: port.direction,
                    label: port.label.clone(),
                    render_position: resolved.render_position,
                    connection_point: resolved.connection_point,
                    side: resolved.side,
                    connections: snapshot.connection_count(&port_ref),
                    port: port_ref,
                })
            })
            .collect();

        let curves = snapshot
            .live_connections()
            .filter_map(|connection| {
                let curve = ConnectionCurve::for_connection(connection, &layout, style)?;
                Some(CurveRow {
                    id: connection.id.clone(),
                    from: connection.source(),
                    to: connection.target(),
                    path: curve.path(),
                    length: curve.length(style),
                })
            })
            .collect();

        let dangling = snapshot.dangling_connections().map(|c| c.id.clone()).collect();

        Self {
            ports,
            curves,
            dangling,
            attempts,
        }
    }

    /// Pretty JSON
    pub fn to_json(&self) -> Result<String, InspectError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Human-readable text
impl fmt::Display for Report {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(out, "Ports ({})", self.ports.len())?;
        for row in &self.ports {
            writeln!(
                out,
                "  {:<20} {:<6} {:<6} local ({:.1}, {:.1}) {}  point ({:.1}, {:.1})  links {}",
                row.port.to_string(),
                format!("{:?}", row.direction).to_lowercase(),
                format!("{:?}", row.side).to_lowercase(),
                row.render_position.x,
                row.render_position.y,
                row.render_position.transform.to_css(),
                row.connection_point.x,
                row.connection_point.y,
                row.connections,
            )?;
        }

        writeln!(out, "\nConnections ({})", self.curves.len())?;
        for row in &self.curves {
            writeln!(out, "  {} -> {}  length {:.1}", row.from, row.to, row.length)?;
            writeln!(out, "    {}", row.path)?;
        }

        if !self.dangling.is_empty() {
            writeln!(out, "\nDangling ({})", self.dangling.len())?;
            for id in &self.dangling {
                writeln!(out, "  {id}")?;
            }
        }

        writeln!(out, "\nAttempts ({})", self.attempts.len())?;
        for row in &self.attempts {
            let outcome = match row.decision {
                ConnectionDecision::Allowed if row.committed => "allowed, committed".to_string(),
                ConnectionDecision::Allowed => "allowed".to_string(),
                ConnectionDecision::Rejected(kind) => format!("rejected: {kind}"),
            };
            writeln!(out, "  {} -> {}  {}", row.from, row.to, outcome)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portline_graph::RejectionKind;

    #[test]
    fn test_builtin_report() {
        let report = Report::run(&Scenario::builtin()).unwrap();
        let reasons: Vec<_> = report.attempts.iter().map(|a| a.decision.reason()).collect();
        assert_eq!(
            reasons,
            vec![
                Some(RejectionKind::Capacity),
                Some(RejectionKind::DataType),
                Some(RejectionKind::Predicate),
                None,
                Some(RejectionKind::Capacity),
                None,
                None,
                None,
                Some(RejectionKind::NodeValidation),
            ]
        );
        assert!(report.attempts[3].committed);
        assert_eq!(report.dangling.len(), 1);
        // 4 stored live links plus 4 committed attempts
        assert_eq!(report.curves.len(), 8);
        assert!(report.curves.iter().all(|c| c.path.starts_with("M ")));
    }

    #[test]
    fn test_outputs() {
        let report = Report::run(&Scenario::builtin()).unwrap();
        let text = report.to_string();
        assert!(text.contains("rejected: capacity"));
        assert!(text.contains("allowed, committed"));
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["attempts"][0]["decision"]["reason"], "capacity");
    }
}
