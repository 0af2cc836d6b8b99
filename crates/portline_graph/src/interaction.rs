// SPDX-License-Identifier: MIT OR Apache-2.0
//! Drag-to-connect gesture handling.
//!
//! The gesture is an explicit state machine:
//!
//! ```text
//! Idle -> Dragging(origin) -> CandidateFound(target) | NoCandidate -> Committed | Cancelled
//! ```
//!
//! Hover evaluation only reads the snapshot. A pointer-up over a valid
//! candidate is the single path that asks the host to create a connection.
//! Every gesture ends back in `Idle`.

use crate::compatibility::{self, ConnectionDecision, RejectionKind};
use crate::connection::{Connection, PortRef};
use crate::curve::CubicBezier;
use crate::geometry::Point;
use crate::host::GraphHost;
use crate::placement::PortLayout;
use crate::port::PortDirection;
use crate::snapshot::GraphSnapshot;
use serde::{Deserialize, Serialize};

/// Coarse phase of the gesture, for display and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GesturePhase {
    /// No gesture
    Idle,
    /// Dragging, no pointer move sampled yet
    Dragging,
    /// Hovering a port that would accept the connection
    CandidateFound,
    /// Hovering nothing, or a port that would refuse
    NoCandidate,
}

/// What the pointer is over during a drag
#[derive(Debug, Clone, PartialEq)]
pub enum Hover {
    /// No move sampled since the drag started
    Pending,
    /// Not over a valid target
    NoCandidate {
        /// Port under the pointer, if any
        hovered: Option<PortRef>,
        /// Why that port would refuse
        reason: Option<RejectionKind>,
    },
    /// Over a port that would accept the connection
    Candidate(PortRef),
}

/// An in-flight drag
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDrag {
    /// Port the drag started from
    pub origin: PortRef,
    /// Direction of the origin port
    pub origin_direction: PortDirection,
    /// Last pointer position in graph space
    pub pointer: Point,
    /// Hover state
    pub hover: Hover,
}

/// Why a gesture ended without a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CancelReason {
    /// Cancelled by the host (e.g. the pointer left the canvas)
    Explicit,
    /// Released over nothing, or over the origin itself
    NoTarget,
    /// Released over a port that refused
    Rejected(RejectionKind),
    /// The origin port disappeared mid-drag
    OriginRemoved,
    /// The host refused to store the connection
    HostRefused,
}

/// Result of feeding one event to the machine
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The event does not apply in the current state
    Ignored,
    /// A drag started from this port
    Started(PortRef),
    /// The hovered port is a valid candidate
    CandidateFound(PortRef),
    /// No valid candidate under the pointer
    NoCandidate(Option<RejectionKind>),
    /// The connection was created
    Committed(Connection),
    /// The gesture ended without a mutation
    Cancelled(CancelReason),
}

/// Highlight a port should show while a drag is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PortHighlight {
    /// No drag, or nothing to say
    #[default]
    None,
    /// The drag started here
    Origin,
    /// Hovered and would accept
    Candidate,
    /// Not hovered, would accept
    Connectable,
    /// Would refuse
    Incompatible,
}

/// UI feedback for one port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortFeedback {
    /// Drag highlight
    pub highlight: PortHighlight,
    /// Whether the port already has a live connection
    pub connected: bool,
}

/// Drag-to-connect state machine
#[derive(Debug, Clone, Default)]
pub struct ConnectionInteraction {
    drag: Option<ActiveDrag>,
}

impl ConnectionInteraction {
    /// Create an idle machine
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase
    pub fn phase(&self) -> GesturePhase {
        match &self.drag {
            None => GesturePhase::Idle,
            Some(drag) => match drag.hover {
                Hover::Pending => GesturePhase::Dragging,
                Hover::NoCandidate { .. } => GesturePhase::NoCandidate,
                Hover::Candidate(_) => GesturePhase::CandidateFound,
            },
        }
    }

    /// Whether a drag is active
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// The active drag, if any
    pub fn drag(&self) -> Option<&ActiveDrag> {
        self.drag.as_ref()
    }

    /// Pointer pressed on a port's connection point
    pub fn pointer_down(&mut self, port: &PortRef, pointer: Point, snapshot: &GraphSnapshot<'_>) -> Transition {
        if self.drag.is_some() {
            return Transition::Ignored;
        }
        let Some(origin) = snapshot.port(port) else {
            tracing::debug!(%port, "Drag started on a missing port");
            return Transition::Ignored;
        };
        self.drag = Some(ActiveDrag {
            origin: port.clone(),
            origin_direction: origin.direction,
            pointer,
            hover: Hover::Pending,
        });
        Transition::Started(port.clone())
    }

    /// Pointer moved; `hovered` is the port under the pointer, if any
    pub fn pointer_move(&mut self, pointer: Point, hovered: Option<&PortRef>, snapshot: &GraphSnapshot<'_>) -> Transition {
        let Some(drag) = self.drag.as_mut() else {
            return Transition::Ignored;
        };
        if !snapshot.contains_port(&drag.origin) {
            tracing::debug!(origin = %drag.origin, "Origin port disappeared, cancelling drag");
            self.drag = None;
            return Transition::Cancelled(CancelReason::OriginRemoved);
        }
        drag.pointer = pointer;

        let target = hovered.filter(|target| **target != drag.origin);
        let (hover, transition) = match target {
            None => (
                Hover::NoCandidate {
                    hovered: None,
                    reason: None,
                },
                Transition::NoCandidate(None),
            ),
            Some(target) => {
                let (from, to) = orient(&drag.origin, drag.origin_direction, target, snapshot);
                match compatibility::can_connect_refs(from, to, snapshot) {
                    ConnectionDecision::Allowed => (Hover::Candidate(target.clone()), Transition::CandidateFound(target.clone())),
                    ConnectionDecision::Rejected(kind) => (
                        Hover::NoCandidate {
                            hovered: Some(target.clone()),
                            reason: Some(kind),
                        },
                        Transition::NoCandidate(Some(kind)),
                    ),
                }
            }
        };
        drag.hover = hover;
        transition
    }

    /// Pointer released; commits when `hovered` is a valid candidate
    pub fn pointer_up<H>(&mut self, hovered: Option<&PortRef>, host: &mut H) -> Transition
    where
        H: GraphHost + ?Sized,
    {
        let Some(drag) = self.drag.take() else {
            return Transition::Ignored;
        };

        let endpoints = drop_endpoints(&drag, hovered, &host.snapshot());

        match endpoints {
            Ok((from, to)) => {
                let connection = Connection::new(from, to);
                match host.create_connection(connection.clone()) {
                    Ok(_) => Transition::Committed(connection),
                    Err(err) => {
                        tracing::warn!(%err, "Host refused connection");
                        Transition::Cancelled(CancelReason::HostRefused)
                    }
                }
            }
            Err(reason) => Transition::Cancelled(reason),
        }
    }

    /// Abandon the gesture
    pub fn cancel(&mut self) -> Transition {
        match self.drag.take() {
            Some(_) => Transition::Cancelled(CancelReason::Explicit),
            None => Transition::Ignored,
        }
    }

    /// Feedback for one port against the current gesture
    pub fn port_feedback(&self, port: &PortRef, snapshot: &GraphSnapshot<'_>) -> PortFeedback {
        let connected = snapshot.is_connected(port);
        let Some(drag) = &self.drag else {
            return PortFeedback {
                highlight: PortHighlight::None,
                connected,
            };
        };
        let highlight = if *port == drag.origin {
            PortHighlight::Origin
        } else {
            let (from, to) = orient(&drag.origin, drag.origin_direction, port, snapshot);
            match compatibility::can_connect_refs(from, to, snapshot) {
                ConnectionDecision::Allowed if drag.hover == Hover::Candidate(port.clone()) => PortHighlight::Candidate,
                ConnectionDecision::Allowed => PortHighlight::Connectable,
                ConnectionDecision::Rejected(_) => PortHighlight::Incompatible,
            }
        };
        PortFeedback { highlight, connected }
    }

    /// Curve from the origin anchor to the pointer, snapped to a candidate's
    /// anchor. Drawn output to input.
    pub fn preview_curve(&self, snapshot: &GraphSnapshot<'_>, layout: &PortLayout) -> Option<CubicBezier> {
        let drag = self.drag.as_ref()?;
        let origin = layout.get(&drag.origin)?;
        let (end, end_side) = match &drag.hover {
            Hover::Candidate(target) => match layout.get(target) {
                Some(resolved) => (resolved.connection_point, resolved.side),
                None => (drag.pointer, origin.side.opposite()),
            },
            _ => (drag.pointer, origin.side.opposite()),
        };
        let style = &snapshot.config().curve;
        Some(match drag.origin_direction {
            PortDirection::Output => CubicBezier::between(style, origin.connection_point, end, origin.side, end_side),
            PortDirection::Input => CubicBezier::between(style, end, origin.connection_point, end_side, origin.side),
        })
    }
}

/// Validate a release against a fresh snapshot, returning oriented endpoints
fn drop_endpoints(
    drag: &ActiveDrag,
    hovered: Option<&PortRef>,
    snapshot: &GraphSnapshot<'_>,
) -> Result<(PortRef, PortRef), CancelReason> {
    if !snapshot.contains_port(&drag.origin) {
        return Err(CancelReason::OriginRemoved);
    }
    let target = hovered
        .filter(|target| **target != drag.origin)
        .ok_or(CancelReason::NoTarget)?;
    let (from, to) = orient(&drag.origin, drag.origin_direction, target, snapshot);
    match compatibility::can_connect_refs(from, to, snapshot) {
        ConnectionDecision::Allowed => Ok((from.clone(), to.clone())),
        ConnectionDecision::Rejected(kind) => Err(CancelReason::Rejected(kind)),
    }
}

/// Order a (origin, target) pair as (from, to): a drag from an input dropped
/// on an output connects output to input.
fn orient<'p>(
    origin: &'p PortRef,
    origin_direction: PortDirection,
    target: &'p PortRef,
    snapshot: &GraphSnapshot<'_>,
) -> (&'p PortRef, &'p PortRef) {
    let target_is_output = snapshot.port(target).is_some_and(|p| p.is_output());
    if origin_direction == PortDirection::Input && target_is_output {
        (target, origin)
    } else {
        (origin, target)
    }
}
