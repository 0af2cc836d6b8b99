// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port placement: where each port sits on its node.
//!
//! Two placement kinds exist:
//! - `Side`: the port is distributed along one edge of the node, grouped into
//!   ordered segments that each own a proportional band of that edge.
//! - `Absolute`: the port sits at a fixed node-local offset, either in pixels
//!   or as a percentage of the node size.
//!
//! Resolution never fails. Anything that cannot be placed lands on the node
//! center so the rendering layer always gets coordinates.

use crate::callback::Callback;
use crate::config::PlacementConfig;
use crate::connection::PortRef;
use crate::geometry::{Point, Size};
use crate::node::{Node, NodeId};
use crate::port::{Port, PortId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Edge of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Left edge
    Left,
    /// Right edge
    Right,
    /// Top edge
    Top,
    /// Bottom edge
    Bottom,
}

impl Side {
    /// All sides in resolution order
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];

    /// The facing side
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
        }
    }

    /// Unit vector pointing away from the node through this side
    pub fn outward(self) -> Point {
        match self {
            Side::Left => Point::new(-1.0, 0.0),
            Side::Right => Point::new(1.0, 0.0),
            Side::Top => Point::new(0.0, -1.0),
            Side::Bottom => Point::new(0.0, 1.0),
        }
    }

    /// Left or right; ports on these sides are spread vertically
    pub fn is_vertical_edge(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

/// Placement along one side of the node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidePlacement {
    /// Edge the port sits on
    pub side: Side,
    /// Fractional position inside the segment band; evenly spaced when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<f32>,
    /// Segment key; ports without one share an implicit segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    /// Segment order along the side (ascending)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_order: Option<i32>,
    /// Relative share of the side given to the segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_span: Option<f32>,
    /// Pull the anchor inside the node instead of sitting on the edge
    #[serde(default)]
    pub inset: bool,
}

impl SidePlacement {
    /// Evenly spaced on `side`, in the implicit segment
    pub fn new(side: Side) -> Self {
        Self {
            side,
            align: None,
            segment: None,
            segment_order: None,
            segment_span: None,
            inset: false,
        }
    }

    /// Fixed fraction of the segment band
    pub fn aligned(mut self, align: f32) -> Self {
        self.align = Some(align);
        self
    }

    /// Put the port in a named segment
    pub fn in_segment(mut self, key: impl Into<String>, order: i32) -> Self {
        self.segment = Some(key.into());
        self.segment_order = Some(order);
        self
    }

    /// Relative band size of the segment
    pub fn with_span(mut self, span: f32) -> Self {
        self.segment_span = Some(span);
        self
    }

    /// Anchor inside the node
    pub fn inset(mut self) -> Self {
        self.inset = true;
        self
    }
}

/// Unit of an absolute placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementUnit {
    /// Node-local pixels
    #[default]
    Px,
    /// Percent (0-100) of the node size
    Percent,
}

/// Fixed node-local placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbsolutePlacement {
    /// Horizontal offset
    pub x: f32,
    /// Vertical offset
    pub y: f32,
    /// How `x` and `y` are interpreted
    #[serde(default)]
    pub unit: PlacementUnit,
}

/// Placement descriptor of a port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PortPlacement {
    /// Distributed along a side
    Side(SidePlacement),
    /// Fixed offset
    Absolute(AbsolutePlacement),
}

impl PortPlacement {
    /// Evenly spaced on a side
    pub fn side(side: Side) -> Self {
        Self::Side(SidePlacement::new(side))
    }

    /// Fixed pixel offset
    pub fn px(x: f32, y: f32) -> Self {
        Self::Absolute(AbsolutePlacement {
            x,
            y,
            unit: PlacementUnit::Px,
        })
    }

    /// Percentage offset that follows the node size
    pub fn percent(x: f32, y: f32) -> Self {
        Self::Absolute(AbsolutePlacement {
            x,
            y,
            unit: PlacementUnit::Percent,
        })
    }
}

impl From<SidePlacement> for PortPlacement {
    fn from(p: SidePlacement) -> Self {
        Self::Side(p)
    }
}

impl From<AbsolutePlacement> for PortPlacement {
    fn from(p: AbsolutePlacement) -> Self {
        Self::Absolute(p)
    }
}

/// How the port's visual box is shifted relative to its anchor, as fractions
/// of the box size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderTransform {
    /// Horizontal shift
    pub translate_x: f32,
    /// Vertical shift
    pub translate_y: f32,
}

impl RenderTransform {
    /// Box centered on the anchor
    pub const CENTERED: Self = Self {
        translate_x: -0.5,
        translate_y: -0.5,
    };

    /// Box kept inside the node on an inset side
    pub fn inset(side: Side) -> Self {
        match side {
            Side::Left => Self {
                translate_x: 0.0,
                translate_y: -0.5,
            },
            Side::Right => Self {
                translate_x: -1.0,
                translate_y: -0.5,
            },
            Side::Top => Self {
                translate_x: -0.5,
                translate_y: 0.0,
            },
            Side::Bottom => Self {
                translate_x: -0.5,
                translate_y: -1.0,
            },
        }
    }

    /// CSS `translate(..)` form
    pub fn to_css(self) -> String {
        format!("translate({}%, {}%)", self.translate_x * 100.0, self.translate_y * 100.0)
    }
}

/// Node-local anchor of a port's visual
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderPosition {
    /// Node-local x
    pub x: f32,
    /// Node-local y
    pub y: f32,
    /// Shift of the visual box around the anchor
    pub transform: RenderTransform,
}

/// Resolved coordinates of one port
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPort {
    /// Where to draw the port inside the node
    pub render_position: RenderPosition,
    /// Curve endpoint in graph space
    pub connection_point: Point,
    /// Edge the connection leaves through
    pub side: Side,
}

impl ResolvedPort {
    /// Node-local anchor
    pub fn local(&self) -> Point {
        Point::new(self.render_position.x, self.render_position.y)
    }
}

/// Resolved ports of one node, in port declaration order
pub type PortPositions = IndexMap<PortId, ResolvedPort>;

/// Replacement placement strategy a node type may supply
pub type PlacementFn = Callback<dyn Fn(&Node, &[Port], Option<Size>) -> PortPositions + Send + Sync>;

/// Wrap a closure as a [`PlacementFn`]
pub fn placement_fn<F>(f: F) -> PlacementFn
where
    F: Fn(&Node, &[Port], Option<Size>) -> PortPositions + Send + Sync + 'static,
{
    let f: Arc<dyn Fn(&Node, &[Port], Option<Size>) -> PortPositions + Send + Sync> = Arc::new(f);
    f.into()
}

/// Resolve every port of `node` with the default algorithm.
///
/// `size` is the node's effective size (measured, else its type default);
/// `None` means the size is unknown. Connection points are offset by
/// `node.position`.
pub fn resolve_positions(node: &Node, size: Option<Size>, ports: &[Port], config: &PlacementConfig) -> PortPositions {
    resolve_positions_at(node.position, size, ports, config)
}

/// Like [`resolve_positions`] but with an explicit graph-space origin
pub fn resolve_positions_at(
    origin: Point,
    size: Option<Size>,
    ports: &[Port],
    config: &PlacementConfig,
) -> PortPositions {
    let size = size.filter(|s| s.is_valid());
    let box_size = size.unwrap_or(Size::ZERO);
    let mut resolved: Vec<Option<(RenderPosition, Side)>> = vec![None; ports.len()];

    // Side placement needs the node's edges; unknown sizes take the fallback
    for side in Side::ALL.into_iter().filter(|_| size.is_some()) {
        let on_side: Vec<(usize, &SidePlacement)> = ports
            .iter()
            .enumerate()
            .filter_map(|(i, port)| match &port.placement {
                PortPlacement::Side(p) if p.side == side => Some((i, p)),
                _ => None,
            })
            .collect();
        if !on_side.is_empty() {
            resolve_side(side, box_size, &on_side, config, &mut resolved);
        }
    }

    for (i, port) in ports.iter().enumerate() {
        if let PortPlacement::Absolute(abs) = &port.placement {
            resolved[i] = resolve_absolute(abs, size).map(|local| {
                (
                    RenderPosition {
                        x: local.x,
                        y: local.y,
                        transform: RenderTransform::CENTERED,
                    },
                    nearest_side(local, box_size),
                )
            });
        }
    }

    ports
        .iter()
        .zip(resolved)
        .map(|(port, slot)| {
            let resolved = match slot {
                Some((render_position, side)) if Point::new(render_position.x, render_position.y).is_finite() => {
                    ResolvedPort {
                        render_position,
                        connection_point: origin + Point::new(render_position.x, render_position.y),
                        side,
                    }
                }
                _ => {
                    tracing::debug!(node = %port.node_id, port = %port.id, "Port placed at node center fallback");
                    fallback(origin, size, port)
                }
            };
            (port.id.clone(), resolved)
        })
        .collect()
}

/// Run a node type's placement override, falling back to the node center for
/// every port the override leaves out
pub fn resolve_with_override(
    node: &Node,
    origin: Point,
    size: Option<Size>,
    ports: &[Port],
    placement: &PlacementFn,
) -> PortPositions {
    let mut custom = (placement.get())(node, ports, size);
    let size = size.filter(|s| s.is_valid());
    ports
        .iter()
        .map(|port| {
            let resolved = match custom.swap_remove(&port.id) {
                Some(r) if r.connection_point.is_finite() => r,
                _ => {
                    tracing::debug!(
                        node = %node.id,
                        port = %port.id,
                        "Placement override left port unresolved"
                    );
                    fallback(origin, size, port)
                }
            };
            (port.id.clone(), resolved)
        })
        .collect()
}

struct Segment<'a> {
    key: Option<&'a str>,
    order: Option<i32>,
    span: Option<f32>,
    members: Vec<(usize, &'a SidePlacement)>,
}

fn resolve_side(
    side: Side,
    size: Size,
    ports: &[(usize, &SidePlacement)],
    config: &PlacementConfig,
    out: &mut [Option<(RenderPosition, Side)>],
) {
    // Group by segment key in first-seen order
    let mut segments: Vec<Segment<'_>> = Vec::new();
    for &(index, placement) in ports {
        let key = placement.segment.as_deref();
        let segment = match segments.iter().position(|s| s.key == key) {
            Some(pos) => &mut segments[pos],
            None => {
                segments.push(Segment {
                    key,
                    order: None,
                    span: None,
                    members: Vec::new(),
                });
                let last = segments.len() - 1;
                &mut segments[last]
            }
        };
        if segment.order.is_none() {
            segment.order = placement.segment_order;
        }
        if segment.span.is_none() {
            segment.span = placement.segment_span.filter(|s| s.is_finite() && *s > 0.0);
        }
        segment.members.push((index, placement));
    }

    // Stable: equal orders keep first-seen order
    segments.sort_by_key(|s| s.order.unwrap_or(0));

    let length = if side.is_vertical_edge() { size.height } else { size.width };
    let total_span: f32 = segments.iter().map(|s| s.span.unwrap_or(1.0)).sum();
    let mut cursor = 0.0;

    for segment in &segments {
        let span = segment.span.unwrap_or(1.0);
        let band_start = cursor / total_span * length;
        let band_len = span / total_span * length;
        cursor += span;

        let spaced = segment.members.iter().filter(|(_, p)| p.align.is_none()).count();
        let mut slot = 0;
        for &(index, placement) in &segment.members {
            let fraction = match placement.align {
                Some(a) if a.is_finite() => a.clamp(0.0, 1.0),
                Some(_) => 0.5,
                None => {
                    slot += 1;
                    slot as f32 / (spaced + 1) as f32
                }
            };
            let along = band_start + fraction * band_len;
            let inward = if placement.inset { config.inset_offset } else { 0.0 };
            let (x, y) = match side {
                Side::Left => (inward, along),
                Side::Right => (size.width - inward, along),
                Side::Top => (along, inward),
                Side::Bottom => (along, size.height - inward),
            };
            let transform = if placement.inset {
                RenderTransform::inset(side)
            } else {
                RenderTransform::CENTERED
            };
            out[index] = Some((RenderPosition { x, y, transform }, side));
        }
    }
}

fn resolve_absolute(placement: &AbsolutePlacement, size: Option<Size>) -> Option<Point> {
    match placement.unit {
        PlacementUnit::Px => Some(Point::new(placement.x, placement.y)),
        PlacementUnit::Percent => {
            let size = size?;
            Some(Point::new(
                placement.x / 100.0 * size.width,
                placement.y / 100.0 * size.height,
            ))
        }
    }
}

/// Edge closest to a node-local point; ties resolve left, right, top, bottom
fn nearest_side(local: Point, size: Size) -> Side {
    let distances = [
        (Side::Left, local.x.abs()),
        (Side::Right, (size.width - local.x).abs()),
        (Side::Top, local.y.abs()),
        (Side::Bottom, (size.height - local.y).abs()),
    ];
    let mut best = distances[0];
    for candidate in &distances[1..] {
        if candidate.1 < best.1 {
            best = *candidate;
        }
    }
    best.0
}

fn fallback(origin: Point, size: Option<Size>, port: &Port) -> ResolvedPort {
    let center = size.map_or(Point::ZERO, Size::center);
    let side = match &port.placement {
        PortPlacement::Side(p) => p.side,
        PortPlacement::Absolute(_) => Side::Left,
    };
    ResolvedPort {
        render_position: RenderPosition {
            x: center.x,
            y: center.y,
            transform: RenderTransform::CENTERED,
        },
        connection_point: origin + center,
        side,
    }
}

/// Resolved ports of a whole graph
#[derive(Debug, Clone, Default, Serialize)]
pub struct PortLayout {
    nodes: IndexMap<NodeId, PortPositions>,
}

impl PortLayout {
    /// Create an empty layout
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the resolved ports of a node
    pub fn insert(&mut self, node_id: NodeId, positions: PortPositions) {
        self.nodes.insert(node_id, positions);
    }

    /// Resolved ports of a node
    pub fn node(&self, node_id: &NodeId) -> Option<&PortPositions> {
        self.nodes.get(node_id)
    }

    /// Resolved coordinates of one port
    pub fn get(&self, port: &PortRef) -> Option<&ResolvedPort> {
        self.nodes.get(&port.node_id)?.get(&port.port_id)
    }

    /// Iterate every resolved port
    pub fn iter(&self) -> impl Iterator<Item = (PortRef, &ResolvedPort)> {
        self.nodes.iter().flat_map(|(node_id, ports)| {
            ports
                .iter()
                .map(move |(port_id, resolved)| (PortRef::new(node_id.clone(), port_id.clone()), resolved))
        })
    }

    /// Nearest port whose connection point lies within `radius` of `point`
    pub fn hit_test(&self, point: Point, radius: f32) -> Option<PortRef> {
        let mut best: Option<(PortRef, f32)> = None;
        for (port, resolved) in self.iter() {
            let distance = resolved.connection_point.distance(point);
            if distance <= radius && best.as_ref().map_or(true, |(_, d)| distance < *d) {
                best = Some((port, distance));
            }
        }
        best.map(|(port, _)| port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortTemplate;

    const EPS: f32 = 1e-4;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    fn ports(node: &Node, templates: &[PortTemplate]) -> Vec<Port> {
        crate::port::expand_templates(node, templates, 64)
    }

    fn config() -> PlacementConfig {
        PlacementConfig::default()
    }

    #[test]
    fn test_even_spacing_on_left() {
        let node = Node::new("n", "t");
        let ports = ports(
            &node,
            &[PortTemplate::input("a", "A"), PortTemplate::input("b", "B"), PortTemplate::input("c", "C")],
        );
        let resolved = resolve_positions(&node, Some(Size::new(100.0, 200.0)), &ports, &config());
        let ys: Vec<f32> = resolved.values().map(|r| r.render_position.y).collect();
        assert!(approx(ys[0], 50.0) && approx(ys[1], 100.0) && approx(ys[2], 150.0));
        assert!(resolved.values().all(|r| r.render_position.x == 0.0));
        assert!(resolved.values().all(|r| r.side == Side::Left));
    }

    #[test]
    fn test_left_x_ignores_height() {
        let node = Node::new("n", "t");
        let ports = ports(
            &node,
            &[
                PortTemplate::input("edge", "Edge"),
                PortTemplate::input("inner", "Inner").with_placement(SidePlacement::new(Side::Left).inset()),
            ],
        );
        for height in [10.0, 150.0, 999.0] {
            let resolved = resolve_positions(&node, Some(Size::new(120.0, height)), &ports, &config());
            assert_eq!(resolved[&PortId::from("edge")].render_position.x, 0.0);
            assert_eq!(
                resolved[&PortId::from("inner")].render_position.x,
                config().inset_offset
            );
        }
    }

    #[test]
    fn test_inset_on_every_side() {
        let node = Node::new("n", "t");
        let inset = |side| PortTemplate::input(format!("{side:?}"), "p").with_placement(SidePlacement::new(side).inset());
        let ports = ports(&node, &Side::ALL.map(inset));
        let size = Size::new(100.0, 60.0);
        let resolved = resolve_positions(&node, Some(size), &ports, &config());
        let d = config().inset_offset;
        assert_eq!(resolved[&PortId::from("Right")].render_position.x, 100.0 - d);
        assert_eq!(resolved[&PortId::from("Top")].render_position.y, d);
        assert_eq!(resolved[&PortId::from("Bottom")].render_position.y, 60.0 - d);
        assert_eq!(
            resolved[&PortId::from("Left")].render_position.transform,
            RenderTransform::inset(Side::Left)
        );
    }

    #[test]
    fn test_segments_follow_order_not_declaration() {
        let node = Node::new("n", "t");
        let aux = PortTemplate::input("aux", "Aux").with_placement(SidePlacement::new(Side::Left).in_segment("aux", 1));
        let main =
            PortTemplate::input("main", "Main").with_placement(SidePlacement::new(Side::Left).in_segment("main", 0));
        let size = Some(Size::new(100.0, 200.0));

        let declared_aux_first = resolve_positions(&node, size, &ports(&node, &[aux.clone(), main.clone()]), &config());
        let declared_main_first = resolve_positions(&node, size, &ports(&node, &[main, aux]), &config());
        for resolved in [declared_aux_first, declared_main_first] {
            assert!(approx(resolved[&PortId::from("main")].render_position.y, 50.0));
            assert!(approx(resolved[&PortId::from("aux")].render_position.y, 150.0));
        }
    }

    #[test]
    fn test_segment_order_changes_offset_not_side() {
        let node = Node::new("n", "t");
        let make = |order_a, order_b| {
            vec![
                PortTemplate::output("a", "A").with_placement(SidePlacement::new(Side::Top).in_segment("a", order_a)),
                PortTemplate::output("b", "B").with_placement(SidePlacement::new(Side::Top).in_segment("b", order_b)),
            ]
        };
        let size = Some(Size::new(300.0, 80.0));
        let before = resolve_positions(&node, size, &ports(&node, &make(0, 1)), &config());
        let after = resolve_positions(&node, size, &ports(&node, &make(1, 0)), &config());
        for id in ["a", "b"] {
            let id = PortId::from(id);
            assert_eq!(before[&id].side, after[&id].side);
            assert_eq!(before[&id].render_position.y, after[&id].render_position.y);
        }
        assert!(before[&PortId::from("a")].render_position.x < before[&PortId::from("b")].render_position.x);
        assert!(after[&PortId::from("a")].render_position.x > after[&PortId::from("b")].render_position.x);
    }

    #[test]
    fn test_segment_span_and_align() {
        let node = Node::new("n", "t");
        let templates = vec![
            PortTemplate::input("wide", "Wide").with_placement(
                SidePlacement::new(Side::Left).in_segment("wide", 0).with_span(3.0).aligned(0.0),
            ),
            PortTemplate::input("narrow", "Narrow")
                .with_placement(SidePlacement::new(Side::Left).in_segment("narrow", 1).aligned(1.0)),
            PortTemplate::input("clamped", "Clamped")
                .with_placement(SidePlacement::new(Side::Left).in_segment("narrow", 1).aligned(7.0)),
        ];
        let resolved = resolve_positions(&node, Some(Size::new(50.0, 400.0)), &ports(&node, &templates), &config());
        assert!(approx(resolved[&PortId::from("wide")].render_position.y, 0.0));
        assert!(approx(resolved[&PortId::from("narrow")].render_position.y, 400.0));
        assert!(approx(resolved[&PortId::from("clamped")].render_position.y, 400.0));
    }

    #[test]
    fn test_tie_on_order_uses_first_seen() {
        let node = Node::new("n", "t");
        let templates = vec![
            PortTemplate::input("x", "X").with_placement(SidePlacement::new(Side::Left).in_segment("x", 0)),
            PortTemplate::input("y", "Y").with_placement(SidePlacement::new(Side::Left).in_segment("y", 0)),
        ];
        let resolved = resolve_positions(&node, Some(Size::new(50.0, 100.0)), &ports(&node, &templates), &config());
        assert!(approx(resolved[&PortId::from("x")].render_position.y, 25.0));
        assert!(approx(resolved[&PortId::from("y")].render_position.y, 75.0));
    }

    #[test]
    fn test_percent_scales_with_width() {
        let node = Node::new("n", "t").with_position(10.0, 20.0);
        let ports = ports(
            &node,
            &[PortTemplate::output("probe", "Probe").with_placement(PortPlacement::percent(50.0, 0.0))],
        );
        let small = resolve_positions(&node, Some(Size::new(200.0, 150.0)), &ports, &config());
        let large = resolve_positions(&node, Some(Size::new(400.0, 150.0)), &ports, &config());
        let id = PortId::from("probe");
        assert_eq!(small[&id].render_position.x, 100.0);
        assert_eq!(large[&id].render_position.x, 200.0);
        assert_eq!(small[&id].render_position.y, 0.0);
        assert_eq!(large[&id].render_position.y, 0.0);
        assert_eq!(large[&id].connection_point, Point::new(210.0, 20.0));
        assert_eq!(large[&id].side, Side::Top);

        for k in [0.25_f32, 1.5, 3.0, 10.0] {
            let scaled = resolve_positions(&node, Some(Size::new(200.0 * k, 150.0)), &ports, &config());
            assert!((scaled[&id].render_position.x - 100.0 * k).abs() < 1e-3);
            assert_eq!(scaled[&id].render_position.y, 0.0);
        }
    }

    #[test]
    fn test_px_placement() {
        let node = Node::new("n", "t");
        let ports = ports(
            &node,
            &[PortTemplate::input("p", "P").with_placement(PortPlacement::px(95.0, 30.0))],
        );
        let resolved = resolve_positions(&node, Some(Size::new(100.0, 60.0)), &ports, &config());
        let r = resolved[&PortId::from("p")];
        assert_eq!(r.local(), Point::new(95.0, 30.0));
        assert_eq!(r.side, Side::Right);
    }

    #[test]
    fn test_percent_without_size_falls_back_to_center() {
        let node = Node::new("n", "t").with_position(5.0, 5.0);
        let ports = ports(
            &node,
            &[PortTemplate::input("p", "P").with_placement(PortPlacement::percent(25.0, 75.0))],
        );
        let resolved = resolve_positions(&node, None, &ports, &config());
        assert_eq!(resolved[&PortId::from("p")].connection_point, Point::new(5.0, 5.0));

        let nan = ports_with_nan(&node);
        let resolved = resolve_positions(&node, Some(Size::new(40.0, 20.0)), &nan, &config());
        assert_eq!(resolved[&PortId::from("bad")].local(), Point::new(20.0, 10.0));
    }

    #[test]
    fn test_side_ports_without_size_fall_back_to_center() {
        let node = Node::new("n", "t").with_position(10.0, 20.0);
        let ports = ports(
            &node,
            &[
                PortTemplate::output("r", "R").with_placement(SidePlacement::new(Side::Right).inset()),
                PortTemplate::output("b", "B").with_placement(SidePlacement::new(Side::Bottom).inset()),
                PortTemplate::input("l", "L"),
            ],
        );
        let resolved = resolve_positions(&node, None, &ports, &config());
        for (id, side) in [("r", Side::Right), ("b", Side::Bottom), ("l", Side::Left)] {
            let r = resolved[&PortId::from(id)];
            assert_eq!(r.local(), Point::ZERO, "port {id}");
            assert_eq!(r.connection_point, Point::new(10.0, 20.0));
            assert_eq!(r.side, side);
        }
    }

    fn ports_with_nan(node: &Node) -> Vec<Port> {
        ports(
            node,
            &[PortTemplate::input("bad", "Bad").with_placement(PortPlacement::px(f32::NAN, 1.0))],
        )
    }

    #[test]
    fn test_override_gaps_are_filled() {
        let node = Node::new("n", "t");
        let ports = ports(&node, &[PortTemplate::input("a", "A"), PortTemplate::input("b", "B")]);
        let only_a = placement_fn(|node, ports, _size| {
            let mut map = PortPositions::new();
            let local = Point::new(1.0, 2.0);
            map.insert(
                ports[0].id.clone(),
                ResolvedPort {
                    render_position: RenderPosition {
                        x: local.x,
                        y: local.y,
                        transform: RenderTransform::CENTERED,
                    },
                    connection_point: node.position + local,
                    side: Side::Top,
                },
            );
            map
        });
        let resolved = resolve_with_override(&node, node.position, Some(Size::new(10.0, 10.0)), &ports, &only_a);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[&PortId::from("a")].side, Side::Top);
        assert_eq!(resolved[&PortId::from("b")].local(), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_layout_hit_test() {
        let node = Node::new("n", "t").with_position(100.0, 100.0);
        let ports = ports(&node, &[PortTemplate::input("a", "A"), PortTemplate::output("b", "B")]);
        let mut layout = PortLayout::new();
        layout.insert(
            node.id.clone(),
            resolve_positions(&node, Some(Size::new(80.0, 40.0)), &ports, &config()),
        );
        let hit = layout.hit_test(Point::new(103.0, 121.0), 5.0);
        assert_eq!(hit, Some(PortRef::new("n", "a")));
        assert_eq!(layout.hit_test(Point::new(140.0, 120.0), 5.0), None);
    }

    #[test]
    fn test_css_transform() {
        assert_eq!(RenderTransform::CENTERED.to_css(), "translate(-50%, -50%)");
        assert_eq!(RenderTransform::inset(Side::Left).to_css(), "translate(0%, -50%)");
    }

    #[test]
    fn test_placement_serialization() {
        let placement: PortPlacement = SidePlacement::new(Side::Bottom).in_segment("io", 2).inset().into();
        let text = ron::to_string(&placement).unwrap();
        let back: PortPlacement = ron::from_str(&text).unwrap();
        assert_eq!(back, placement);
    }
}
