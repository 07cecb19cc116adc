//! Map graph: capturable nodes and their undirected adjacency.
//!
//! Adjacency is stored once per edge rather than as per-node outgoing
//! lists, so a connection is symmetric by construction. Per-node
//! connection lists only exist at the persistence boundary.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt;

use crate::constants::{MAX_TIER, MIN_TIER};

/// Stable identifier of a map node.
pub type NodeId = u32;

/// Inline capacity for neighbor lists; the canonical map never exceeds four.
pub type NeighborSet = SmallVec<[NodeId; 4]>;

/// Side controlling a node or commander.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Owner {
    Player,
    Enemy,
    Neutral,
}

impl Owner {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Enemy => "enemy",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node archetype; drives production, commander capacity and display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    City,
    Resource,
    Fortress,
    Shrine,
    Stronghold,
}

impl NodeKind {
    pub const ALL: [Self; 5] = [
        Self::City,
        Self::Resource,
        Self::Fortress,
        Self::Shrine,
        Self::Stronghold,
    ];

    /// Human-facing name used in battle log messages.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::City => "City",
            Self::Resource => "Resource Node",
            Self::Fortress => "Fortress",
            Self::Shrine => "Shrine",
            Self::Stronghold => "Enemy Stronghold",
        }
    }

    /// Maximum number of commanders that may be stationed at a node of this kind.
    #[must_use]
    pub const fn commander_capacity(self) -> usize {
        match self {
            Self::City => 6,
            Self::Fortress => 4,
            Self::Stronghold => 5,
            Self::Resource => 2,
            Self::Shrine => 3,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Render-space position; only the out-of-scope renderer reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A capturable location on the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: Position,
    pub owner: Owner,
    tier: u8,
    pub garrison: u32,
}

impl Node {
    #[must_use]
    pub fn new(
        id: NodeId,
        kind: NodeKind,
        position: Position,
        owner: Owner,
        tier: u8,
        garrison: u32,
    ) -> Self {
        Self {
            id,
            kind,
            position,
            owner,
            tier: tier.clamp(MIN_TIER, MAX_TIER),
            garrison,
        }
    }

    /// Upgrade rank in `1..=5`.
    #[must_use]
    pub const fn tier(&self) -> u8 {
        self.tier
    }

    #[must_use]
    pub const fn can_upgrade(&self) -> bool {
        self.tier < MAX_TIER
    }

    /// Raise the tier by one. Returns `false` when already at the cap.
    pub fn raise_tier(&mut self) -> bool {
        if !self.can_upgrade() {
            return false;
        }
        self.tier += 1;
        true
    }
}

/// Undirected edge, stored with the smaller id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge(NodeId, NodeId);

impl Edge {
    /// Normalize a pair into an edge. Self-loops are rejected.
    #[must_use]
    pub fn new(a: NodeId, b: NodeId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self(a, b)),
            std::cmp::Ordering::Greater => Some(Self(b, a)),
            std::cmp::Ordering::Equal => None,
        }
    }

    #[must_use]
    pub const fn endpoints(self) -> (NodeId, NodeId) {
        (self.0, self.1)
    }

    #[must_use]
    pub const fn touches(self, id: NodeId) -> bool {
        self.0 == id || self.1 == id
    }

    #[must_use]
    pub const fn other(self, id: NodeId) -> Option<NodeId> {
        if self.0 == id {
            Some(self.1)
        } else if self.1 == id {
            Some(self.0)
        } else {
            None
        }
    }
}

/// Node arena plus undirected edge set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MapGraph {
    nodes: Vec<Node>,
    edges: BTreeSet<Edge>,
}

/// Fixed reference topology: `(id, kind, x, y, owner, tier, garrison)`.
const CANONICAL_NODES: [(NodeId, NodeKind, i32, i32, Owner, u8, u32); 10] = [
    (1, NodeKind::City, 200, 300, Owner::Player, 1, 100),
    (2, NodeKind::Resource, 350, 200, Owner::Neutral, 1, 50),
    (3, NodeKind::Resource, 350, 400, Owner::Neutral, 1, 50),
    (4, NodeKind::Fortress, 500, 150, Owner::Neutral, 2, 150),
    (5, NodeKind::Shrine, 400, 300, Owner::Neutral, 1, 75),
    (6, NodeKind::Resource, 350, 500, Owner::Neutral, 1, 50),
    (7, NodeKind::City, 600, 200, Owner::Enemy, 2, 120),
    (8, NodeKind::Fortress, 550, 350, Owner::Enemy, 2, 180),
    (9, NodeKind::Resource, 500, 500, Owner::Enemy, 1, 60),
    (10, NodeKind::Stronghold, 700, 300, Owner::Enemy, 3, 250),
];

const CANONICAL_EDGES: [(NodeId, NodeId); 13] = [
    (1, 2),
    (1, 3),
    (2, 4),
    (2, 5),
    (3, 6),
    (4, 7),
    (5, 6),
    (5, 7),
    (5, 8),
    (6, 9),
    (7, 8),
    (8, 9),
    (8, 10),
];

/// Build the fixed 10-node reference map. Pure and deterministic.
#[must_use]
pub fn generate_canonical_map() -> MapGraph {
    let nodes = CANONICAL_NODES
        .iter()
        .map(|&(id, kind, x, y, owner, tier, garrison)| {
            Node::new(id, kind, Position::new(x, y), owner, tier, garrison)
        })
        .collect();
    let edges = CANONICAL_EDGES
        .iter()
        .filter_map(|&(a, b)| Edge::new(a, b))
        .collect();
    MapGraph { nodes, edges }
}

impl MapGraph {
    /// Assemble a graph from nodes and per-node connection lists.
    ///
    /// A pair listed by either endpoint becomes an edge. References to
    /// unknown nodes and self-loops are dropped; the returned count says how
    /// many list entries were discarded.
    #[must_use]
    pub fn from_connection_lists<I>(nodes: Vec<Node>, lists: I) -> (Self, usize)
    where
        I: IntoIterator<Item = (NodeId, Vec<NodeId>)>,
    {
        let known: BTreeSet<NodeId> = nodes.iter().map(|node| node.id).collect();
        let mut edges = BTreeSet::new();
        let mut dropped = 0;
        for (from, targets) in lists {
            for to in targets {
                match Edge::new(from, to) {
                    Some(edge) if known.contains(&from) && known.contains(&to) => {
                        edges.insert(edge);
                    }
                    _ => dropped += 1,
                }
            }
        }
        (Self { nodes, edges }, dropped)
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges.iter().copied()
    }

    /// Adjacent node ids in ascending order.
    #[must_use]
    pub fn neighbors(&self, id: NodeId) -> NeighborSet {
        self.edges
            .iter()
            .filter_map(|edge| edge.other(id))
            .collect()
    }

    #[must_use]
    pub fn is_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        Edge::new(a, b).is_some_and(|edge| self.edges.contains(&edge))
    }

    pub fn nodes_owned_by(&self, owner: Owner) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |node| node.owner == owner)
    }

    #[must_use]
    pub fn count_owned(&self, owner: Owner) -> usize {
        self.nodes_owned_by(owner).count()
    }

    /// The edges `reference` defines between nodes present in this graph.
    fn expected_edges(&self, reference: &Self) -> BTreeSet<Edge> {
        reference
            .edges
            .iter()
            .copied()
            .filter(|edge| {
                let (a, b) = edge.endpoints();
                self.contains(a) && self.contains(b)
            })
            .collect()
    }

    /// Ids of nodes whose connections differ from `reference`.
    #[must_use]
    pub fn connection_mismatches(&self, reference: &Self) -> Vec<NodeId> {
        let expected = Self {
            nodes: Vec::new(),
            edges: self.expected_edges(reference),
        };
        self.nodes
            .iter()
            .map(|node| node.id)
            .filter(|&id| self.neighbors(id) != expected.neighbors(id))
            .collect()
    }

    /// Overwrite every connection from `reference`. Returns whether anything changed.
    pub fn restore_edges_from(&mut self, reference: &Self) -> bool {
        let expected = self.expected_edges(reference);
        if expected == self.edges {
            return false;
        }
        self.edges = expected;
        true
    }
}
