//! Versioned save snapshots, schema migration and map repair.
//!
//! A save is a JSON envelope holding the snapshot body and an xxHash64 of
//! it. Bare snapshots without an envelope are accepted as unchecked.
//! Corruption inside a decodable snapshot never blocks a load: it is
//! logged and repaired from the canonical map.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::hash::Hasher;
use thiserror::Error;
use twox_hash::XxHash64;

use crate::commander::Commander;
use crate::constants::SCHEMA_VERSION;
use crate::economy::Resources;
use crate::map::{MapGraph, Node, NodeId, NodeKind, Owner, Position, generate_canonical_map};
use crate::state::{BattleLogEntry, GameState, LogKind, Phase};

const REPAIR_MESSAGE: &str =
    "Map connections were corrupted and have been repaired automatically";
const INTEGRITY_MESSAGE: &str =
    "Save data failed its integrity check; map connections were restored from the reference map";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("failed to encode snapshot: {0}")]
    Encode(String),
    #[error("failed to decode snapshot: {0}")]
    Decode(String),
    #[error("snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("cannot migrate snapshot from version {from}: {reason}")]
    Migration { from: u32, reason: String },
}

/// A node as written to disk, connections listed per node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub x: i32,
    pub y: i32,
    pub owner: Owner,
    pub tier: u8,
    pub garrison: u32,
    #[serde(default)]
    pub connections: Vec<NodeId>,
}

/// Persisted projection of [`GameState`]. Selection is not saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    #[serde(default)]
    pub seed: u64,
    pub turn: u32,
    pub phase: Phase,
    pub resources: Resources,
    pub commanders: Vec<Commander>,
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub game_over: bool,
    #[serde(default)]
    pub winner: Option<Owner>,
    #[serde(default)]
    pub battle_log: Vec<BattleLogEntry>,
}

#[derive(Serialize, Deserialize)]
struct SaveEnvelope {
    checksum: String,
    snapshot: Value,
}

/// Result of checking a save's checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integrity {
    Verified,
    /// Bare snapshot with no envelope.
    Unchecked,
    Mismatch,
}

/// What happened while loading a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub migrated_from: Option<u32>,
    pub integrity: Integrity,
    pub repaired: bool,
    /// Connection entries and commander posts discarded as dangling.
    pub dropped_references: usize,
}

/// Project `state` into a snapshot, keeping the newest `log_cap` log entries.
#[must_use]
pub fn save(state: &GameState, log_cap: usize) -> Snapshot {
    let nodes = state
        .map
        .nodes()
        .iter()
        .map(|node| NodeRecord {
            id: node.id,
            kind: node.kind,
            x: node.position.x,
            y: node.position.y,
            owner: node.owner,
            tier: node.tier(),
            garrison: node.garrison,
            connections: state.map.neighbors(node.id).into_vec(),
        })
        .collect();
    let skip = state.battle_log.len().saturating_sub(log_cap);
    Snapshot {
        version: SCHEMA_VERSION,
        seed: state.seed,
        turn: state.turn,
        phase: state.phase,
        resources: state.resources,
        commanders: state.commanders.clone(),
        nodes,
        game_over: state.game_over,
        winner: state.winner,
        battle_log: state.battle_log[skip..].to_vec(),
    }
}

fn snapshot_hash(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}

fn body_checksum(body: &Value) -> Result<String, serde_json::Error> {
    let text = serde_json::to_string(body)?;
    Ok(format!("{:016x}", snapshot_hash(text.as_bytes())))
}

/// Serialize a snapshot into a checksummed envelope.
///
/// # Errors
///
/// Returns `SnapshotError::Encode` if serialization fails.
pub fn encode(snapshot: &Snapshot) -> Result<String, SnapshotError> {
    let encode_err = |err: serde_json::Error| SnapshotError::Encode(err.to_string());
    let body = serde_json::to_value(snapshot).map_err(encode_err)?;
    let envelope = SaveEnvelope {
        checksum: body_checksum(&body).map_err(encode_err)?,
        snapshot: body,
    };
    serde_json::to_string(&envelope).map_err(encode_err)
}

/// Rewrite an older snapshot body into the current schema.
///
/// # Errors
///
/// Returns `SnapshotError::Migration` when the body lacks the fields a step needs.
pub fn migrate(mut body: Value, from: u32) -> Result<Value, SnapshotError> {
    let mut version = from;
    while version < SCHEMA_VERSION {
        body = match version {
            0 => migrate_v0_to_v1(body)?,
            other => {
                return Err(SnapshotError::Migration {
                    from: other,
                    reason: "no migration step registered".to_string(),
                });
            }
        };
        version += 1;
        log::info!("migrated snapshot to schema version {version}");
    }
    Ok(body)
}

/// Version 0 predates reliable connection lists: rebuild them from the
/// canonical map and keep every node's owner, garrison and tier.
fn migrate_v0_to_v1(mut body: Value) -> Result<Value, SnapshotError> {
    let failure = |reason: &str| SnapshotError::Migration {
        from: 0,
        reason: reason.to_string(),
    };
    let canonical = generate_canonical_map();
    let object = body
        .as_object_mut()
        .ok_or_else(|| failure("snapshot is not an object"))?;
    let nodes = object
        .get_mut("nodes")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| failure("snapshot has no node list"))?;
    for node in nodes.iter_mut() {
        let record = node
            .as_object_mut()
            .ok_or_else(|| failure("node entry is not an object"))?;
        let id = record
            .get("id")
            .and_then(Value::as_u64)
            .and_then(|id| NodeId::try_from(id).ok())
            .ok_or_else(|| failure("node entry has no numeric id"))?;
        let connections: Vec<Value> = canonical
            .neighbors(id)
            .into_iter()
            .map(Value::from)
            .collect();
        record.insert("connections".to_string(), Value::Array(connections));
    }
    object.insert("version".to_string(), Value::from(1u32));
    Ok(body)
}

/// Parse a save payload, verify its checksum and migrate it.
///
/// # Errors
///
/// Fails on malformed JSON, snapshots from a newer schema, or bodies that
/// cannot be migrated or deserialized.
pub fn decode(payload: &str) -> Result<(Snapshot, Option<u32>, Integrity), SnapshotError> {
    let decode_err = |err: serde_json::Error| SnapshotError::Decode(err.to_string());
    let raw: Value = serde_json::from_str(payload).map_err(decode_err)?;
    let is_envelope = raw
        .as_object()
        .is_some_and(|obj| obj.contains_key("checksum") && obj.contains_key("snapshot"));
    let (body, integrity) = if is_envelope {
        let envelope: SaveEnvelope = serde_json::from_value(raw).map_err(decode_err)?;
        let actual = body_checksum(&envelope.snapshot).map_err(decode_err)?;
        let integrity = if actual == envelope.checksum {
            Integrity::Verified
        } else {
            log::warn!(
                "snapshot checksum mismatch: stored {}, computed {actual}",
                envelope.checksum
            );
            Integrity::Mismatch
        };
        (envelope.snapshot, integrity)
    } else {
        (raw, Integrity::Unchecked)
    };

    let found = body
        .get("version")
        .and_then(Value::as_u64)
        .map_or(Ok(0), u32::try_from)
        .map_err(|_| SnapshotError::Decode("version is out of range".to_string()))?;
    if found > SCHEMA_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found,
            supported: SCHEMA_VERSION,
        });
    }
    let (body, migrated_from) = if found < SCHEMA_VERSION {
        (migrate(body, found)?, Some(found))
    } else {
        (body, None)
    };
    let snapshot: Snapshot = serde_json::from_value(body).map_err(decode_err)?;
    Ok((snapshot, migrated_from, integrity))
}

/// Rebuild game state from a snapshot, dropping dangling references.
///
/// Returns the number of discarded references alongside the state.
#[must_use]
pub fn restore(snapshot: Snapshot) -> (GameState, usize) {
    let mut lists = BTreeMap::new();
    let nodes = snapshot
        .nodes
        .into_iter()
        .map(|record| {
            lists.insert(record.id, record.connections);
            Node::new(
                record.id,
                record.kind,
                Position::new(record.x, record.y),
                record.owner,
                record.tier,
                record.garrison,
            )
        })
        .collect();
    let (map, mut dropped) = MapGraph::from_connection_lists(nodes, lists);
    if dropped > 0 {
        log::warn!("dropped {dropped} dangling connection entries while loading");
    }

    let mut commanders = snapshot.commanders;
    for commander in &mut commanders {
        let Some(post) = commander.assigned_node else {
            continue;
        };
        if map.node(post).is_none_or(|node| node.owner != commander.owner) {
            log::warn!(
                "commander {} was stationed at invalid node {post}; unassigning",
                commander.id
            );
            commander.assigned_node = None;
            dropped += 1;
        }
    }
    dropped += release_over_capacity(&map, &mut commanders);

    let state = GameState {
        seed: snapshot.seed,
        turn: snapshot.turn.max(1),
        phase: snapshot.phase,
        resources: snapshot.resources,
        commanders,
        map,
        selected_node: None,
        selected_commander: None,
        game_over: snapshot.game_over,
        winner: snapshot.winner,
        battle_log: snapshot.battle_log,
    };
    (state, dropped)
}

/// Unassign commanders beyond each node's capacity, highest ids first.
fn release_over_capacity(map: &MapGraph, commanders: &mut [Commander]) -> usize {
    let mut released = 0;
    for node in map.nodes() {
        let capacity = node.kind.commander_capacity();
        let mut stationed: Vec<usize> = commanders
            .iter()
            .enumerate()
            .filter(|(_, commander)| commander.assigned_node == Some(node.id))
            .map(|(index, _)| index)
            .collect();
        if stationed.len() <= capacity {
            continue;
        }
        stationed.sort_by_key(|&index| commanders[index].id);
        for &index in &stationed[capacity..] {
            log::warn!(
                "node {} holds more than {capacity} commanders; unassigning {}",
                node.id,
                commanders[index].id
            );
            commanders[index].assigned_node = None;
            released += 1;
        }
    }
    released
}

/// Nodes whose stored connection list differs from the canonical neighbors.
///
/// Lists are compared as written, before edges are merged, so a one-sided,
/// duplicated, self-referencing or unknown entry counts as a mismatch.
fn stored_connection_mismatches(records: &[NodeRecord], canonical: &MapGraph) -> Vec<NodeId> {
    records
        .iter()
        .filter(|record| {
            let mut stored = record.connections.clone();
            stored.sort_unstable();
            stored.as_slice() != canonical.neighbors(record.id).as_slice()
        })
        .map(|record| record.id)
        .collect()
}

/// Compare every node's connections with the canonical map and, on any
/// mismatch, restore all of them and log the repair. Idempotent.
///
/// Returns whether a repair happened.
pub fn repair_if_corrupted(state: &mut GameState) -> bool {
    let canonical = generate_canonical_map();
    let mismatched = state.map.connection_mismatches(&canonical);
    if mismatched.is_empty() {
        return false;
    }
    log::warn!("repairing map connections; mismatched nodes: {mismatched:?}");
    state.map.restore_edges_from(&canonical);
    state.push_log(LogKind::Info, REPAIR_MESSAGE.to_string());
    true
}

/// Decode, migrate, restore and repair a save payload.
///
/// # Errors
///
/// See [`decode`]. Checksum mismatches and bad connections are repaired,
/// not reported as errors.
pub fn load(payload: &str) -> Result<(GameState, LoadReport), SnapshotError> {
    let (snapshot, migrated_from, integrity) = decode(payload)?;
    let canonical = generate_canonical_map();
    let stored_mismatches = stored_connection_mismatches(&snapshot.nodes, &canonical);
    let (mut state, dropped_references) = restore(snapshot);
    let mut repaired = repair_if_corrupted(&mut state);
    if !repaired && !stored_mismatches.is_empty() {
        log::warn!("saved connection lists disagree on nodes {stored_mismatches:?}; repairing");
        state.map.restore_edges_from(&canonical);
        state.push_log(LogKind::Info, REPAIR_MESSAGE.to_string());
        repaired = true;
    }
    if integrity == Integrity::Mismatch && !repaired {
        state.push_log(LogKind::Info, INTEGRITY_MESSAGE.to_string());
        repaired = true;
    }
    log::info!(
        "loaded campaign at turn {} (migrated_from={migrated_from:?}, integrity={integrity:?}, repaired={repaired})",
        state.turn
    );
    Ok((
        state,
        LoadReport {
            migrated_from,
            integrity,
            repaired,
            dropped_references,
        },
    ))
}
