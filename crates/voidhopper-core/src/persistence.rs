//! Save/Load functionality for the hopper registry
//!
//! The registry file is a versioned JSON document:
//!
//! ```json
//! { "version": 1,
//!   "hoppers": { "world:10:64:-3": { "owner": "…", "filter": ["BONE"],
//!                "links": ["world:12:64:-3"], "items_collected": 0, "items_voided": 0 } } }
//! ```
//!
//! Loading is best effort. A record whose key does not parse or names an
//! unknown world is dropped; inside a record, filter tokens and links that
//! do not resolve are dropped one by one. Nothing short of an unreadable
//! file or a newer format version aborts the load.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::components::{BlockKey, ResourceKind};
use crate::error::PersistenceError;
use crate::filter::VoidFilter;
use crate::links::LinkGraph;
use crate::node::HopperNode;

/// Version number for the registry file format (increment when format changes)
pub const SAVE_VERSION: u32 = 1;

/// Files written before versioning carry no tag
fn untagged_version() -> u32 {
    1
}

/// On-disk shape of one node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializableHopper {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub filter: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub items_collected: u64,
    #[serde(default)]
    pub items_voided: u64,
}

impl From<&HopperNode> for SerializableHopper {
    fn from(node: &HopperNode) -> Self {
        Self {
            owner: node.owner.map(|o| o.to_string()),
            filter: node.filter.sorted().iter().map(|k| k.to_string()).collect(),
            links: node.links.iter().map(|k| k.to_string()).collect(),
            items_collected: node.items_collected,
            items_voided: node.items_voided,
        }
    }
}

#[derive(Serialize)]
struct SaveData {
    version: u32,
    hoppers: BTreeMap<String, SerializableHopper>,
}

/// Read side: records stay raw JSON so one bad record cannot fail the rest
#[derive(Deserialize)]
struct RawSaveData {
    #[serde(default = "untagged_version")]
    version: u32,
    #[serde(default)]
    hoppers: BTreeMap<String, serde_json::Value>,
}

/// Read side of one record. Entries stay raw so a token of the wrong JSON
/// type is dropped on its own instead of failing the record.
#[derive(Deserialize)]
struct RawHopper {
    #[serde(default)]
    owner: Option<serde_json::Value>,
    #[serde(default)]
    filter: Vec<serde_json::Value>,
    #[serde(default)]
    links: Vec<serde_json::Value>,
    #[serde(default)]
    items_collected: u64,
    #[serde(default)]
    items_voided: u64,
}

/// Result of loading a registry file
#[derive(Debug, Default)]
pub struct LoadedRegistry {
    pub nodes: HashMap<BlockKey, HopperNode>,
    /// Whole records skipped
    pub dropped_records: usize,
    /// Filter tokens, links or owners skipped inside kept records
    pub dropped_entries: usize,
}

/// Write every node to `writer`
pub fn save_registry<W: Write>(
    writer: W,
    nodes: &HashMap<BlockKey, HopperNode>,
) -> Result<(), PersistenceError> {
    let hoppers = nodes
        .iter()
        .map(|(key, node)| (key.to_string(), SerializableHopper::from(node)))
        .collect();

    let save_data = SaveData {
        version: SAVE_VERSION,
        hoppers,
    };

    serde_json::to_writer_pretty(writer, &save_data)?;
    Ok(())
}

/// Read nodes from `reader`, keeping only records whose world `world_exists`
/// accepts. Link lists are re-capped at `max_links`.
pub fn load_registry<R: Read>(
    reader: R,
    world_exists: impl Fn(&str) -> bool,
    max_links: usize,
) -> Result<LoadedRegistry, PersistenceError> {
    let raw: RawSaveData = serde_json::from_reader(reader)?;

    if raw.version > SAVE_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            supported: SAVE_VERSION,
            found: raw.version,
        });
    }

    let mut loaded = LoadedRegistry::default();

    for (key_str, value) in raw.hoppers {
        let key = match key_str.parse::<BlockKey>() {
            Ok(key) if world_exists(&key.world) => key,
            Ok(_) => {
                log::debug!("Dropping hopper {}: unknown world", key_str);
                loaded.dropped_records += 1;
                continue;
            }
            Err(e) => {
                log::debug!("Dropping hopper record '{}': {}", key_str, e);
                loaded.dropped_records += 1;
                continue;
            }
        };

        let record: RawHopper = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                log::debug!("Dropping hopper {}: {}", key, e);
                loaded.dropped_records += 1;
                continue;
            }
        };

        let (node, dropped) = restore_node(record, &world_exists, max_links);
        loaded.dropped_entries += dropped;
        loaded.nodes.insert(key, node);
    }

    Ok(loaded)
}

/// Rebuild a node from its record, returning how many entries were skipped
fn restore_node(
    record: RawHopper,
    world_exists: &impl Fn(&str) -> bool,
    max_links: usize,
) -> (HopperNode, usize) {
    let mut dropped = 0;

    let owner = match record.owner {
        Some(serde_json::Value::Null) | None => None,
        Some(value) => match value.as_str().map(Uuid::parse_str) {
            Some(Ok(owner)) => Some(owner),
            _ => {
                dropped += 1;
                None
            }
        },
    };

    let mut filter = VoidFilter::new();
    for token in &record.filter {
        match token.as_str().map(ResourceKind::new) {
            Some(Ok(kind)) => {
                filter.insert(kind);
            }
            _ => dropped += 1,
        }
    }

    let mut links = LinkGraph::new();
    for raw in &record.links {
        match raw.as_str().map(str::parse::<BlockKey>) {
            Some(Ok(dest)) if world_exists(&dest.world) => {
                if !links.try_add(dest, max_links) {
                    dropped += 1;
                }
            }
            _ => dropped += 1,
        }
    }

    let node = HopperNode {
        owner,
        filter,
        links,
        items_collected: record.items_collected,
        items_voided: record.items_voided,
    };
    (node, dropped)
}

/// The registry file on disk
#[derive(Debug, Clone)]
pub struct PersistenceStore {
    path: PathBuf,
}

impl PersistenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the full node set, replacing the file atomically
    pub fn save(&self, nodes: &HashMap<BlockKey, HopperNode>) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let mut buffer = Vec::new();
        save_registry(&mut buffer, nodes)?;
        fs::write(&tmp_path, &buffer).map_err(|e| PersistenceError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| PersistenceError::io(&self.path, e))?;
        Ok(())
    }

    /// Read the node set; a missing file is an empty registry
    pub fn load(
        &self,
        world_exists: impl Fn(&str) -> bool,
        max_links: usize,
    ) -> Result<LoadedRegistry, PersistenceError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LoadedRegistry::default())
            }
            Err(e) => return Err(PersistenceError::io(&self.path, e)),
        };
        load_registry(BufReader::new(file), world_exists, max_links)
    }
}
