//! Portable record - a node's configuration carried by the dropped item.
//!
//! Breaking a node externalizes its filter, links and counters into a
//! `PortableHopper`; placing the item again restores them. Two encodings
//! exist: a compact `bincode` blob, and the plain-text item tags older
//! items carry (`filter` = comma-separated kinds, `links` =
//! semicolon-separated keys).

use serde::{Deserialize, Serialize};

use crate::components::{BlockKey, ResourceKind};
use crate::error::PersistenceError;
use crate::filter::VoidFilter;
use crate::links::LinkGraph;
use crate::node::HopperNode;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortableHopper {
    /// Sorted filtered kinds
    pub filter: Vec<ResourceKind>,
    /// Endpoints in routing order
    pub links: Vec<BlockKey>,
    pub items_collected: u64,
    pub items_voided: u64,
}

/// Plain-text item tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortableTags {
    pub filter: Option<String>,
    pub links: Option<String>,
}

impl PortableHopper {
    pub fn from_node(node: &HopperNode) -> Self {
        Self {
            filter: node.filter.sorted().into_iter().cloned().collect(),
            links: node.links.as_slice().to_vec(),
            items_collected: node.items_collected,
            items_voided: node.items_voided,
        }
    }

    /// Node state for a fresh placement; links are re-capped at `max_links`
    pub fn to_node(&self, owner: Option<uuid::Uuid>, max_links: usize) -> HopperNode {
        HopperNode {
            owner,
            filter: self.filter.iter().cloned().collect::<VoidFilter>(),
            links: LinkGraph::from_ordered(self.links.iter().cloned(), max_links),
            items_collected: self.items_collected,
            items_voided: self.items_voided,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, PersistenceError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, PersistenceError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Text tags; empty lists produce no tag
    pub fn to_tags(&self) -> PortableTags {
        let join = |parts: Vec<String>, sep: &str| {
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(sep))
            }
        };

        PortableTags {
            filter: join(self.filter.iter().map(|k| k.to_string()).collect(), ","),
            links: join(self.links.iter().map(|k| k.to_string()).collect(), ";"),
        }
    }

    /// Parse text tags, dropping tokens that do not parse and links into
    /// worlds `world_exists` rejects. Text tags carry no counters.
    pub fn from_tags(tags: &PortableTags, world_exists: impl Fn(&str) -> bool) -> Self {
        let filter = tags
            .filter
            .as_deref()
            .unwrap_or("")
            .split(',')
            .filter(|t| !t.trim().is_empty())
            .filter_map(|t| ResourceKind::new(t).ok())
            .collect::<VoidFilter>();

        let links = tags
            .links
            .as_deref()
            .unwrap_or("")
            .split(';')
            .filter_map(|t| t.trim().parse::<BlockKey>().ok())
            .filter(|k| world_exists(&k.world))
            .collect();

        Self {
            filter: filter.sorted().into_iter().cloned().collect(),
            links,
            items_collected: 0,
            items_voided: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PortableHopper {
        PortableHopper {
            filter: vec![
                ResourceKind::new("BONE").unwrap(),
                ResourceKind::new("STRING").unwrap(),
            ],
            links: vec![BlockKey::new("world", 1, 2, 3), BlockKey::new("world", -4, 5, 6)],
            items_collected: 99,
            items_voided: 7,
        }
    }

    #[test]
    fn test_bincode_roundtrip() {
        let bytes = record().encode().unwrap();
        assert_eq!(PortableHopper::decode(&bytes).unwrap(), record());
    }

    #[test]
    fn test_decode_garbage_is_error() {
        assert!(PortableHopper::decode(&[0xff, 0x01]).is_err());
    }

    #[test]
    fn test_tags_format() {
        let tags = record().to_tags();
        assert_eq!(tags.filter.as_deref(), Some("BONE,STRING"));
        assert_eq!(tags.links.as_deref(), Some("world:1:2:3;world:-4:5:6"));
        assert_eq!(PortableHopper::default().to_tags(), PortableTags::default());
    }

    #[test]
    fn test_from_tags_is_best_effort() {
        let tags = PortableTags {
            filter: Some("bone, ,STRING,bad token".into()),
            links: Some("world:1:2:3;nether:0:0:0;garbage; world:-4:5:6".into()),
        };

        let parsed = PortableHopper::from_tags(&tags, |w| w == "world");

        assert_eq!(parsed.filter, record().filter);
        assert_eq!(parsed.links, record().links);
        assert_eq!(parsed.items_collected, 0);
    }

    #[test]
    fn test_to_node_applies_link_cap() {
        let node = record().to_node(None, 1);
        assert_eq!(node.links.as_slice(), &[BlockKey::new("world", 1, 2, 3)]);
        assert_eq!(node.filter.len(), 2);
        assert_eq!(node.items_collected, 99);
    }

    #[test]
    fn test_node_links_survive_tag_roundtrip() {
        let mut with_odd = record();
        with_odd.links.push(BlockKey::new("w;x", 1, 1, 1));
        let node = with_odd.to_node(None, 8);
        assert_eq!(node.links.as_slice(), record().links.as_slice());

        let again = PortableHopper::from_tags(&PortableHopper::from_node(&node).to_tags(), |_| true);
        assert_eq!(again.links, node.links.as_slice());
        assert_eq!(again.filter, record().filter);
    }
}
