//! In-process partitioned shuffle
//!
//! Map tasks write one-edge shards into a [`ShuffleWriter`]; the cycle driver
//! gathers the writers into a [`Shuffle`] and hands each reduce unit one
//! partition, sorted by [`GraphGroupKey`] and grouped by reversed target URL.
//! Shards cross the shuffle encoded, so every reducer works on its own copy
//! of the pages it receives.

use crate::graph::{GraphGroupKey, WebEdge, WebGraph, WebVertex};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Errors moving a shard through the shuffle
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to encode shard for {target}: {source}")]
    Encode {
        target: String,
        source: serde_json::Error,
    },

    #[error("Failed to decode shard for {key}: {source}")]
    Decode {
        key: String,
        source: serde_json::Error,
    },

    #[error("Shard graph has no edge")]
    EmptyShard,
}

/// Wire form of a one-edge graph
#[derive(Serialize, Deserialize)]
struct ShardPayload {
    source: WebVertex,
    /// Absent for a self-loop
    target: Option<WebVertex>,
    edge: WebEdge,
}

/// Encodes the first edge of `graph` with both endpoints
pub fn encode_shard(graph: &WebGraph) -> Result<Vec<u8>, TransportError> {
    let edge = graph.first_edge().ok_or(TransportError::EmptyShard)?;

    let source = graph
        .vertex(&edge.source)
        .cloned()
        .unwrap_or_else(|| WebVertex::new(edge.source.clone()));
    let target = if edge.is_loop() {
        None
    } else {
        Some(
            graph
                .vertex(&edge.target)
                .cloned()
                .unwrap_or_else(|| WebVertex::new(edge.target.clone())),
        )
    };

    let payload = ShardPayload {
        source,
        target,
        edge: edge.clone(),
    };
    serde_json::to_vec(&payload).map_err(|source| TransportError::Encode {
        target: edge.target.clone(),
        source,
    })
}

/// Decodes a shard back into a one-edge graph focused on the edge target
pub fn decode_shard(key: &GraphGroupKey, bytes: &[u8]) -> Result<WebGraph, TransportError> {
    let payload: ShardPayload =
        serde_json::from_slice(bytes).map_err(|source| TransportError::Decode {
            key: key.reversed_url.clone(),
            source,
        })?;

    let mut graph = WebGraph::new();
    graph.add_vertex(payload.source);
    if let Some(target) = payload.target {
        graph.add_vertex(target);
    }
    let focus = payload.edge.target.clone();
    graph.insert_edge(payload.edge);
    graph.set_focus(&focus);
    Ok(graph)
}

/// Partition a reversed URL is routed to
pub fn partition_for(reversed_url: &str, partitions: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    reversed_url.hash(&mut hasher);
    (hasher.finish() % partitions.max(1) as u64) as usize
}

/// An encoded shard with its routing key
#[derive(Debug, Clone)]
pub struct EncodedShard {
    pub key: GraphGroupKey,
    pub bytes: Vec<u8>,
}

/// Destination of the shards a map task emits
pub trait ShardSink {
    fn write(&mut self, key: GraphGroupKey, shard: &WebGraph) -> Result<(), TransportError>;
}

/// Map-side buffer routing encoded shards to partitions
#[derive(Debug)]
pub struct ShuffleWriter {
    partitions: Vec<Vec<EncodedShard>>,
}

impl ShuffleWriter {
    pub fn new(partitions: usize) -> Self {
        Self {
            partitions: vec![Vec::new(); partitions.max(1)],
        }
    }

    pub fn shard_count(&self) -> usize {
        self.partitions.iter().map(Vec::len).sum()
    }
}

impl ShardSink for ShuffleWriter {
    fn write(&mut self, key: GraphGroupKey, shard: &WebGraph) -> Result<(), TransportError> {
        let bytes = encode_shard(shard)?;
        let index = partition_for(&key.reversed_url, self.partitions.len());
        self.partitions[index].push(EncodedShard { key, bytes });
        Ok(())
    }
}

/// All shards of a cycle, by partition
#[derive(Debug)]
pub struct Shuffle {
    partitions: Vec<Vec<EncodedShard>>,
}

impl Shuffle {
    pub fn new(partitions: usize) -> Self {
        Self {
            partitions: vec![Vec::new(); partitions.max(1)],
        }
    }

    /// Takes over the shards of one map task
    pub fn absorb(&mut self, writer: ShuffleWriter) {
        for (index, shards) in writer.partitions.into_iter().enumerate() {
            // Writers built with the same partition count route identically
            let index = index % self.partitions.len();
            self.partitions[index].extend(shards);
        }
    }

    pub fn shard_count(&self) -> usize {
        self.partitions.iter().map(Vec::len).sum()
    }

    /// Splits the shuffle into sorted, grouped partitions
    pub fn into_partitions(self) -> Vec<Partition> {
        self.partitions
            .into_iter()
            .enumerate()
            .map(|(index, shards)| Partition::new(index, shards))
            .collect()
    }
}

/// All shards sharing one reversed target URL
#[derive(Debug)]
pub struct ShardGroup {
    pub reversed_url: String,
    pub shards: Vec<EncodedShard>,
}

/// The input of one reduce unit
#[derive(Debug)]
pub struct Partition {
    pub index: usize,
    pub groups: Vec<ShardGroup>,
}

impl Partition {
    fn new(index: usize, mut shards: Vec<EncodedShard>) -> Self {
        shards.sort_by(|a, b| a.key.cmp(&b.key));

        let mut groups: Vec<ShardGroup> = Vec::new();
        for shard in shards {
            match groups.last_mut() {
                Some(group) if group.reversed_url == shard.key.reversed_url => {
                    group.shards.push(shard)
                }
                _ => groups.push(ShardGroup {
                    reversed_url: shard.key.reversed_url.clone(),
                    shards: vec![shard],
                }),
            }
        }

        Self { index, groups }
    }

    pub fn shard_count(&self) -> usize {
        self.groups.iter().map(|g| g.shards.len()).sum()
    }
}
