//! Innovation tracking.
//!
//! NEAT aligns genes across genomes by the historical origin of the structural
//! mutation that created them. This module provides:
//!
//! - [`InnovationRegistry`]: monotonically increasing sources of gene
//!   innovation numbers, node ids and species ids, owned by one run
//! - [`GenerationCache`]: the structural mutations performed during the current
//!   generation, so that organisms which independently make the same change
//!   receive the same innovation numbers

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::gene::{Gene, GeneId, NodeId};

/// Identifier allocator for a single evolutionary run.
///
/// Counters are atomic so the registry can be shared by reference across
/// threads; ids are never reused or rolled back. Runs are reproducible as long
/// as allocation happens in a deterministic order.
#[derive(Debug)]
pub struct InnovationRegistry {
    gene: AtomicU64,
    node: AtomicU64,
    species: AtomicU64,
}

impl Default for InnovationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InnovationRegistry {
    /// Create a registry whose first innovation and first node id are 1.
    ///
    /// Node id 0 is the bias node and is never handed out.
    #[must_use]
    pub fn new() -> Self {
        Self {
            gene: AtomicU64::new(0),
            node: AtomicU64::new(0),
            species: AtomicU64::new(0),
        }
    }

    /// Allocate a fresh innovation number.
    #[inline]
    pub fn next_innovation(&self) -> GeneId {
        GeneId(self.gene.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Allocate a fresh node id.
    #[inline]
    pub fn next_node_id(&self) -> NodeId {
        NodeId(self.node.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Allocate a fresh species id.
    #[inline]
    pub fn next_species_id(&self) -> u64 {
        self.species.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// The most recently allocated innovation number (0 if none).
    #[must_use]
    pub fn current_innovation(&self) -> GeneId {
        GeneId(self.gene.load(Ordering::Relaxed))
    }

    /// The most recently allocated node id (0 if none).
    #[must_use]
    pub fn current_node_id(&self) -> NodeId {
        NodeId(self.node.load(Ordering::Relaxed))
    }
}

/// The result of splitting a connection, shared by every organism that splits
/// the same `(input, output)` pair within one generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRecord {
    /// The hidden node inserted into the connection.
    pub node: NodeId,
    /// `input -> node`.
    pub incoming: Gene,
    /// `node -> output`.
    pub outgoing: Gene,
}

/// Structural mutations made during the current generation, keyed by the
/// `(input, output)` node pair they affect.
///
/// A cache lives for exactly one mutation phase. It is passed by `&mut`, so a
/// parallel mutation scheme would have to shard it or wrap it in a lock.
#[derive(Debug, Default, Clone)]
pub struct GenerationCache {
    connections: HashMap<(NodeId, NodeId), Gene>,
    splits: HashMap<(NodeId, NodeId), SplitRecord>,
}

impl GenerationCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The connection gene created for `pair` this generation, if any.
    #[must_use]
    pub fn connection(&self, pair: (NodeId, NodeId)) -> Option<&Gene> {
        self.connections.get(&pair)
    }

    /// Return the cached connection gene for `pair`, or create one with a fresh
    /// innovation number from `make_weight`.
    ///
    /// A cached gene keeps the initial weight it was created with.
    pub fn connection_or_insert(
        &mut self,
        pair: (NodeId, NodeId),
        registry: &InnovationRegistry,
        make_weight: impl FnOnce() -> f64,
    ) -> Gene {
        *self.connections.entry(pair).or_insert_with(|| {
            Gene::new(registry.next_innovation(), pair.0, pair.1, make_weight())
        })
    }

    /// The split performed on the connection `pair` this generation, if any.
    #[must_use]
    pub fn split(&self, pair: (NodeId, NodeId)) -> Option<&SplitRecord> {
        self.splits.get(&pair)
    }

    /// Return the cached split of `pair`, or allocate a new node and two new
    /// innovation numbers for it.
    pub fn split_or_insert(
        &mut self,
        pair: (NodeId, NodeId),
        registry: &InnovationRegistry,
        weight: f64,
    ) -> SplitRecord {
        *self.splits.entry(pair).or_insert_with(|| {
            let node = registry.next_node_id();
            let incoming = Gene::new(registry.next_innovation(), pair.0, node, 1.0);
            let outgoing = Gene::new(registry.next_innovation(), node, pair.1, weight);
            SplitRecord {
                node,
                incoming,
                outgoing,
            }
        })
    }

    /// Number of distinct structural innovations recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len() + self.splits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty() && self.splits.is_empty()
    }
}
