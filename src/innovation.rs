//! Deterministic ids for hidden nodes.
//!
//! Connections need no innovation number of their own: a [`ConnectionKey`] is
//! already the same in every genome that grew the same edge. Hidden nodes are
//! the exception, since splitting a connection has to invent a fresh node. The
//! new node's id is a hash of the split connection's key, so two genomes that
//! split the same edge end up with the same hidden node and keep aligning
//! during crossover.

use std::hash::{Hash, Hasher};

use crate::gene::{ConnectionKey, NodeId};

/// Mixed into every split hash so it can't coincide with hashes of other data.
const SPLIT_MARKER: u64 = 0xDEAD_BEEF_CAFE_BABE;

/// Ids below this value are reserved for input and output nodes.
pub const RESERVED_NODE_IDS: u64 = 1 << 16;

#[derive(Default)]
struct SplitHasher {
    state: u64,
}

impl Hasher for SplitHasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state = self
                .state
                .wrapping_mul(0x517c_c1b7_2722_0a95)
                .wrapping_add(u64::from(byte));
        }
    }

    #[inline]
    fn finish(&self) -> u64 {
        let mut h = self.state;
        h ^= h >> 33;
        h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
        h ^= h >> 33;
        h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
        h ^= h >> 33;

        RESERVED_NODE_IDS + (h % (u64::MAX - RESERVED_NODE_IDS))
    }
}

/// Id of the hidden node created by splitting `key`.
///
/// Always `>= RESERVED_NODE_IDS`.
#[inline]
#[must_use]
pub fn split_node_id(key: ConnectionKey) -> NodeId {
    let mut hasher = SplitHasher::default();
    key.source.0.hash(&mut hasher);
    key.destination.0.hash(&mut hasher);
    SPLIT_MARKER.hash(&mut hasher);
    NodeId(hasher.finish())
}
