//! Block headers and the header index view
//!
//! The retargeting core only ever reads headers: it borrows a view of
//! the chain's header index and walks predecessor links from a tip.
//! The index itself is owned elsewhere; this module supplies the view
//! contract plus the in-memory index used by embedders and tests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-byte block hash
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct BlockHash(pub [u8; 32]);

impl BlockHash {
    /// The all-zero hash, used as the genesis predecessor
    pub const ZERO: BlockHash = BlockHash([0u8; 32]);

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        BlockHash(bytes)
    }

    /// Parse from a hex string
    pub fn from_hex(hex_str: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(hex_str)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(BlockHash(arr))
    }

    /// Convert to a hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get as bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self.to_hex())
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Hash arbitrary bytes with BLAKE3
pub fn hash_bytes(data: &[u8]) -> BlockHash {
    BlockHash(*blake3::hash(data).as_bytes())
}

/// Block header containing all proof-of-work metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockHeader {
    /// Protocol version
    pub version: u32,
    /// Hash of the previous block
    pub prev_hash: BlockHash,
    /// Merkle root of all transactions
    pub merkle_root: BlockHash,
    /// Block timestamp (seconds since Unix epoch)
    pub time: i64,
    /// Compact difficulty target this header claims
    pub bits: u32,
    /// Nonce found by the miner
    pub nonce: u64,
}

impl BlockHeader {
    /// Create a new block header
    pub fn new(
        version: u32,
        prev_hash: BlockHash,
        merkle_root: BlockHash,
        time: i64,
        bits: u32,
        nonce: u64,
    ) -> Self {
        Self {
            version,
            prev_hash,
            merkle_root,
            time,
            bits,
            nonce,
        }
    }

    /// Serialize the header for hashing
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(88);
        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes.extend_from_slice(&self.prev_hash.0);
        bytes.extend_from_slice(&self.merkle_root.0);
        bytes.extend_from_slice(&self.time.to_le_bytes());
        bytes.extend_from_slice(&self.bits.to_le_bytes());
        bytes.extend_from_slice(&self.nonce.to_le_bytes());
        bytes
    }

    /// Calculate the hash of this header
    pub fn hash(&self) -> BlockHash {
        hash_bytes(&self.to_bytes())
    }
}

/// Read-only view over one indexed header and its ancestry.
///
/// A view is a cheap copyable cursor into the header index. `prev` is
/// O(1) and the walk from any header reaches genesis (height 0, no
/// predecessor) in finitely many steps. Nothing in the retargeting core
/// assumes random access by height; it always walks.
pub trait HeaderView: Copy {
    /// Height of this header; genesis is 0
    fn height(&self) -> u32;

    /// Header timestamp, Unix seconds
    fn time(&self) -> i64;

    /// Compact difficulty target
    fn bits(&self) -> u32;

    /// The predecessor, `None` at genesis
    fn prev(&self) -> Option<Self>;
}

/// Append-only in-memory header index.
///
/// Backs the `HeaderView` contract with a flat vector; height equals
/// position. Disk-backed indexes implement the same trait on their own
/// cursor type.
#[derive(Debug, Clone, Default)]
pub struct HeaderChain {
    entries: Vec<IndexEntry>,
}

#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    time: i64,
    bits: u32,
}

impl HeaderChain {
    /// Create an empty index
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Start a chain from its genesis header
    pub fn with_genesis(time: i64, bits: u32) -> Self {
        let mut chain = Self::new();
        chain.push(time, bits);
        chain
    }

    /// Append the next header
    pub fn push(&mut self, time: i64, bits: u32) {
        self.entries.push(IndexEntry { time, bits });
    }

    /// Number of indexed headers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True while no headers are indexed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cursor at the highest header, `None` while empty
    pub fn tip(&self) -> Option<ChainCursor<'_>> {
        if self.entries.is_empty() {
            None
        } else {
            Some(ChainCursor {
                chain: self,
                index: self.entries.len() - 1,
            })
        }
    }

    /// Cursor at an absolute height
    pub fn at_height(&self, height: u32) -> Option<ChainCursor<'_>> {
        if (height as usize) < self.entries.len() {
            Some(ChainCursor {
                chain: self,
                index: height as usize,
            })
        } else {
            None
        }
    }
}

/// Borrowed cursor into a `HeaderChain`
#[derive(Debug, Clone, Copy)]
pub struct ChainCursor<'a> {
    chain: &'a HeaderChain,
    index: usize,
}

impl HeaderView for ChainCursor<'_> {
    fn height(&self) -> u32 {
        self.index as u32
    }

    fn time(&self) -> i64 {
        self.chain.entries[self.index].time
    }

    fn bits(&self) -> u32 {
        self.chain.entries[self.index].bits
    }

    fn prev(&self) -> Option<Self> {
        self.index.checked_sub(1).map(|index| ChainCursor {
            chain: self.chain,
            index,
        })
    }
}
