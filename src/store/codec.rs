//! Binary snapshot codec.
//!
//! The whole store round-trips through a single, schemaless,
//! little-endian layout. The format is part of the public contract and
//! is written by hand so nothing about it can drift with a framework
//! upgrade.
//!
//! ## Layout (all integers u64, little-endian)
//!
//! ```text
//!   ┌──────────┬─────────────┬────────┬───────────────────────────┐
//!   │ max_cost │ policy_type │ length │ length × node record      │
//!   └──────────┴─────────────┴────────┴───────────────────────────┘
//!
//!   node record:
//!   ┌──────┬────────────┬────────┬─────────┬─────┬───────────┬───────┐
//!   │ hash │ expiration │ access │ key_len │ key │ value_len │ value │
//!   └──────┴────────────┴────────┴─────────┴─────┴───────────┴───────┘
//!
//!   expiration: Unix seconds; 0 means "no expiration"
//!   records:    eviction-list order, front → back
//! ```
//!
//! Loading rebuilds the hash chains from each record's persisted hash
//! (FNV-1a makes the indices reproducible), appends records at the
//! eviction-list tail so file order is preserved verbatim, and never
//! invokes policy hooks. Initial capacity is the smallest power of two
//! ≥ max(128, length). A short read surfaces the underlying I/O error
//! and leaves the caller to decide whether to re-initialize.

use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::debug;

use crate::ds::{Node, NodeArena};
use crate::error::Result;
use crate::policy::PolicyKind;
use crate::store::Store;

/// Bucket-count floor applied when loading a snapshot.
const LOAD_MIN_BUCKETS: u64 = 128;

/// Buffered little-endian writer for snapshot records.
pub(crate) struct Encoder<W: Write> {
    w: BufWriter<W>,
    scratch: [u8; 8],
}

impl<W: Write> Encoder<W> {
    pub fn new(w: W) -> Self {
        Self {
            w: BufWriter::new(w),
            scratch: [0; 8],
        }
    }

    pub fn write_u64(&mut self, value: u64) -> std::io::Result<()> {
        self.scratch = value.to_le_bytes();
        self.w.write_all(&self.scratch)
    }

    /// Writes an optional expiration as Unix seconds; `None` becomes 0.
    pub fn write_time(&mut self, at: Option<SystemTime>) -> std::io::Result<()> {
        let secs = at
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.write_u64(secs)
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.write_u64(data.len() as u64)?;
        self.w.write_all(data)
    }

    pub fn write_node(&mut self, node: &Node) -> std::io::Result<()> {
        self.write_u64(node.hash)?;
        self.write_time(node.expires_at)?;
        self.write_u64(node.access)?;
        self.write_bytes(&node.key)?;
        self.write_bytes(&node.value)
    }

    pub fn finish(mut self) -> std::io::Result<()> {
        self.w.flush()
    }
}

/// Buffered little-endian reader for snapshot records.
pub(crate) struct Decoder<R: Read> {
    r: BufReader<R>,
    scratch: [u8; 8],
}

impl<R: Read> Decoder<R> {
    pub fn new(r: R) -> Self {
        Self {
            r: BufReader::new(r),
            scratch: [0; 8],
        }
    }

    pub fn read_u64(&mut self) -> std::io::Result<u64> {
        self.r.read_exact(&mut self.scratch)?;
        Ok(u64::from_le_bytes(self.scratch))
    }

    /// Reads an expiration; 0 decodes to `None`.
    pub fn read_time(&mut self) -> std::io::Result<Option<SystemTime>> {
        let secs = self.read_u64()?;
        if secs == 0 {
            Ok(None)
        } else {
            Ok(Some(UNIX_EPOCH + Duration::from_secs(secs)))
        }
    }

    pub fn read_bytes(&mut self) -> std::io::Result<Vec<u8>> {
        let len = self.read_u64()? as usize;
        let mut data = vec![0u8; len];
        self.r.read_exact(&mut data)?;
        Ok(data)
    }

    /// Decodes one node record with unlinked membership fields.
    pub fn read_node(&mut self) -> std::io::Result<Node> {
        let hash = self.read_u64()?;
        let expires_at = self.read_time()?;
        let access = self.read_u64()?;
        let key = self.read_bytes()?;
        let value = self.read_bytes()?;

        let mut node = Node::new(hash, key, value, expires_at);
        node.access = access;
        Ok(node)
    }
}

impl Store {
    /// Writes the full store state to `w` starting at offset zero.
    ///
    /// The caller truncates the sink when it can outlive the write (the
    /// file-backed cache does `set_len(0)` first). The caller also
    /// holds whatever lock covers the store for the duration of the
    /// walk; this method only reads.
    pub fn snapshot<W: Write + Seek>(&self, w: &mut W) -> Result<()> {
        w.seek(SeekFrom::Start(0))?;

        let mut enc = Encoder::new(w);
        enc.write_u64(self.max_cost)?;
        enc.write_u64(self.policy_kind().as_u64())?;
        enc.write_u64(self.len)?;

        let mut cursor = self.evict.front();
        while let Some(id) = cursor {
            let node = match self.arena.node(id) {
                Some(node) => node,
                None => break,
            };
            enc.write_node(node)?;
            cursor = node.evict_next;
        }
        enc.finish()?;

        debug!("snapshot wrote {} entries ({} cost)", self.len, self.cost);
        Ok(())
    }

    /// Replaces the store's contents with a snapshot read from `r`.
    ///
    /// Bucket order within a chain is not persisted (only eviction
    /// order matters); each record is pushed at its chain front. Policy
    /// hooks are not invoked — the list order is taken verbatim from
    /// the file.
    pub fn load<R: Read + Seek>(&mut self, r: &mut R) -> Result<()> {
        r.seek(SeekFrom::Start(0))?;
        let mut dec = Decoder::new(r);

        let max_cost = dec.read_u64()?;
        let kind = PolicyKind::try_from(dec.read_u64()?)?;
        let len = dec.read_u64()?;

        let capacity = LOAD_MIN_BUCKETS.max(len).next_power_of_two() as usize;

        self.buckets = vec![None; capacity];
        self.arena = NodeArena::with_capacity(len as usize);
        self.evict.clear();
        self.cost = 0;
        self.len = 0;
        self.max_cost = max_cost;
        self.set_policy(kind);

        for _ in 0..len {
            let node = dec.read_node()?;
            let idx = (node.hash % capacity as u64) as usize;
            let cost = node.cost();
            let id = self.arena.insert(node);

            self.bucket_link(idx, id);
            self.evict.push_back(&mut self.arena, id);
            self.cost += cost;
        }
        self.len = len;

        debug!(
            "snapshot loaded {} entries ({} cost, {:?} policy, {} buckets)",
            self.len,
            self.cost,
            kind,
            capacity
        );
        Ok(())
    }
}
