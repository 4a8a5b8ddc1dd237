//! Block-entity persistence with zstd compression.
//!
//! A store file holds every quarry block-entity of a world, keyed by position.
//! The payload is bincode, zstd-compressed and guarded by a CRC32 header.

use crate::plug::PlugNetwork;
use crate::rubble::RubbleStorage;
use crate::slab::SlabContents;
use anyhow::{Context, Result};
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use stonequarry_core::BlockPos;
use tracing::debug;

/// Magic number for store file identification ("SQBE" = stonequarry block-entities).
const STORE_MAGIC: u32 = 0x5351_4245;

/// Current store file format version.
const STORE_VERSION: u16 = 1;

const HEADER_LEN: usize = 14;

/// File name used inside a world directory.
pub const STORE_FILE_NAME: &str = "blockentities.sqbe";

/// Store file header structure.
#[derive(Debug, Clone)]
struct StoreHeader {
    magic: u32,
    version: u16,
    crc32: u32,
    payload_len: u32,
}

impl StoreHeader {
    fn new(crc32: u32, payload_len: u32) -> Self {
        Self {
            magic: STORE_MAGIC,
            version: STORE_VERSION,
            crc32,
            payload_len,
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN);
        bytes.extend_from_slice(&self.magic.to_le_bytes());
        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes.extend_from_slice(&self.crc32.to_le_bytes());
        bytes.extend_from_slice(&self.payload_len.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            anyhow::bail!("Store header too short");
        }

        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != STORE_MAGIC {
            anyhow::bail!(
                "Invalid store magic: expected 0x{:08X}, got 0x{:08X}",
                STORE_MAGIC,
                magic
            );
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != STORE_VERSION {
            anyhow::bail!("Unsupported store version {version}");
        }
        let crc32 = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
        let payload_len = u32::from_le_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]);

        Ok(Self {
            magic,
            version,
            crc32,
            payload_len,
        })
    }
}

/// Persisted state of one quarry block-entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockEntityState {
    Rubble(RubbleStorage),
    Plug(PlugNetwork),
    Slab(SlabContents),
}

/// Every block-entity of a world, in position order.
pub type BlockEntityMap = BTreeMap<BlockPos, BlockEntityState>;

/// Encode block-entities into the framed store format.
pub fn encode_block_entities(entities: &BlockEntityMap) -> Result<Vec<u8>> {
    let serialized = bincode::serialize(entities).context("Failed to serialize block-entities")?;

    // Compress with zstd (level 3 for balanced speed/compression).
    let compressed =
        zstd::encode_all(&serialized[..], 3).context("Failed to compress block-entities")?;

    let mut hasher = Hasher::new();
    hasher.update(&compressed);
    let crc32 = hasher.finalize();

    let payload_len =
        u32::try_from(compressed.len()).context("Block-entity payload exceeds 4 GiB")?;
    let mut bytes = StoreHeader::new(crc32, payload_len).to_bytes();
    bytes.extend_from_slice(&compressed);
    Ok(bytes)
}

/// Decode the framed store format, validating magic, version and CRC32.
pub fn decode_block_entities(bytes: &[u8]) -> Result<BlockEntityMap> {
    let header = StoreHeader::from_bytes(bytes)?;
    let payload = &bytes[HEADER_LEN..];
    if payload.len() != header.payload_len as usize {
        anyhow::bail!(
            "Store payload length mismatch: header says {}, found {}",
            header.payload_len,
            payload.len()
        );
    }

    let mut hasher = Hasher::new();
    hasher.update(payload);
    let computed_crc = hasher.finalize();
    if computed_crc != header.crc32 {
        anyhow::bail!(
            "CRC32 mismatch: expected {:08X}, got {:08X}",
            header.crc32,
            computed_crc
        );
    }

    let decompressed =
        zstd::decode_all(payload).context("Failed to decompress block-entities")?;
    bincode::deserialize(&decompressed).context("Failed to deserialize block-entities")
}

/// File-backed store for a world's quarry block-entities.
pub struct BlockEntityStore {
    world_dir: PathBuf,
}

impl BlockEntityStore {
    /// Create a store rooted at the given world directory.
    pub fn new<P: AsRef<Path>>(world_dir: P) -> Result<Self> {
        let world_dir = world_dir.as_ref().to_path_buf();
        fs::create_dir_all(&world_dir).context("Failed to create world directory")?;
        Ok(Self { world_dir })
    }

    pub fn path(&self) -> PathBuf {
        self.world_dir.join(STORE_FILE_NAME)
    }

    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Write every block-entity, replacing the previous file.
    pub fn save(&self, entities: &BlockEntityMap) -> Result<()> {
        let bytes = encode_block_entities(entities)?;
        let path = self.path();
        let mut file = File::create(&path).context("Failed to create store file")?;
        file.write_all(&bytes)
            .context("Failed to write store file")?;
        debug!(path = %path.display(), entities = entities.len(), bytes = bytes.len(), "saved block-entities");
        Ok(())
    }

    /// Load the block-entities; a world without a store file has none.
    pub fn load(&self) -> Result<BlockEntityMap> {
        if !self.exists() {
            return Ok(BlockEntityMap::new());
        }
        let path = self.path();

        let mut file = File::open(&path).context("Failed to open store file")?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .context("Failed to read store file")?;
        decode_block_entities(&bytes)
            .with_context(|| format!("Corrupt store file {}", path.display()))
    }
}
