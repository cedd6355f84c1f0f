//! FAT32 cluster-chain traversal.

use crate::bytes::le32;
use crate::cache::SectorCache;
use crate::storage::StorageProvider;
use crate::volume::Geometry;
use crate::{Error, SECTOR_SIZE};

// ─── Constants ─────────────────────────────────────────────────────────────────

/// FAT32 entries are 28 bits wide; the top nibble is reserved.
pub const FAT32_MASK:    u32 = 0x0FFF_FFFF;
pub const FAT32_RESERVED: u32 = 0x0FFF_FFF0;
pub const FAT32_BAD:     u32 = 0x0FFF_FFF7;
pub const FAT32_EOC:     u32 = 0x0FFF_FFF8;
pub const FIRST_CLUSTER: u32 = 2;

const ENTRY_SIZE: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusterStep {
    Next(u32),
    EndOfChain,
}

/// Classify a masked FAT entry read from the table.
pub fn classify(entry: u32, max_cluster: u32) -> Result<ClusterStep, Error> {
    match entry {
        FAT32_EOC..=FAT32_MASK => Ok(ClusterStep::EndOfChain),
        FAT32_BAD => Err(Error::CorruptChain),
        n if n < FIRST_CLUSTER || n >= FAT32_RESERVED || n > max_cluster => {
            Err(Error::InvalidCluster(n))
        }
        n => Ok(ClusterStep::Next(n)),
    }
}

/// Look up the FAT entry for cluster `n`.
///
/// Performs no cycle detection; use [`ChainWalker`] to follow a chain.
pub fn next_cluster<S: StorageProvider + ?Sized>(
    cache:    &mut SectorCache<'_, S>,
    geometry: &Geometry,
    n:        u32,
) -> Result<ClusterStep, Error> {
    if n < FIRST_CLUSTER || n > geometry.max_cluster() {
        return Err(Error::InvalidCluster(n));
    }
    let fat_offset = n * ENTRY_SIZE;
    let fat_sector = geometry
        .fat_region_start_sector
        .checked_add(fat_offset / SECTOR_SIZE as u32)
        .ok_or(Error::InvalidCluster(n))?;
    let off = (fat_offset % SECTOR_SIZE as u32) as usize;

    let sector = cache.read_sector(fat_sector)?;
    let entry = le32(sector, off) & FAT32_MASK;

    let step = classify(entry, geometry.max_cluster());
    if let Err(e) = step {
        log::warn!("xfat: FAT entry for cluster {n} is {entry:#x}: {e}");
    }
    step
}

/// Follows a cluster chain with a hard step budget.
///
/// A chain can never hold more clusters than the volume has, so running out
/// of budget means the chain loops.
pub struct ChainWalker {
    cluster:   u32,
    remaining: u32,
}

impl ChainWalker {
    pub fn new(start: u32, geometry: &Geometry) -> Self {
        Self { cluster: start, remaining: geometry.cluster_count }
    }

    pub fn current(&self) -> u32 {
        self.cluster
    }

    /// Move to the next cluster. Returns `false` at end of chain.
    pub fn advance<S: StorageProvider + ?Sized>(
        &mut self,
        cache:    &mut SectorCache<'_, S>,
        geometry: &Geometry,
    ) -> Result<bool, Error> {
        if self.remaining == 0 {
            log::warn!("xfat: cluster chain through {} exceeds volume size", self.cluster);
            return Err(Error::CorruptChain);
        }
        match next_cluster(cache, geometry, self.cluster)? {
            ClusterStep::Next(n) => {
                self.remaining -= 1;
                self.cluster = n;
                Ok(true)
            }
            ClusterStep::EndOfChain => Ok(false),
        }
    }
}
