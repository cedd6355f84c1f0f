//! A mounted FAT32 volume: derived geometry, path resolution and file reads.
//!
//! All state lives in [`Volume`]; nothing is global. Every traversal is an
//! explicit loop bounded by the volume's cluster count, so neither a deep
//! path nor a looping chain can grow the stack or hang the caller.

use core::ops::ControlFlow;

use crate::bpb::Bpb;
use crate::cache::SectorCache;
use crate::dir::{short_name, DirectoryEntry, Slot, DIR_ENTRY_SIZE, ENTRIES_PER_SECTOR};
use crate::fat::{self, ChainWalker, ClusterStep, FAT32_RESERVED, FIRST_CLUSTER};
use crate::path::{check_len, Components};
use crate::storage::StorageProvider;
use crate::{Error, Result, SECTOR_SIZE};

/// FAT entries held by one FAT sector.
const FAT_ENTRIES_PER_SECTOR: u32 = (SECTOR_SIZE / 4) as u32;

// ─── Geometry ──────────────────────────────────────────────────────────────────

/// Layout constants derived once from the boot sector.
///
/// Sector numbers are relative to the start of the volume; the cache adds
/// `start_lba` when talking to the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub start_lba:                u32,
    pub total_sectors:            u32,
    pub cluster_sectors:          u32,
    pub reserved_sectors:         u32,
    pub fat_count:                u32,
    pub sectors_per_fat:          u32,
    /// First sector of the FAT in use (the active one when unmirrored).
    pub fat_region_start_sector:  u32,
    pub data_region_start_sector: u32,
    pub root_cluster:             u32,
    /// Number of data clusters; also the step budget of every chain walk.
    pub cluster_count:            u32,
}

impl Geometry {
    pub fn from_bpb(bpb: &Bpb, start_lba: u32, sector_count: u32) -> Self {
        let reserved_sectors = bpb.reserved_sectors as u32;
        let fat_count = bpb.fat_count as u32;
        let sectors_per_fat = bpb.sectors_per_fat;
        let cluster_sectors = bpb.sectors_per_cluster as u32;

        let active_fat = match bpb.active_fat() {
            Some(n) if (n as u32) < fat_count => n as u32,
            Some(n) => {
                log::warn!("xfat: active FAT {n} out of range, using FAT 0");
                0
            }
            None => 0,
        };

        let total_sectors = match bpb.total_sectors() {
            0 => sector_count,
            n => n,
        };
        let fat_region_start_sector =
            reserved_sectors.saturating_add(active_fat.saturating_mul(sectors_per_fat));
        let data_region_start_sector =
            reserved_sectors.saturating_add(fat_count.saturating_mul(sectors_per_fat));
        let cluster_count =
            total_sectors.saturating_sub(data_region_start_sector) / cluster_sectors.max(1);

        Geometry {
            start_lba,
            total_sectors,
            cluster_sectors,
            reserved_sectors,
            fat_count,
            sectors_per_fat,
            fat_region_start_sector,
            data_region_start_sector,
            root_cluster: bpb.root_cluster,
            cluster_count,
        }
    }

    pub fn cluster_bytes(&self) -> u32 {
        self.cluster_sectors * SECTOR_SIZE as u32
    }

    /// Highest cluster number that has both a data area and a FAT entry.
    pub fn max_cluster(&self) -> u32 {
        let by_data = self.cluster_count.saturating_add(1);
        let by_fat = self.sectors_per_fat.saturating_mul(FAT_ENTRIES_PER_SECTOR).saturating_sub(1);
        by_data.min(by_fat).min(FAT32_RESERVED - 1)
    }

    /// First volume-relative sector of `cluster`.
    pub fn cluster_to_sector(&self, cluster: u32) -> Result<u32> {
        if cluster < FIRST_CLUSTER || cluster > self.max_cluster() {
            return Err(Error::InvalidCluster(cluster));
        }
        (cluster - FIRST_CLUSTER)
            .checked_mul(self.cluster_sectors)
            .and_then(|s| s.checked_add(self.data_region_start_sector))
            .ok_or(Error::InvalidCluster(cluster))
    }
}

// ─── Volume ────────────────────────────────────────────────────────────────────

pub struct Volume<'a, S: StorageProvider + ?Sized> {
    cache:    SectorCache<'a, S>,
    geometry: Geometry,
    bpb:      Bpb,
}

impl<'a, S: StorageProvider + ?Sized> Volume<'a, S> {
    /// Open `storage`, then validate the boot sector at `start_lba`.
    ///
    /// `buffer` becomes the volume's only sector buffer and must hold at
    /// least [`SECTOR_SIZE`] bytes. On failure the provider is closed again
    /// and nothing is retained.
    pub fn mount(
        start_lba:    u32,
        sector_count: u32,
        storage:      &'a mut S,
        buffer:       &'a mut [u8],
    ) -> Result<Self> {
        let buffer = buffer.first_chunk_mut::<SECTOR_SIZE>().ok_or(Error::BufferTooSmall)?;
        storage.open(SECTOR_SIZE)?;

        let mut cache = SectorCache::new(storage, buffer, start_lba);
        let bpb = match Self::read_boot_sector(&mut cache) {
            Ok(bpb) => bpb,
            Err(e) => {
                log::warn!("xfat: no usable FAT32 volume at LBA {start_lba}: {e}");
                cache.close();
                return Err(e);
            }
        };
        let geometry = Geometry::from_bpb(&bpb, cache.start_lba(), sector_count);

        log::info!(
            "xfat: mounted \"{}\" ({:08x}) at LBA {start_lba}: {} clusters of {} bytes, root at {}",
            bpb.label(),
            bpb.volume_id,
            geometry.cluster_count,
            geometry.cluster_bytes(),
            geometry.root_cluster,
        );

        Ok(Volume { cache, geometry, bpb })
    }

    fn read_boot_sector(cache: &mut SectorCache<'_, S>) -> Result<Bpb> {
        let sector = cache.read_sector(0)?;
        Ok(Bpb::parse(sector)?)
    }

    /// Close the storage provider and give the buffer back.
    pub fn unmount(mut self) {
        self.cache.close();
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn bpb(&self) -> &Bpb {
        &self.bpb
    }

    pub fn cache(&mut self) -> &mut SectorCache<'a, S> {
        &mut self.cache
    }

    /// Single FAT lookup; see [`fat::next_cluster`].
    pub fn next_cluster(&mut self, n: u32) -> Result<ClusterStep> {
        fat::next_cluster(&mut self.cache, &self.geometry, n)
    }

    /// Find the entry named by `path`, starting at the root directory.
    ///
    /// Both `/` and `\` separate components. An empty path names the root,
    /// and so does any `.` or `..` that lands on it.
    pub fn resolve(&mut self, path: &str) -> Result<DirectoryEntry> {
        check_len(path)?;

        let root = self.geometry.root_cluster;
        let mut components = Components::new(path);
        let mut current = DirectoryEntry::root(root);
        while let Some(component) = components.next() {
            let at_root = self.dir_cluster(&current) == root;
            current = match component {
                // The root directory has no `.` or `..` records.
                b"." | b".." if at_root => DirectoryEntry::root(root),
                _ => {
                    let name = short_name(component).ok_or(Error::NotFound)?;
                    match self.find_in_dir(self.dir_cluster(&current), &name)? {
                        up if up.is_dir() && up.start_cluster == 0 => DirectoryEntry::root(root),
                        entry => entry,
                    }
                }
            };
            if !current.is_dir() && !components.is_done() {
                return Err(Error::NotADirectory);
            }
        }
        Ok(current)
    }

    /// Look up one padded 8.3 name in the directory starting at `cluster`.
    pub fn find_in_dir(&mut self, cluster: u32, name: &[u8; 11]) -> Result<DirectoryEntry> {
        let mut found = None;
        self.scan_dir(cluster, |entry| {
            if entry.matches(name) {
                found = Some(*entry);
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        found.ok_or(Error::NotFound)
    }

    /// Copy live entries of directory `dir` into `out`, skipping the first
    /// `skip`. Returns how many were written.
    pub fn list_dir(
        &mut self,
        dir:  &DirectoryEntry,
        skip: usize,
        out:  &mut [DirectoryEntry],
    ) -> Result<usize> {
        if !dir.is_dir() {
            return Err(Error::NotADirectory);
        }
        if out.is_empty() {
            return Ok(0);
        }

        let mut seen = 0usize;
        let mut filled = 0usize;
        self.scan_dir(self.dir_cluster(dir), |entry| {
            if seen >= skip {
                if let Some(slot) = out.get_mut(filled) {
                    *slot = *entry;
                    filled += 1;
                }
            }
            seen += 1;
            if filled == out.len() { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
        })?;
        Ok(filled)
    }

    /// Read from `entry` starting at byte `offset` into `dest`.
    ///
    /// Returns the number of bytes copied, which is short only at end of
    /// file. An offset at or past the end yields 0.
    pub fn read(&mut self, entry: &DirectoryEntry, offset: u32, dest: &mut [u8]) -> Result<usize> {
        if entry.is_dir() {
            return Err(Error::IsADirectory);
        }
        if offset >= entry.file_size || dest.is_empty() {
            return Ok(0);
        }

        let geometry = self.geometry;
        let cluster_bytes = geometry.cluster_bytes();
        let want = dest.len().min((entry.file_size - offset) as usize);

        let mut walker = ChainWalker::new(entry.start_cluster, &geometry);
        for _ in 0..offset / cluster_bytes {
            if !walker.advance(&mut self.cache, &geometry)? {
                log::warn!("xfat: chain from {} ends before offset {offset}", entry.start_cluster);
                return Err(Error::SeekPastEnd);
            }
        }

        let mut in_cluster = (offset % cluster_bytes) as usize;
        let mut copied = 0usize;
        loop {
            let cluster = walker.current();
            let first = geometry.cluster_to_sector(cluster)?;

            while in_cluster < cluster_bytes as usize && copied < want {
                let sector_no = first
                    .checked_add((in_cluster / SECTOR_SIZE) as u32)
                    .ok_or(Error::InvalidCluster(cluster))?;
                let at = in_cluster % SECTOR_SIZE;
                let n = (SECTOR_SIZE - at).min(want - copied);

                let sector = self.cache.read_sector(sector_no)?;
                dest[copied..copied + n].copy_from_slice(&sector[at..at + n]);
                copied += n;
                in_cluster += n;
            }

            if copied == want {
                return Ok(copied);
            }
            if !walker.advance(&mut self.cache, &geometry)? {
                log::warn!(
                    "xfat: chain from {} ends after {copied} of {want} bytes",
                    entry.start_cluster
                );
                return Err(Error::CorruptChain);
            }
            in_cluster = 0;
        }
    }

    /// Resolve `path` and read it from `offset` into `dest`.
    pub fn read_file(&mut self, path: &str, dest: &mut [u8], offset: u32) -> Result<usize> {
        let entry = self.resolve(path)?;
        self.read(&entry, offset, dest)
    }

    /// A `..` that refers to the root stores cluster 0.
    fn dir_cluster(&self, dir: &DirectoryEntry) -> u32 {
        match dir.start_cluster {
            0 => self.geometry.root_cluster,
            n => n,
        }
    }

    /// Feed every live short-name entry of a directory chain to `visit`
    /// until it breaks, the end marker is reached, or the chain ends.
    fn scan_dir<F>(&mut self, start_cluster: u32, mut visit: F) -> Result<()>
    where
        F: FnMut(&DirectoryEntry) -> ControlFlow<()>,
    {
        let geometry = self.geometry;
        let mut walker = ChainWalker::new(start_cluster, &geometry);
        loop {
            let cluster = walker.current();
            let first = geometry.cluster_to_sector(cluster)?;
            for s in 0..geometry.cluster_sectors {
                let sector_no = first.checked_add(s).ok_or(Error::InvalidCluster(cluster))?;
                let sector = self.cache.read_sector(sector_no)?;
                for slot in 0..ENTRIES_PER_SECTOR {
                    match Slot::decode(sector, slot * DIR_ENTRY_SIZE) {
                        Slot::End => return Ok(()),
                        Slot::Live(entry) => {
                            if visit(&entry).is_break() {
                                return Ok(());
                            }
                        }
                        Slot::Deleted | Slot::LongName | Slot::VolumeLabel => {}
                    }
                }
            }
            if !walker.advance(&mut self.cache, &geometry)? {
                return Ok(());
            }
        }
    }
}
