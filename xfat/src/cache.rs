//! One-sector read cache.
//!
//! The only sector buffer the engine ever touches is the one the host hands
//! to [`crate::Volume::mount`]. Reading a different sector evicts the
//! previous one. There is no LRU and no prefetch.

use crate::storage::{IoError, StorageProvider};
use crate::SECTOR_SIZE;

pub struct SectorCache<'a, S: StorageProvider + ?Sized> {
    storage:   &'a mut S,
    buffer:    &'a mut [u8; SECTOR_SIZE],
    start_lba: u32,
    current:   Option<u32>,
}

impl<'a, S: StorageProvider + ?Sized> SectorCache<'a, S> {
    /// Sector numbers passed to [`read_sector`](Self::read_sector) are
    /// relative to `start_lba`.
    pub fn new(storage: &'a mut S, buffer: &'a mut [u8; SECTOR_SIZE], start_lba: u32) -> Self {
        Self { storage, buffer, start_lba, current: None }
    }

    /// Return the contents of volume-relative sector `n`.
    ///
    /// A hit returns the held buffer without I/O. A miss issues one
    /// single-sector read; if it fails the cache holds nothing afterwards.
    pub fn read_sector(&mut self, n: u32) -> Result<&[u8; SECTOR_SIZE], IoError> {
        if self.current == Some(n) {
            return Ok(&*self.buffer);
        }

        // The buffer is about to be overwritten, possibly partially.
        self.current = None;
        let lba = self.start_lba.checked_add(n).ok_or(IoError)?;
        log::trace!("xfat: cache miss, reading LBA {lba}");
        self.storage.read_sectors(&mut self.buffer[..], lba, 1)?;
        self.current = Some(n);
        Ok(&*self.buffer)
    }

    /// Sector currently held, if any.
    pub fn current_sector(&self) -> Option<u32> {
        self.current
    }

    pub fn invalidate(&mut self) {
        self.current = None;
    }

    pub fn start_lba(&self) -> u32 {
        self.start_lba
    }

    /// Drop the held sector and close the provider.
    pub fn close(&mut self) {
        self.invalidate();
        self.storage.close();
    }
}
