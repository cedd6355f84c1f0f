use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

use xfat::{IoError, StorageProvider, SECTOR_SIZE};

/// Raw disk image file seen as a sector device.
pub struct FileDisk {
    path:         PathBuf,
    file:         Option<File>,
    sectors_read: u64,
}

impl FileDisk {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), file: None, sectors_read: 0 }
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Sectors successfully read since creation.
    pub fn sectors_read(&self) -> u64 {
        self.sectors_read
    }
}

impl StorageProvider for FileDisk {
    fn open(&mut self, sector_size: usize) -> Result<(), IoError> {
        if sector_size != SECTOR_SIZE {
            log::error!("unsupported sector size {sector_size}");
            return Err(IoError);
        }
        let file = File::open(&self.path).map_err(|e| {
            log::error!("cannot open {}: {e}", self.path.display());
            IoError
        })?;
        self.file = Some(file);
        Ok(())
    }

    fn read_sectors(&mut self, dest: &mut [u8], start_sector: u32, count: u32) -> Result<(), IoError> {
        let file = self.file.as_mut().ok_or(IoError)?;
        let len = count as usize * SECTOR_SIZE;
        let dest = dest.get_mut(..len).ok_or(IoError)?;
        file.seek(SeekFrom::Start(start_sector as u64 * SECTOR_SIZE as u64))
            .and_then(|_| file.read_exact(dest))
            .map_err(|e| {
                log::error!("read of {count} sector(s) at LBA {start_sector} failed: {e}");
                IoError
            })?;
        self.sectors_read += count as u64;
        Ok(())
    }

    fn close(&mut self) {
        if self.file.take().is_some() {
            log::debug!("closed {} after {} sector reads", self.path.display(), self.sectors_read);
        }
    }
}
