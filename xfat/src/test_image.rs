//! In-memory disks and hand-built FAT32 volumes for unit tests.

extern crate std;
use std::io::{Cursor, Write};
use std::vec::Vec;

use crate::storage::{IoError, StorageProvider};
use crate::SECTOR_SIZE;

// ── Mock storage provider backed by Vec<u8> ──────────────────────────────────

pub struct MemDisk {
    pub data:        Vec<u8>,
    /// Number of `read_sectors` calls issued.
    pub reads:       usize,
    /// Reads covering this LBA fail.
    pub fail_lba:    Option<u32>,
    pub fail_open:   bool,
    pub open_calls:  usize,
    pub close_calls: usize,
}

impl MemDisk {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, reads: 0, fail_lba: None, fail_open: false, open_calls: 0, close_calls: 0 }
    }
}

impl StorageProvider for MemDisk {
    fn open(&mut self, sector_size: usize) -> Result<(), IoError> {
        self.open_calls += 1;
        if self.fail_open || sector_size != SECTOR_SIZE {
            return Err(IoError);
        }
        Ok(())
    }

    fn read_sectors(&mut self, dest: &mut [u8], start_sector: u32, count: u32) -> Result<(), IoError> {
        self.reads += 1;
        if let Some(bad) = self.fail_lba {
            if (start_sector..start_sector + count).contains(&bad) {
                return Err(IoError);
            }
        }
        let off = start_sector as usize * SECTOR_SIZE;
        let len = count as usize * SECTOR_SIZE;
        if off + len > self.data.len() || dest.len() < len {
            return Err(IoError);
        }
        dest[..len].copy_from_slice(&self.data[off..off + len]);
        Ok(())
    }

    fn close(&mut self) {
        self.close_calls += 1;
    }
}

// ── Hand-built volumes ───────────────────────────────────────────────────────

/// A valid FAT32 boot sector with the given layout.
pub fn boot_sector(reserved: u16, fats: u8, spf: u32, spc: u8, total: u32, root: u32) -> [u8; SECTOR_SIZE] {
    let mut s = [0u8; SECTOR_SIZE];
    s[0..3].copy_from_slice(&[0xEB, 0x58, 0x90]);
    s[3..11].copy_from_slice(b"XFATTEST");
    s[0x0B..0x0D].copy_from_slice(&512u16.to_le_bytes());
    s[0x0D] = spc;
    s[0x0E..0x10].copy_from_slice(&reserved.to_le_bytes());
    s[0x10] = fats;
    s[0x15] = 0xF8;
    s[0x20..0x24].copy_from_slice(&total.to_le_bytes());
    s[0x24..0x28].copy_from_slice(&spf.to_le_bytes());
    s[0x2C..0x30].copy_from_slice(&root.to_le_bytes());
    s[0x30..0x32].copy_from_slice(&1u16.to_le_bytes());
    s[0x32..0x34].copy_from_slice(&6u16.to_le_bytes());
    s[0x42] = 0x29;
    s[0x43..0x47].copy_from_slice(&0x1234_5678u32.to_le_bytes());
    s[0x47..0x52].copy_from_slice(b"XFAT TEST  ");
    s[0x52..0x5A].copy_from_slice(b"FAT32   ");
    s[0x1FE] = 0x55;
    s[0x1FF] = 0xAA;
    s
}

pub const EOC: u32 = 0x0FFF_FFFF;
pub const ATTR_DIR: u8 = 0x10;
pub const ATTR_FILE: u8 = 0x20;

/// Small FAT32 volume laid out by hand: `reserved` sectors, two FATs of
/// `spf` sectors, then the data region. The root directory is cluster 2.
pub struct Image {
    pub data:     Vec<u8>,
    pub reserved: u32,
    pub fats:     u32,
    pub spf:      u32,
    pub spc:      u32,
}

impl Image {
    pub fn new(spc: u8) -> Self {
        Self::with_layout(4, 2, 1, spc, 128)
    }

    pub fn with_layout(reserved: u16, fats: u8, spf: u32, spc: u8, total: u32) -> Self {
        let mut data = vec![0u8; total as usize * SECTOR_SIZE];
        data[..SECTOR_SIZE].copy_from_slice(&boot_sector(reserved, fats, spf, spc, total, 2));
        let mut img = Image {
            data,
            reserved: reserved as u32,
            fats: fats as u32,
            spf,
            spc: spc as u32,
        };
        img.set_fat(0, 0x0FFF_FFF8);
        img.set_fat(1, EOC);
        img.set_fat(2, EOC);
        img
    }

    /// Write a FAT entry into every FAT copy.
    pub fn set_fat(&mut self, cluster: u32, value: u32) {
        for fat in 0..self.fats {
            self.set_fat_in(fat, cluster, value);
        }
    }

    pub fn set_fat_in(&mut self, fat: u32, cluster: u32, value: u32) {
        let off = (self.reserved + fat * self.spf) as usize * SECTOR_SIZE + cluster as usize * 4;
        self.data[off..off + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Link `clusters` into one chain ending in EOC.
    pub fn chain(&mut self, clusters: &[u32]) {
        for pair in clusters.windows(2) {
            self.set_fat(pair[0], pair[1]);
        }
        if let Some(&last) = clusters.last() {
            self.set_fat(last, EOC);
        }
    }

    pub fn cluster_offset(&self, cluster: u32) -> usize {
        let data_start = self.reserved + self.fats * self.spf;
        (data_start + (cluster - 2) * self.spc) as usize * SECTOR_SIZE
    }

    /// Store a 32-byte record in slot `slot` of directory cluster `dir`.
    pub fn put_entry(&mut self, dir: u32, slot: usize, entry: [u8; 32]) {
        let off = self.cluster_offset(dir) + slot * 32;
        self.data[off..off + 32].copy_from_slice(&entry);
    }

    pub fn fill_cluster(&mut self, cluster: u32, bytes: &[u8]) {
        let off = self.cluster_offset(cluster);
        self.data[off..off + bytes.len()].copy_from_slice(bytes);
    }

    pub fn disk(&self) -> MemDisk {
        MemDisk::new(self.data.clone())
    }
}

/// A raw short-name directory record.
pub fn raw_entry(name: &[u8; 11], attr: u8, cluster: u32, size: u32) -> [u8; 32] {
    let mut e = [0u8; 32];
    e[..11].copy_from_slice(name);
    e[11] = attr;
    // 2024-05-17 13:45:30, created a little earlier.
    e[13] = 150;
    e[14..16].copy_from_slice(&0x6DAEu16.to_le_bytes());
    e[16..18].copy_from_slice(&0x58B1u16.to_le_bytes());
    e[18..20].copy_from_slice(&0x58B1u16.to_le_bytes());
    e[20..22].copy_from_slice(&((cluster >> 16) as u16).to_le_bytes());
    e[22..24].copy_from_slice(&0x6DAFu16.to_le_bytes());
    e[24..26].copy_from_slice(&0x58B1u16.to_le_bytes());
    e[26..28].copy_from_slice(&(cluster as u16).to_le_bytes());
    e[28..32].copy_from_slice(&size.to_le_bytes());
    e
}

/// A long-filename record; never matches a short-name lookup.
pub fn lfn_entry(order: u8) -> [u8; 32] {
    let mut e = [0xFFu8; 32];
    e[0] = order;
    e[11] = 0x0F;
    e[12] = 0;
    e[26] = 0;
    e[27] = 0;
    e
}

pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

// ── Real images built with the `fatfs` crate ─────────────────────────────────

/// Create an in-memory FAT32 image using the `fatfs` std crate.
///
/// FAT32 requires ≥65 525 data clusters, so the disk must be a few tens of
/// megabytes for `fatfs` to pick FAT32. We use 40 MB.
pub fn fatfs_image(build: impl FnOnce(&fatfs::Dir<&mut Cursor<&mut Vec<u8>>>)) -> Vec<u8> {
    const SIZE: usize = 40 * 1024 * 1024;
    let mut data = vec![0u8; SIZE];
    {
        let mut cursor = Cursor::new(&mut data);
        fatfs::format_volume(
            &mut cursor,
            fatfs::FormatVolumeOptions::new().fat_type(fatfs::FatType::Fat32),
        ).expect("format_volume failed");
    }
    {
        let mut cursor = Cursor::new(&mut data);
        let fs = fatfs::FileSystem::new(&mut cursor, fatfs::FsOptions::new())
            .expect("FileSystem::new failed");
        build(&fs.root_dir());
    }
    data
}

/// Write `content` to a new file `name` in `dir`.
pub fn add_file<T: fatfs::ReadWriteSeek>(dir: &fatfs::Dir<T>, name: &str, content: &[u8]) {
    let mut f = dir.create_file(name).expect("create_file failed");
    f.truncate().unwrap();
    f.write_all(content).unwrap();
}
