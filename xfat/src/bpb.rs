//! FAT32 boot sector (BIOS Parameter Block) decoding and validation.
//!
//! Fields are read at their absolute offsets in the boot sector. The DOS 2.0
//! block starts at 0x0B, so most multi-byte fields are misaligned.

use crate::bytes::{le8, le16, le32};
use crate::error::FormatError;
use crate::SECTOR_SIZE;

// ─── Field offsets ─────────────────────────────────────────────────────────────

const BYTES_PER_SECTOR:   usize = 0x0B;
const SECTORS_PER_CLUS:   usize = 0x0D;
const RESERVED_SECTORS:   usize = 0x0E;
const NUM_FATS:           usize = 0x10;
const ROOT_ENTRY_COUNT:   usize = 0x11;
const TOTAL_SECTORS_16:   usize = 0x13;
const MEDIA:              usize = 0x15;
const FAT_SIZE_16:        usize = 0x16;
const HIDDEN_SECTORS:     usize = 0x1C;
const TOTAL_SECTORS_32:   usize = 0x20;
// FAT32 extension
const FAT_SIZE_32:        usize = 0x24;
const EXT_FLAGS:          usize = 0x28;
const FS_VERSION:         usize = 0x2A;
const ROOT_CLUSTER:       usize = 0x2C;
const FS_INFO:            usize = 0x30;
const BACKUP_BOOT_SECTOR: usize = 0x32;
const VOLUME_ID:          usize = 0x43;
const VOLUME_LABEL:       usize = 0x47;
const FS_TYPE:            usize = 0x52;
const SIGNATURE:          usize = 0x1FE;

/// Lowest media descriptor in the FAT-ID range.
const MEDIA_MIN: u8 = 0xE5;

/// When set in `ext_flags`, only the FAT numbered by the low nibble is active.
const EXT_FLAGS_NO_MIRROR: u16 = 0x0080;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bpb {
    pub bytes_per_sector:    u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors:    u16,
    pub fat_count:           u8,
    pub root_entry_count:    u16,
    pub total_sectors_16:    u16,
    pub media:               u8,
    pub fat_size_16:         u16,
    pub hidden_sectors:      u32,
    pub total_sectors_32:    u32,
    pub sectors_per_fat:     u32,
    pub ext_flags:           u16,
    pub fs_version:          u16,
    pub root_cluster:        u32,
    pub fs_info_sector:      u16,
    pub backup_boot_sector:  u16,
    pub volume_id:           u32,
    pub volume_label:        [u8; 11],
}

impl Bpb {
    /// Decode and validate the boot sector of a FAT32 volume.
    ///
    /// Only the checks needed to read the volume safely are applied; other
    /// fields are accepted as they are.
    pub fn parse(sector: &[u8; SECTOR_SIZE]) -> Result<Self, FormatError> {
        if sector[SIGNATURE] != 0x55 || sector[SIGNATURE + 1] != 0xAA {
            return Err(FormatError::BadSignature);
        }
        if &sector[FS_TYPE..FS_TYPE + 5] != b"FAT32" {
            return Err(FormatError::NotFat32);
        }

        let mut volume_label = [0u8; 11];
        volume_label.copy_from_slice(&sector[VOLUME_LABEL..VOLUME_LABEL + 11]);

        let bpb = Bpb {
            bytes_per_sector:    le16(sector, BYTES_PER_SECTOR),
            sectors_per_cluster: le8(sector, SECTORS_PER_CLUS),
            reserved_sectors:    le16(sector, RESERVED_SECTORS),
            fat_count:           le8(sector, NUM_FATS),
            root_entry_count:    le16(sector, ROOT_ENTRY_COUNT),
            total_sectors_16:    le16(sector, TOTAL_SECTORS_16),
            media:               le8(sector, MEDIA),
            fat_size_16:         le16(sector, FAT_SIZE_16),
            hidden_sectors:      le32(sector, HIDDEN_SECTORS),
            total_sectors_32:    le32(sector, TOTAL_SECTORS_32),
            sectors_per_fat:     le32(sector, FAT_SIZE_32),
            ext_flags:           le16(sector, EXT_FLAGS),
            fs_version:          le16(sector, FS_VERSION),
            root_cluster:        le32(sector, ROOT_CLUSTER),
            fs_info_sector:      le16(sector, FS_INFO),
            backup_boot_sector:  le16(sector, BACKUP_BOOT_SECTOR),
            volume_id:           le32(sector, VOLUME_ID),
            volume_label,
        };

        if bpb.bytes_per_sector as usize != SECTOR_SIZE {
            return Err(FormatError::UnsupportedSectorSize(bpb.bytes_per_sector));
        }
        if !bpb.sectors_per_cluster.is_power_of_two() {
            return Err(FormatError::BadClusterSize(bpb.sectors_per_cluster));
        }
        // Sector 0 is this boot sector.
        if bpb.reserved_sectors < 1 {
            return Err(FormatError::NoReservedSectors);
        }
        if bpb.fat_count != 1 && bpb.fat_count != 2 {
            return Err(FormatError::BadFatCount(bpb.fat_count));
        }
        if bpb.media < MEDIA_MIN {
            return Err(FormatError::BadMediaType(bpb.media));
        }
        if bpb.sectors_per_fat == 0 {
            return Err(FormatError::ZeroFatSize);
        }

        Ok(bpb)
    }

    /// Total sector count from the 32-bit field, else the 16-bit one.
    /// Zero when the boot sector records neither.
    pub fn total_sectors(&self) -> u32 {
        if self.total_sectors_32 != 0 {
            self.total_sectors_32
        } else {
            self.total_sectors_16 as u32
        }
    }

    /// Index of the single active FAT when mirroring is disabled.
    pub fn active_fat(&self) -> Option<u8> {
        if self.ext_flags & EXT_FLAGS_NO_MIRROR != 0 {
            Some((self.ext_flags & 0x000F) as u8)
        } else {
            None
        }
    }

    /// Volume label with trailing padding removed.
    pub fn label(&self) -> &str {
        let end = self.volume_label.iter().rposition(|&b| b != b' ' && b != 0).map_or(0, |i| i + 1);
        core::str::from_utf8(&self.volume_label[..end]).unwrap_or("")
    }
}
