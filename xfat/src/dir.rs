//! 32-byte FAT directory records.

use bitflags::bitflags;

use crate::bytes::{le8, le16, le32};

pub const DIR_ENTRY_SIZE: usize = 32;
pub const ENTRIES_PER_SECTOR: usize = crate::SECTOR_SIZE / DIR_ENTRY_SIZE;

const END_MARKER:     u8 = 0x00;
const DELETED_MARKER: u8 = 0xE5;
/// Stored in place of a leading 0xE5 that is part of the real name.
const KANJI_E5:       u8 = 0x05;

// ─── Record layout ─────────────────────────────────────────────────────────────

const NAME:          usize = 0x00;
const EXT:           usize = 0x08;
const ATTR:          usize = 0x0B;
const CRT_TENTHS:    usize = 0x0D;
const CRT_TIME:      usize = 0x0E;
const CRT_DATE:      usize = 0x10;
const ACC_DATE:      usize = 0x12;
const CLUSTER_HI:    usize = 0x14;
const MOD_TIME:      usize = 0x16;
const MOD_DATE:      usize = 0x18;
const CLUSTER_LO:    usize = 0x1A;
const FILE_SIZE:     usize = 0x1C;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Attributes: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN    = 0x02;
        const SYSTEM    = 0x04;
        const VOLUME_ID = 0x08;
        const DIRECTORY = 0x10;
        const ARCHIVE   = 0x20;
        const LONG_NAME = Self::READ_ONLY.bits() | Self::HIDDEN.bits()
                        | Self::SYSTEM.bits() | Self::VOLUME_ID.bits();

        // The disk may set any bits
        const _ = !0;
    }
}

/// Date and time as recorded by DOS (2-second resolution, local time).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DateTime {
    pub year:   u16,
    pub month:  u8,
    pub day:    u8,
    pub hour:   u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTime {
    fn from_dos(date: u16, time: u16, tenths: u8) -> Self {
        DateTime {
            year:   1980 + (date >> 9),
            month:  ((date >> 5) & 0x0F) as u8,
            day:    (date & 0x1F) as u8,
            hour:   (time >> 11) as u8,
            minute: ((time >> 5) & 0x3F) as u8,
            second: ((time & 0x1F) * 2) as u8 + tenths / 100,
        }
    }
}

/// Decoded short-name directory record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name:          [u8; 8],
    pub ext:           [u8; 3],
    pub attributes:    Attributes,
    pub start_cluster: u32,
    pub file_size:     u32,
    crt_tenths:        u8,
    crt_time:          u16,
    crt_date:          u16,
    acc_date:          u16,
    mod_time:          u16,
    mod_date:          u16,
}

/// What a 32-byte directory slot holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    /// No entries follow in this directory.
    End,
    Deleted,
    /// Long-filename fragment; skipped, never decoded.
    LongName,
    VolumeLabel,
    Live(DirectoryEntry),
}

impl Slot {
    /// Classify the slot at `offset` in a directory sector.
    pub fn decode(sector: &[u8], offset: usize) -> Slot {
        let entry = DirectoryEntry::decode(sector, offset);
        if !entry.is_live() {
            return if entry.name[0] == END_MARKER { Slot::End } else { Slot::Deleted };
        }
        if entry.is_long_name() {
            Slot::LongName
        } else if entry.attributes.contains(Attributes::VOLUME_ID) {
            Slot::VolumeLabel
        } else {
            Slot::Live(entry)
        }
    }
}

impl DirectoryEntry {
    /// Decode the record at `offset`. `buf` must hold at least 32 bytes there.
    pub fn decode(buf: &[u8], offset: usize) -> Self {
        let rec = &buf[offset..offset + DIR_ENTRY_SIZE];
        let mut name = [0u8; 8];
        let mut ext = [0u8; 3];
        name.copy_from_slice(&rec[NAME..NAME + 8]);
        ext.copy_from_slice(&rec[EXT..EXT + 3]);
        DirectoryEntry {
            name,
            ext,
            attributes:    Attributes::from_bits_retain(le8(rec, ATTR)),
            start_cluster: ((le16(rec, CLUSTER_HI) as u32) << 16) | le16(rec, CLUSTER_LO) as u32,
            file_size:     le32(rec, FILE_SIZE),
            crt_tenths:    le8(rec, CRT_TENTHS),
            crt_time:      le16(rec, CRT_TIME),
            crt_date:      le16(rec, CRT_DATE),
            acc_date:      le16(rec, ACC_DATE),
            mod_time:      le16(rec, MOD_TIME),
            mod_date:      le16(rec, MOD_DATE),
        }
    }

    /// Synthetic entry standing for the root directory, which has no record.
    pub fn root(cluster: u32) -> Self {
        DirectoryEntry {
            name: *b"/       ",
            ext: *b"   ",
            attributes: Attributes::DIRECTORY,
            start_cluster: cluster,
            file_size: 0,
            crt_tenths: 0,
            crt_time: 0,
            crt_date: 0,
            acc_date: 0,
            mod_time: 0,
            mod_date: 0,
        }
    }

    /// Not an end marker and not deleted.
    pub fn is_live(&self) -> bool {
        self.name[0] != END_MARKER && self.name[0] != DELETED_MARKER
    }

    pub fn is_long_name(&self) -> bool {
        self.attributes.contains(Attributes::LONG_NAME)
    }

    pub fn is_dir(&self) -> bool {
        self.attributes.contains(Attributes::DIRECTORY)
    }

    /// The 11 raw name bytes, with a leading 0x05 restored to 0xE5.
    pub fn raw_name(&self) -> [u8; 11] {
        let mut raw = [0u8; 11];
        raw[..8].copy_from_slice(&self.name);
        raw[8..].copy_from_slice(&self.ext);
        if raw[0] == KANJI_E5 {
            raw[0] = DELETED_MARKER;
        }
        raw
    }

    /// Case-insensitive comparison against a padded 8.3 name.
    pub fn matches(&self, short: &[u8; 11]) -> bool {
        self.raw_name().eq_ignore_ascii_case(short)
    }

    /// Returns the short 8.3 name as (buf, len), e.g. `"HELLO   TXT"` → `"HELLO.TXT"`.
    pub fn display_name(&self) -> ([u8; 12], usize) {
        let raw = self.raw_name();
        let mut buf = [0u8; 12];
        let mut len = 0usize;
        let name_end = raw[..8].iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
        buf[..name_end].copy_from_slice(&raw[..name_end]);
        len += name_end;
        let ext_end = raw[8..].iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
        if ext_end > 0 {
            buf[len] = b'.';
            len += 1;
            buf[len..len + ext_end].copy_from_slice(&raw[8..8 + ext_end]);
            len += ext_end;
        }
        (buf, len)
    }

    pub fn created(&self) -> DateTime {
        DateTime::from_dos(self.crt_date, self.crt_time, self.crt_tenths)
    }

    pub fn modified(&self) -> DateTime {
        DateTime::from_dos(self.mod_date, self.mod_time, 0)
    }

    /// Last access; FAT records only the date.
    pub fn accessed(&self) -> DateTime {
        DateTime::from_dos(self.acc_date, 0, 0)
    }
}

/// Convert one path component into the padded, upper-case 11-byte form
/// stored on disk. Returns `None` for anything that cannot be an 8.3 name.
pub fn short_name(component: &[u8]) -> Option<[u8; 11]> {
    let mut out = [b' '; 11];
    match component {
        b"." => {
            out[0] = b'.';
            return Some(out);
        }
        b".." => {
            out[..2].copy_from_slice(b"..");
            return Some(out);
        }
        _ => {}
    }

    let (base, ext) = match component.iter().position(|&b| b == b'.') {
        Some(i) => (&component[..i], &component[i + 1..]),
        None    => (component, &[][..]),
    };
    if base.is_empty() || base.len() > 8 || ext.len() > 3 || ext.contains(&b'.') {
        return None;
    }
    for (dst, &b) in out[..8].iter_mut().zip(base) {
        *dst = b.to_ascii_uppercase();
    }
    for (dst, &b) in out[8..].iter_mut().zip(ext) {
        *dst = b.to_ascii_uppercase();
    }
    Some(out)
}
