//! Minimal read-only FAT32 reader for memory-constrained bootloaders.
//!
//! One caller-provided sector buffer, no heap, bounded stack. A volume is
//! mounted over a [`StorageProvider`] and files are read by path with
//! [`Xfat::read_file`], or through a [`Volume`] directly.
//!
//! Little-endian on-disk structures are decoded byte by byte, so the host
//! may be of any alignment discipline.

// No_std when not testing (e.g. `cargo check --target x86_64-unknown-none`).
#![cfg_attr(not(test), no_std)]

pub mod bpb;
pub mod bytes;
pub mod cache;
pub mod dir;
pub mod engine;
pub mod error;
pub mod fat;
pub mod path;
pub mod storage;
pub mod volume;

#[cfg(test)]
mod test_image;

pub use bpb::Bpb;
pub use dir::{Attributes, DirectoryEntry};
pub use engine::Xfat;
pub use error::{Error, FormatError};
pub use fat::ClusterStep;
pub use storage::{IoError, StorageProvider};
pub use volume::{Geometry, Volume};
pub use xfat_api_types::{PATH_MAX, SECTOR_SIZE};

pub type Result<T> = core::result::Result<T, Error>;
