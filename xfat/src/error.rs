use core::fmt;

use xfat_api_types::Status;

use crate::storage::IoError;

/// Reason a boot sector was rejected at mount time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatError {
    /// Bytes 0x1FE..0x200 are not `55 AA`.
    BadSignature,
    /// Filesystem type string at 0x52 is not `"FAT32"`.
    NotFat32,
    UnsupportedSectorSize(u16),
    /// Sectors per cluster is zero or not a power of two.
    BadClusterSize(u8),
    NoReservedSectors,
    BadFatCount(u8),
    BadMediaType(u8),
    ZeroFatSize,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::BadSignature             => f.write_str("missing 0x55AA boot signature"),
            FormatError::NotFat32                 => f.write_str("filesystem type is not FAT32"),
            FormatError::UnsupportedSectorSize(n) => write!(f, "unsupported sector size {n}"),
            FormatError::BadClusterSize(n)        => write!(f, "sectors per cluster {n} is not a power of two"),
            FormatError::NoReservedSectors        => f.write_str("reserved sector count is zero"),
            FormatError::BadFatCount(n)           => write!(f, "unsupported FAT count {n}"),
            FormatError::BadMediaType(m)          => write!(f, "media type {m:#04x} outside FAT-ID range"),
            FormatError::ZeroFatSize              => f.write_str("sectors per FAT is zero"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The storage provider failed a read (or the LBA overflowed).
    Io,
    /// The boot sector does not describe a supported FAT32 volume.
    Format(FormatError),
    /// Bad-cluster marker in a chain, a chain longer than the volume, or a
    /// chain that ends before the file's declared size.
    CorruptChain,
    /// A cluster number outside `2..=max_cluster` or a reserved FAT value.
    InvalidCluster(u32),
    /// The file's chain ended before the requested offset.
    SeekPastEnd,
    NotFound,
    /// An intermediate path component is a file.
    NotADirectory,
    /// File data was requested from a directory entry.
    IsADirectory,
    PathTooLong,
    NotInitialized,
    AlreadyOpen,
    /// The host sector buffer is shorter than one sector.
    BufferTooSmall,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io                 => f.write_str("storage I/O error"),
            Error::Format(e)          => write!(f, "invalid FAT32 volume: {e}"),
            Error::CorruptChain       => f.write_str("corrupt cluster chain"),
            Error::InvalidCluster(c)  => write!(f, "invalid cluster {c:#x}"),
            Error::SeekPastEnd        => f.write_str("offset beyond end of cluster chain"),
            Error::NotFound           => f.write_str("no such file or directory"),
            Error::NotADirectory      => f.write_str("not a directory"),
            Error::IsADirectory       => f.write_str("is a directory"),
            Error::PathTooLong        => f.write_str("path too long"),
            Error::NotInitialized     => f.write_str("no volume mounted"),
            Error::AlreadyOpen        => f.write_str("a volume is already mounted"),
            Error::BufferTooSmall     => f.write_str("sector buffer smaller than 512 bytes"),
        }
    }
}

impl From<IoError> for Error {
    fn from(_: IoError) -> Self {
        Error::Io
    }
}

impl From<FormatError> for Error {
    fn from(e: FormatError) -> Self {
        Error::Format(e)
    }
}

impl From<Error> for Status {
    fn from(e: Error) -> Self {
        match e {
            Error::Io                => Status::IoError,
            Error::Format(_)         => Status::FormatError,
            Error::CorruptChain      => Status::CorruptChain,
            Error::InvalidCluster(_) => Status::InvalidCluster,
            Error::SeekPastEnd       => Status::SeekPastEnd,
            Error::NotFound          => Status::NotFound,
            Error::NotADirectory     => Status::NotADirectory,
            Error::IsADirectory      => Status::IsADirectory,
            Error::PathTooLong       => Status::PathTooLong,
            Error::NotInitialized    => Status::NotInitialized,
            Error::AlreadyOpen       => Status::AlreadyOpen,
            Error::BufferTooSmall    => Status::BufferTooSmall,
        }
    }
}
