#![no_std]

#[cfg(test)]
extern crate std;

/// Only 512-byte sectors are supported.
pub const SECTOR_SIZE: usize = 512;

/// Longest path accepted by the resolver, in bytes.
pub const PATH_MAX: usize = 128;

/// Status codes handed back to bootloader glue code.
///
/// Every engine error maps to exactly one code, so callers written in
/// assembly or C can decide whether to retry, fall back or halt.
#[repr(u64)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok             = 0,
    IoError        = 1,
    FormatError    = 2,
    CorruptChain   = 3,
    InvalidCluster = 4,
    SeekPastEnd    = 5,
    NotFound       = 6,
    NotADirectory  = 7,
    IsADirectory   = 8,
    PathTooLong    = 9,
    NotInitialized = 10,
    AlreadyOpen    = 11,
    BufferTooSmall = 12,
}

impl Status {
    pub fn from_u64(v: u64) -> Self {
        match v {
            0  => Status::Ok,
            2  => Status::FormatError,
            3  => Status::CorruptChain,
            4  => Status::InvalidCluster,
            5  => Status::SeekPastEnd,
            6  => Status::NotFound,
            7  => Status::NotADirectory,
            8  => Status::IsADirectory,
            9  => Status::PathTooLong,
            10 => Status::NotInitialized,
            11 => Status::AlreadyOpen,
            12 => Status::BufferTooSmall,
            _  => Status::IoError,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }

    /// Whether retrying the whole operation may succeed.
    pub fn is_transient(self) -> bool {
        self == Status::IoError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_decode_to_themselves() {
        for code in 0..=12u64 {
            assert_eq!(Status::from_u64(code) as u64, code);
        }
    }

    #[test]
    fn unknown_code_is_io_error() {
        assert_eq!(Status::from_u64(13), Status::IoError);
        assert_eq!(Status::from_u64(u64::MAX), Status::IoError);
    }

    #[test]
    fn only_io_is_transient() {
        assert!(Status::IoError.is_transient());
        assert!(!Status::FormatError.is_transient());
        assert!(!Status::NotFound.is_transient());
    }
}
