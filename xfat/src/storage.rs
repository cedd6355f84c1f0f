// ─── Storage provider abstraction ──────────────────────────────────────────────

/// Failure reported by a [`StorageProvider`]. The engine never retries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IoError;

/// Sector-granular block device supplied by the bootloader.
///
/// All disk I/O goes through this trait, so the engine can be driven by a
/// BIOS/firmware call, a controller driver, or an in-memory image in tests.
/// Sector numbers are absolute LBAs; the engine adds the partition start.
pub trait StorageProvider {
    /// Prepare the device for transfers of `sector_size` bytes.
    fn open(&mut self, sector_size: usize) -> Result<(), IoError>;

    /// Read `count` sectors starting at `start_sector` into `dest`.
    /// `dest` is at least `count * sector_size` bytes long.
    fn read_sectors(&mut self, dest: &mut [u8], start_sector: u32, count: u32) -> Result<(), IoError>;

    fn close(&mut self);
}
