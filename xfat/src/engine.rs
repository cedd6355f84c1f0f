//! Engine entry points with an explicit open/closed lifecycle.
//!
//! [`Xfat`] holds at most one mounted [`Volume`]. The host owns the value
//! (typically one per boot stage) and passes it to every call, so there is
//! no global state to initialise.

use crate::dir::DirectoryEntry;
use crate::storage::StorageProvider;
use crate::volume::Volume;
use crate::{Error, Result};

pub struct Xfat<'a, S: StorageProvider + ?Sized> {
    volume: Option<Volume<'a, S>>,
}

impl<'a, S: StorageProvider + ?Sized> Default for Xfat<'a, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, S: StorageProvider + ?Sized> Xfat<'a, S> {
    pub const fn new() -> Self {
        Self { volume: None }
    }

    pub fn is_open(&self) -> bool {
        self.volume.is_some()
    }

    /// Mount the FAT32 volume starting at `start_lba` on `storage`.
    ///
    /// All or nothing: on error the engine stays closed. Fails with
    /// [`Error::AlreadyOpen`] while a volume is mounted, leaving that volume
    /// untouched; call [`close`](Self::close) first to switch volumes.
    pub fn init(
        &mut self,
        start_lba:    u32,
        sector_count: u32,
        storage:      &'a mut S,
        buffer:       &'a mut [u8],
    ) -> Result<()> {
        if self.volume.is_some() {
            log::warn!("xfat: init while a volume is open");
            return Err(Error::AlreadyOpen);
        }
        self.volume = Some(Volume::mount(start_lba, sector_count, storage, buffer)?);
        Ok(())
    }

    /// Read the file at `path` from byte `offset` into `dest`.
    /// Returns the number of bytes read.
    pub fn read_file(&mut self, path: &str, dest: &mut [u8], offset: u32) -> Result<usize> {
        self.volume()?.read_file(path, dest, offset)
    }

    pub fn stat(&mut self, path: &str) -> Result<DirectoryEntry> {
        self.volume()?.resolve(path)
    }

    /// List the directory at `path`; see [`Volume::list_dir`].
    pub fn list_dir(&mut self, path: &str, skip: usize, out: &mut [DirectoryEntry]) -> Result<usize> {
        let volume = self.volume()?;
        let dir = volume.resolve(path)?;
        volume.list_dir(&dir, skip, out)
    }

    /// The mounted volume, for lower-level access.
    pub fn volume(&mut self) -> Result<&mut Volume<'a, S>> {
        self.volume.as_mut().ok_or(Error::NotInitialized)
    }

    /// Unmount and close the storage provider.
    pub fn close(&mut self) -> Result<()> {
        let volume = self.volume.take().ok_or(Error::NotInitialized)?;
        volume.unmount();
        log::info!("xfat: volume closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_image::{pattern, raw_entry, Image, MemDisk, ATTR_DIR, ATTR_FILE, EOC};
    use crate::SECTOR_SIZE;

    fn boot_image() -> Image {
        let mut img = Image::new(1);
        img.put_entry(2, 0, raw_entry(b"BOOT       ", ATTR_DIR, 3, 0));
        img.set_fat(3, EOC);
        img.put_entry(3, 0, raw_entry(b"KERNEL  BIN", ATTR_FILE, 4, 700));
        img.chain(&[4, 5]);
        let content = pattern(700, 1);
        img.fill_cluster(4, &content[..512]);
        img.fill_cluster(5, &content[512..]);
        img
    }

    #[test]
    fn calls_before_init_fail() {
        let mut fs: Xfat<'_, MemDisk> = Xfat::new();
        let mut out = [0u8; 8];
        assert!(!fs.is_open());
        assert_eq!(fs.read_file("/boot/kernel.bin", &mut out, 0), Err(Error::NotInitialized));
        assert_eq!(fs.stat("/"), Err(Error::NotInitialized));
        assert_eq!(fs.close(), Err(Error::NotInitialized));
    }

    #[test]
    fn init_then_read() {
        let img = boot_image();
        let mut disk = img.disk();
        let mut buf = [0u8; SECTOR_SIZE];
        let mut fs = Xfat::new();
        fs.init(0, 0, &mut disk, &mut buf).unwrap();
        assert!(fs.is_open());

        let mut out = [0u8; 1024];
        assert_eq!(fs.read_file("/boot/kernel.bin", &mut out, 0), Ok(700));
        assert_eq!(&out[..700], &pattern(700, 1)[..]);
        assert_eq!(fs.read_file("/boot/kernel.bin", &mut out, 650), Ok(50));
        assert_eq!(fs.stat("/boot").map(|e| e.is_dir()), Ok(true));
    }

    #[test]
    fn second_init_is_rejected() {
        let img = boot_image();
        let mut first = img.disk();
        let mut other = img.disk();
        let mut buf = [0u8; SECTOR_SIZE];
        let mut spare = [0u8; SECTOR_SIZE];
        {
            let mut fs = Xfat::new();
            fs.init(0, 0, &mut first, &mut buf).unwrap();
            assert_eq!(fs.init(0, 0, &mut other, &mut spare), Err(Error::AlreadyOpen));
            // The first volume is still mounted.
            assert_eq!(fs.stat("/boot/kernel.bin").map(|e| e.file_size), Ok(700));
        }
        assert_eq!(other.open_calls, 0);
    }

    #[test]
    fn failed_init_leaves_engine_closed() {
        let mut img = boot_image();
        img.data[0x1FE] = 0;
        let mut disk = img.disk();
        let mut buf = [0u8; SECTOR_SIZE];
        {
            let mut fs = Xfat::new();
            assert!(matches!(fs.init(0, 0, &mut disk, &mut buf), Err(Error::Format(_))));
            assert!(!fs.is_open());
            assert_eq!(fs.stat("/"), Err(Error::NotInitialized));
        }
        assert_eq!(disk.open_calls, 1);
        assert_eq!(disk.close_calls, 1);
    }

    #[test]
    fn close_then_reinit() {
        let img = boot_image();
        let mut first = img.disk();
        let mut second = img.disk();
        let mut buf = [0u8; SECTOR_SIZE];
        let mut buf2 = [0u8; SECTOR_SIZE];
        {
            let mut fs = Xfat::new();
            fs.init(0, 0, &mut first, &mut buf).unwrap();
            assert_eq!(fs.close(), Ok(()));
            assert!(!fs.is_open());
            fs.init(0, 0, &mut second, &mut buf2).unwrap();
            let mut out = [0u8; 4];
            assert_eq!(fs.read_file("boot\\kernel.bin", &mut out, 0), Ok(4));
        }
        assert_eq!(first.close_calls, 1);
        assert_eq!(second.close_calls, 0);
    }

    #[test]
    fn list_dir_by_path() {
        let img = boot_image();
        let mut disk = img.disk();
        let mut buf = [0u8; SECTOR_SIZE];
        let mut fs = Xfat::new();
        fs.init(0, 0, &mut disk, &mut buf).unwrap();
        let mut out = [DirectoryEntry::root(0); 4];
        assert_eq!(fs.list_dir("/", 0, &mut out), Ok(1));
        assert!(out[0].is_dir());
        assert_eq!(fs.list_dir("/boot", 0, &mut out), Ok(1));
        assert_eq!(out[0].file_size, 700);
        assert_eq!(fs.list_dir("/boot/kernel.bin", 0, &mut out), Err(Error::NotADirectory));
    }

    #[test]
    fn errors_map_to_status_codes() {
        use xfat_api_types::Status;
        let mut fs: Xfat<'_, MemDisk> = Xfat::default();
        let status: Status = fs.stat("/").unwrap_err().into();
        assert_eq!(status, Status::NotInitialized);
    }
}
