mod disk;
mod logger;

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use xfat::{Attributes, DirectoryEntry, Error, Volume, Xfat, SECTOR_SIZE};
use xfat_api_types::Status;

use crate::disk::FileDisk;

const USAGE: &str = "usage: xfat_cat <image> <path> [offset] [length]";
/// `EX_USAGE` from sysexits.h.
const EXIT_USAGE: u8 = 64;
const CHUNK: usize = 64 * 1024;
const LIST_PAGE: usize = 16;

#[derive(Debug, PartialEq, Eq)]
struct Args {
    image:     PathBuf,
    path:      String,
    offset:    u32,
    length:    Option<u64>,
    start_lba: u32,
}

fn parse_args(args: &[String], lba_var: Option<&str>) -> Result<Args, String> {
    let [_, image, path, rest @ ..] = args else {
        return Err(USAGE.into());
    };
    if rest.len() > 2 {
        return Err(USAGE.into());
    }
    let offset = match rest.first() {
        Some(s) => s.parse::<u32>().map_err(|e| format!("bad offset {s:?}: {e}"))?,
        None => 0,
    };
    let length = match rest.get(1) {
        Some(s) => Some(s.parse::<u64>().map_err(|e| format!("bad length {s:?}: {e}"))?),
        None => None,
    };
    let start_lba = match lba_var {
        Some(s) => s.parse::<u32>().map_err(|e| format!("bad XFAT_LBA {s:?}: {e}"))?,
        None => 0,
    };
    Ok(Args { image: image.into(), path: path.clone(), offset, length, start_lba })
}

fn main() -> ExitCode {
    if let Err(e) = logger::init() {
        eprintln!("xfat_cat: logger: {e}");
    }

    let argv: Vec<String> = env::args().collect();
    let args = match parse_args(&argv, env::var("XFAT_LBA").ok().as_deref()) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let mut out = io::stdout().lock();
    match run(&args, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}: {e}", args.path);
            ExitCode::from(Status::from(e) as u8)
        }
    }
}

fn run(args: &Args, out: &mut impl Write) -> Result<(), Error> {
    let sector_count = std::fs::metadata(&args.image)
        .map(|m| u32::try_from(m.len() / SECTOR_SIZE as u64).unwrap_or(u32::MAX))
        .unwrap_or(0);

    let mut disk = FileDisk::new(&args.image);
    let mut buffer = [0u8; SECTOR_SIZE];
    let mut fs = Xfat::new();
    fs.init(args.start_lba, sector_count, &mut disk, &mut buffer)?;

    let result = print_path(&mut fs, args, out);
    fs.close()?;
    result
}

fn print_path(fs: &mut Xfat<'_, FileDisk>, args: &Args, out: &mut impl Write) -> Result<(), Error> {
    let entry = fs.stat(&args.path)?;
    if entry.is_dir() {
        list(fs, &args.path, out)
    } else {
        cat(fs.volume()?, &entry, args.offset, args.length, out)
    }
}

/// Stream `entry` from `offset`, `length` bytes at most, in `CHUNK` pieces.
fn cat(
    volume: &mut Volume<'_, FileDisk>,
    entry:  &DirectoryEntry,
    offset: u32,
    length: Option<u64>,
    out:    &mut impl Write,
) -> Result<(), Error> {
    let mut chunk = vec![0u8; CHUNK];
    let mut pos = offset;
    let mut left = length.unwrap_or(u64::MAX);
    while left > 0 {
        let want = chunk.len().min(usize::try_from(left).unwrap_or(usize::MAX));
        let n = volume.read(entry, pos, &mut chunk[..want])?;
        if n == 0 {
            break;
        }
        out.write_all(&chunk[..n]).map_err(|_| Error::Io)?;
        left -= n as u64;
        pos = pos.saturating_add(n as u32);
    }
    out.flush().map_err(|_| Error::Io)
}

fn list(fs: &mut Xfat<'_, FileDisk>, path: &str, out: &mut impl Write) -> Result<(), Error> {
    let mut page = [DirectoryEntry::root(0); LIST_PAGE];
    let mut skip = 0;
    loop {
        let n = fs.list_dir(path, skip, &mut page)?;
        for entry in &page[..n] {
            writeln!(out, "{}", format_entry(entry)).map_err(|_| Error::Io)?;
        }
        if n < page.len() {
            return Ok(());
        }
        skip += n;
    }
}

fn format_entry(entry: &DirectoryEntry) -> String {
    let (name, len) = entry.display_name();
    let name = String::from_utf8_lossy(&name[..len]);
    let a = entry.attributes;
    let flag = |f: Attributes, c: char| if a.contains(f) { c } else { '-' };
    let m = entry.modified();
    format!(
        "{}{}{}{}{} {:>10} {:04}-{:02}-{:02} {:02}:{:02} {}{}",
        flag(Attributes::DIRECTORY, 'd'),
        flag(Attributes::READ_ONLY, 'r'),
        flag(Attributes::HIDDEN, 'h'),
        flag(Attributes::SYSTEM, 's'),
        flag(Attributes::ARCHIVE, 'a'),
        entry.file_size,
        m.year,
        m.month,
        m.day,
        m.hour,
        m.minute,
        name,
        if entry.is_dir() { "/" } else { "" },
    )
}
