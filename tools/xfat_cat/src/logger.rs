use core::fmt::Display;
use std::env;
use std::io::{self, IsTerminal, Write};

use log::{Level, LevelFilter, Log};
use owo_colors::OwoColorize;

/// Level used when `XFAT_LOG` is unset or unparsable.
const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

struct Inner {
    color: bool,
}

impl Inner {
    fn write_with_color(&mut self, color: Color, string: impl Display) {
        let string: &dyn Display = if !self.color {
            &string
        } else {
            match color {
                Color::Default => &string,
                Color::Gray => &string.dimmed(),
                Color::BrightRed => &string.bright_red(),
                Color::BrightYellow => &string.bright_yellow(),
                Color::BrightBlue => &string.bright_blue(),
                Color::BrightCyan => &string.bright_cyan(),
                Color::BrightMagenta => &string.bright_magenta(),
            }
        };
        // Nowhere left to report a failing stderr.
        let _ = write!(io::stderr().lock(), "{string}");
    }
}

struct CatLogger {
    inner: spin::Mutex<Inner>,
}

static LOGGER: CatLogger = CatLogger {
    inner: spin::Mutex::new(Inner { color: false }),
};

impl Log for CatLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut inner = self.inner.lock();
        let level = record.level();
        inner.write_with_color(
            match level {
                Level::Error => Color::BrightRed,
                Level::Warn => Color::BrightYellow,
                Level::Info => Color::BrightBlue,
                Level::Debug => Color::BrightCyan,
                Level::Trace => Color::BrightMagenta,
            },
            format_args!("{level:5} "),
        );
        inner.write_with_color(Color::Gray, format_args!("[{}] ", record.target()));
        inner.write_with_color(Color::Default, record.args());
        inner.write_with_color(Color::Default, "\n");
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Install the stderr logger. The level comes from `XFAT_LOG`
/// (`error`, `warn`, `info`, `debug`, `trace` or `off`).
pub fn init() -> Result<(), log::SetLoggerError> {
    LOGGER.inner.lock().color = io::stderr().is_terminal();
    log::set_max_level(level_from(env::var("XFAT_LOG").ok().as_deref()));
    log::set_logger(&LOGGER)
}

fn level_from(var: Option<&str>) -> LevelFilter {
    var.and_then(|s| s.trim().parse().ok()).unwrap_or(DEFAULT_LEVEL)
}

enum Color {
    Default,
    Gray,
    BrightRed,
    BrightYellow,
    BrightBlue,
    BrightCyan,
    BrightMagenta,
}
