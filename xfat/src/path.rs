//! Path tokenizing without allocation.

use crate::{Error, PATH_MAX};

pub fn is_delimiter(b: u8) -> bool {
    b == b'/' || b == b'\\'
}

/// Reject paths longer than [`PATH_MAX`] before any disk access.
pub fn check_len(path: &str) -> Result<(), Error> {
    if path.len() > PATH_MAX {
        return Err(Error::PathTooLong);
    }
    Ok(())
}

/// Yields the components of a `/`- or `\`-delimited path one at a time.
/// Runs of delimiters count as one; leading and trailing ones are ignored.
pub struct Components<'p> {
    rest: &'p [u8],
}

impl<'p> Components<'p> {
    pub fn new(path: &'p str) -> Self {
        Self { rest: path.as_bytes() }
    }

    fn skip_delimiters(&mut self) {
        let start = self.rest.iter().position(|&b| !is_delimiter(b)).unwrap_or(self.rest.len());
        self.rest = &self.rest[start..];
    }

    /// True when no component remains.
    pub fn is_done(&mut self) -> bool {
        self.skip_delimiters();
        self.rest.is_empty()
    }
}

impl<'p> Iterator for Components<'p> {
    type Item = &'p [u8];

    fn next(&mut self) -> Option<&'p [u8]> {
        self.skip_delimiters();
        if self.rest.is_empty() {
            return None;
        }
        let end = self.rest.iter().position(|&b| is_delimiter(b)).unwrap_or(self.rest.len());
        let (component, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(component)
    }
}
