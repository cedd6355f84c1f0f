//! Little-endian field extraction from on-disk buffers.
//!
//! Boot sectors and directory records put multi-byte fields at odd offsets,
//! so nothing here ever casts a buffer to a wider type. Each value is built
//! from individual bytes.

/// Read a `width`-byte (1, 2 or 4) little-endian value at `offset`.
///
/// Returns `None` if the field does not fit in `buf` or the width is not one
/// of the supported sizes.
pub fn read_le(buf: &[u8], offset: usize, width: usize) -> Option<u32> {
    if !matches!(width, 1 | 2 | 4) {
        return None;
    }
    let field = buf.get(offset..offset.checked_add(width)?)?;
    Some(
        field
            .iter()
            .rev()
            .fold(0u32, |acc, &b| (acc << 8) | b as u32),
    )
}

// Fixed-width shorthands over `read_le`. A field that runs past the end of
// `buf` reads as zero.

#[inline]
pub fn le8(buf: &[u8], offset: usize) -> u8 {
    read_le(buf, offset, 1).map_or(0, |v| v as u8)
}

#[inline]
pub fn le16(buf: &[u8], offset: usize) -> u16 {
    read_le(buf, offset, 2).map_or(0, |v| v as u16)
}

#[inline]
pub fn le32(buf: &[u8], offset: usize) -> u32 {
    read_le(buf, offset, 4).unwrap_or(0)
}
