//! Address-cycle packing for a page-based x8 device.
//!
//! Only the page-based packer is implemented. The reference tool this was
//! distilled from also carried a legacy bit-mask packer documented as
//! writing bits the part ignores; that scheme is intentionally not ported.
//! Whether other part densities need a different cycle count/packing table
//! is an open question left for a future geometry-aware packer.

/// Five address cycles: two column bytes followed by three row (page) bytes.
pub type FullAddress = [u8; 5];
/// Three row-only address cycles, used for block erase.
pub type RowAddress = [u8; 3];

/// Pack a full 5-cycle address: `[CA0..7, CA8..15, PA0..7, PA8..15, PA16..23]`.
pub fn pack_full_address(page: u32, column: u16) -> FullAddress {
    [
        (column & 0xFF) as u8,
        ((column >> 8) & 0xFF) as u8,
        (page & 0xFF) as u8,
        ((page >> 8) & 0xFF) as u8,
        ((page >> 16) & 0xFF) as u8,
    ]
}

/// Pack the row-only 3-cycle address used by block erase.
pub fn pack_row_address(page: u32) -> RowAddress {
    let full = pack_full_address(page, 0);
    [full[2], full[3], full[4]]
}
