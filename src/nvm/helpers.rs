//! Address arithmetic for pages, rows and words.
//!
//! These helpers are useful when implementing an [`NvmController`](crate::nvm::NvmController)
//! or laying out data that has to respect the flash geometry.

/// Size in bytes of one programmable word.
pub const WORD_SIZE: usize = 4;

/// Rounds `addr` down to the start of the page that contains it.
///
/// # Example
/// ```
/// use embedded_nvm_buffer::nvm::helpers::page_start;
///
/// assert_eq!(page_start::<4096>(0x9D00_1234), 0x9D00_1000);
/// assert_eq!(page_start::<16>(0x20), 0x20);
/// ```
#[inline]
pub const fn page_start<const PS: usize>(addr: u32) -> u32 {
    addr - addr % PS as u32
}

/// Byte offset of `addr` within its page.
#[inline]
pub const fn page_offset<const PS: usize>(addr: u32) -> usize {
    (addr % PS as u32) as usize
}

/// Returns true if `addr` is a multiple of `align`.
#[inline]
pub const fn is_aligned(addr: u32, align: usize) -> bool {
    addr % align as u32 == 0
}

/// Exclusive end of the range `addr..addr + len`, or `None` if it does not fit in `u32`.
///
/// # Example
/// ```
/// use embedded_nvm_buffer::nvm::helpers::range_end;
///
/// assert_eq!(range_end(0x100, 0x20), Some(0x120));
/// assert_eq!(range_end(u32::MAX, 1), None);
/// ```
#[inline]
pub fn range_end(addr: u32, len: usize) -> Option<u32> {
    u32::try_from(len).ok().and_then(|len| addr.checked_add(len))
}

#[test]
fn page_arithmetic_edge_cases() {
    // First and last byte of a page
    assert_eq!(page_start::<16>(0x10), 0x10);
    assert_eq!(page_start::<16>(0x1F), 0x10);
    assert_eq!(page_offset::<16>(0x1F), 15);

    // Top of the address space
    assert_eq!(page_start::<4096>(u32::MAX), 0xFFFF_F000);
    assert_eq!(page_offset::<4096>(u32::MAX), 4095);

    // Alignment
    assert!(is_aligned(0x80, 128));
    assert!(!is_aligned(0x84, 128));
    assert!(is_aligned(0x84, WORD_SIZE));
    assert!(!is_aligned(0x86, WORD_SIZE));
}
