//! # Virtual Address and Page Types
//!
//! Strongly typed wrappers for the raw addresses a user-space loader juggles
//! while resolving page faults.
//!
//! ## Overview
//!
//! A faulting address is only meaningful once it has been split into a
//! page-aligned base and an in-page offset. This crate provides zero-cost
//! wrappers that make that split explicit:
//!
//! | Concept | Generic | Description |
//! |----------|----------|-------------|
//! | [`VirtualAddress`] | – | A raw address in the loader's address space. |
//! | [`VirtualPage<S>`] | [`S: PageSize`](PageSize) | The page-aligned base of a page of size `S`. |
//! | [`PageOffset<S>`] | [`S: PageSize`](PageSize) | An offset within a page of size `S`. |
//!
//! Addresses are stored as `u64` regardless of the host pointer width, so
//! 32-bit ELF addresses widen losslessly and arithmetic on `vaddr + memsz`
//! cannot overflow for any 32-bit input.
//!
//! ## Page Sizes
//!
//! Only the base granularity is supported:
//!
//! - [`Size4K`]: 4 KiB pages
//!
//! The [`PageSize`] trait exposes [`SIZE`](PageSize::SIZE) and
//! [`SHIFT`](PageSize::SHIFT); [`page_count`] rounds a byte length up to whole
//! pages.
//!
//! ## Typical Usage
//!
//! ```rust
//! # use loader_addresses::*;
//! let fault = VirtualAddress::new(0x0001_0A2C);
//! let (page, off) = fault.split::<Size4K>();
//! assert_eq!(page.base().as_u64(), 0x0001_0000);
//! assert_eq!(off.as_u64(), 0xA2C);
//! assert_eq!(page.join(off), fault);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(clippy::inline_always)]

mod page_offset;
mod page_size;
mod virtual_address;
mod virtual_page;

pub use page_offset::PageOffset;
pub use page_size::{PageSize, Size4K, page_count};
pub use virtual_address::VirtualAddress;
pub use virtual_page::VirtualPage;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_join_4k() {
        let a = VirtualAddress::new(0x0804_9ABC);
        let (p, o) = a.split::<Size4K>();
        assert_eq!(p.base().as_u64() & 0xFFF, 0);
        assert_eq!(o.as_u64(), 0xABC);
        assert_eq!(p.join(o), a);
    }

    #[test]
    fn page_base_is_idempotent() {
        let page = VirtualAddress::new(0x0001_0000).page::<Size4K>();
        assert_eq!(page.base().page::<Size4K>(), page);
        assert_eq!(page.base().offset::<Size4K>().as_u64(), 0);
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count::<Size4K>(0), 0);
        assert_eq!(page_count::<Size4K>(1), 1);
        assert_eq!(page_count::<Size4K>(16), 1);
        assert_eq!(page_count::<Size4K>(4096), 1);
        assert_eq!(page_count::<Size4K>(4097), 2);
        assert_eq!(page_count::<Size4K>(5000), 2);
        assert_eq!(page_count::<Size4K>(8192), 2);
    }

    #[test]
    fn distance_between_addresses() {
        let start = VirtualAddress::new(0x0001_0000);
        let page = VirtualAddress::new(0x0001_2000).page::<Size4K>();
        assert_eq!(page.offset_from(start), Some(0x2000));
        assert_eq!(start.page::<Size4K>().offset_from(page.base()), None);
    }

    #[test]
    fn next_page_steps_by_size() {
        let page = VirtualAddress::new(0x0001_0FFF).page::<Size4K>();
        assert_eq!(page.next().map(VirtualPage::base), Some(VirtualAddress::new(0x0001_1000)));
        assert_eq!(VirtualAddress::new(u64::MAX).page::<Size4K>().next(), None);
    }
}
