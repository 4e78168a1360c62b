//! # Trap-safe publication primitives
//!
//! Signal handlers cannot take locks or allocate, yet they need to reach state
//! built by ordinary code. The primitives here publish such state through a
//! single atomic so the handler side is one `Acquire` load.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

extern crate alloc;

mod install_slot;
mod sync_once_cell;

pub use install_slot::InstallSlot;
pub use sync_once_cell::SyncOnceCell;
