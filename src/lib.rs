//! A `no_std`, no-alloc write buffer for word/row programmable on-chip flash.
//!
//! Flash can only be erased a page at a time and programmed in aligned words or rows.
//! This crate lets callers write arbitrary byte ranges anyway, by keeping one page in RAM
//! and committing it (erase, then reprogram) only when a write moves on to another page
//! or the caller flushes.
//!
//! # Features
//!
//! - **One page of RAM** - A single write-back buffer, no heap
//! - **Implicit dirty tracking** - A page is dirty iff its buffer differs from flash
//! - **Overlap-safe copies** - NVM-to-NVM moves in either direction, across pages
//! - **Row-first programming** - Whole rows where alignment allows, words elsewhere
//! - **Pluggable hardware** - Register access behind [`NvmController`](nvm::NvmController)
//!
//! # Architecture
//!
//! ```text
//! memcpy_buffered / memset_buffered / read_buffered
//!          │  loops over
//!          ▼
//! write_to_buffered_page ──── one window, bounded by the buffered page
//!          │  binds pages via
//!          ▼
//! ┌────────────────────┐  commit   ┌──────────────────────────┐
//! │  Page buffer       │──────────▶│  erase + rows/words      │
//! │  (one page, RAM)   │  if dirty │  (critical section,      │
//! │                    │◀──────────│   bus masters suspended) │
//! └────────────────────┘   load    └──────────────────────────┘
//! ```
//!
//! Only the hardware programming sequence runs inside a critical section. The driver
//! itself is not locked: share it between tasks only behind your own mutex.
//!
//! # Example
//!
//! ```rust,ignore
//! use embedded_nvm_buffer::prelude::*;
//!
//! let mut nvm = BufferedNvmBuilder::new()
//!     .page_size::<4096>()
//!     .row_size::<128>()
//!     .region(NvmRegion::new(0x9D00_0000, 512 * 1024))
//!     .controller(my_flash_controller)
//!     .default_bus()
//!     .build();
//!
//! // Any length, any alignment; only the buffer changes
//! nvm.memcpy_buffered(Dest::Nvm(0x9D07_F00A), Src::Ram(b"config v2"), 9)?;
//! nvm.memset_buffered(Dest::Nvm(0x9D07_F013), 0x00, 3)?;
//!
//! // Erase and reprogram the page
//! nvm.flush()?;
//! ```

#![deny(unsafe_code)]
#![no_std]

pub mod nvm;

pub mod prelude {
    pub use crate::nvm::prelude::*;
}
