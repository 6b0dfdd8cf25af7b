//! # buddy-arena - A Buddy System Address Allocator
//!
//! This crate provides a **buddy allocator** that hands out integer addresses
//! from a fixed, power-of-two sized arena. It tracks which ranges are in use;
//! it does not own or touch the memory behind them.
//!
//! ## Overview
//!
//! The arena is a binary tree of blocks. A free block that is too big for a
//! request is split into two equal halves (buddies), and the request goes to
//! the lower half. When both buddies are free again they merge back into
//! their parent.
//!
//! ```text
//!   Buddy tree after malloc(40) on a 1024 arena:
//!
//!   [0 ──────────────────────────────────────── 1024)   split
//!   [0 ──────────────── 512)[512 ────────────── 1024)   split | free
//!   [0 ───── 256)[256 ─ 512)                            split | free
//!   [0 ─ 128)[128 ─ 256)                                split | free
//!   [0 64)[64 128)                                      A     | free
//!    ▲
//!    └── address 0 returned to the caller
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   buddy_arena
//!   ├── align      - Power-of-two rounding (align_down!, align_up!, block_size_for)
//!   ├── block      - BlockNode tree: recursive split, free and coalesce
//!   ├── buddy      - BuddyAllocator facade and BuddyConfig
//!   └── error      - InitError, AllocError, FreeError
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use buddy_arena::BuddyAllocator;
//!
//! let mut allocator = BuddyAllocator::new(1024).unwrap();
//!
//! let addr = allocator.malloc(40).unwrap();
//! assert_eq!(addr, 0);
//! assert_eq!(allocator.usable_size(addr), Some(64));
//!
//! assert!(allocator.free(addr));
//! assert!(!allocator.free(addr));
//! assert!(allocator.is_empty());
//! ```
//!
//! ## How It Works
//!
//! A free leaf of size `N` serving a request `r`:
//!
//! ```text
//!   r > N       ──▶ fail, try the sibling
//!   r > N / 2   ──▶ take the whole block (internal fragmentation)
//!   otherwise   ──▶ split into [base, base+N/2) and [base+N/2, base+N),
//!                   recurse into the lower half
//! ```
//!
//! Freeing walks down by comparing the address with the upper buddy's base,
//! releases the matching leaf, and merges free buddies on the way back up:
//!
//! ```text
//!   ┌──────┬──────┐        ┌─────────────┐
//!   │  F   │  A   │ free ▶ │      F      │
//!   └──────┴──────┘        └─────────────┘
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: wrap it in a lock to share it
//! - **Power-of-two arenas**: other sizes are rejected at construction
//! - **Exact frees**: only the base address of a live block can be freed

pub mod align;
mod block;
mod buddy;
mod error;

pub use block::BlockInfo;
pub use buddy::{Allocator, BuddyAllocator, BuddyConfig};
pub use error::{AllocError, FreeError, InitError};
