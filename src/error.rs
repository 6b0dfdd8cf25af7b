use thiserror::Error;

/// Reasons an allocator cannot be built from a [`BuddyConfig`](crate::BuddyConfig).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
  #[error("arena size must be a positive power of two, got {size}")]
  NotPowerOfTwo { size: usize },

  #[error("minimum block size {min_block_size} must be a power of two no larger than the arena ({arena_size})")]
  InvalidMinBlock {
    min_block_size: usize,
    arena_size: usize,
  },

  #[error("arena at {base:#x} with size {size} exceeds the address space")]
  AddressOverflow { base: usize, size: usize },
}

/// Reasons a request for address space cannot be satisfied.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
  #[error("cannot allocate zero bytes")]
  ZeroSize,

  #[error("no free block can hold {size} bytes")]
  OutOfMemory { size: usize },
}

/// Reasons an address cannot be released.
///
/// A failed free never changes the allocator's state.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FreeError {
  #[error("address {addr:#x} is outside the arena")]
  OutOfBounds { addr: usize },

  #[error("double free of block at {addr:#x}")]
  DoubleFree { addr: usize },

  #[error("address {addr:#x} points inside the block at {block:#x}")]
  InteriorPointer { addr: usize, block: usize },

  #[error("address {addr:#x} was never allocated")]
  NotAllocated { addr: usize },
}
