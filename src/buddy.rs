use tracing::debug;

use crate::{
  align::block_size_for,
  block::{BlockInfo, BlockNode},
  error::{AllocError, FreeError, InitError},
};

/// Construction parameters of a [`BuddyAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuddyConfig {
  base: usize,
  arena_size: usize,
  min_block_size: usize,
}

impl BuddyConfig {
  /// An arena of `arena_size` addresses starting at 0, splittable down to
  /// single-address blocks.
  pub fn new(arena_size: usize) -> Self {
    Self {
      base: 0,
      arena_size,
      min_block_size: 1,
    }
  }

  /// Sets the first address handed out by the arena.
  pub fn with_base(
    mut self,
    base: usize,
  ) -> Self {
    self.base = base;
    self
  }

  /// Sets the smallest block the allocator will produce by splitting.
  pub fn with_min_block_size(
    mut self,
    min_block_size: usize,
  ) -> Self {
    self.min_block_size = min_block_size;
    self
  }

  pub fn build(self) -> Result<BuddyAllocator, InitError> {
    BuddyAllocator::with_config(self)
  }
}

/// Buddy system allocator over an abstract range of integer addresses.
///
/// The allocator hands out block base addresses; it owns no byte storage.
#[derive(Debug)]
pub struct BuddyAllocator {
  config: BuddyConfig,
  root: BlockNode,
  total_free: usize,
  allocations: usize,
}

pub type Allocator = BuddyAllocator;

impl BuddyAllocator {
  /// Creates an allocator over `[0, size)`.
  ///
  /// Fails unless `size` is a positive power of two.
  pub fn new(size: usize) -> Result<Self, InitError> {
    Self::with_config(BuddyConfig::new(size))
  }

  pub fn with_config(config: BuddyConfig) -> Result<Self, InitError> {
    let BuddyConfig {
      base,
      arena_size,
      min_block_size,
    } = config;

    if !arena_size.is_power_of_two() {
      return Err(InitError::NotPowerOfTwo { size: arena_size });
    }

    if !min_block_size.is_power_of_two() || min_block_size > arena_size {
      return Err(InitError::InvalidMinBlock {
        min_block_size,
        arena_size,
      });
    }

    if base.checked_add(arena_size).is_none() {
      return Err(InitError::AddressOverflow {
        base,
        size: arena_size,
      });
    }

    Ok(Self {
      config,
      root: BlockNode::new(base, arena_size),
      total_free: arena_size,
      allocations: 0,
    })
  }

  /// Allocates a block of at least `size` addresses and returns its base,
  /// or `None` when no free block is large enough or `size` is zero.
  pub fn malloc(
    &mut self,
    size: usize,
  ) -> Option<usize> {
    self.try_malloc(size).ok()
  }

  /// Releases the block whose base is `addr`.
  ///
  /// Returns `false`, leaving the allocator unchanged, for addresses outside
  /// the arena, interior pointers, double frees and addresses that were
  /// never allocated.
  pub fn free(
    &mut self,
    addr: usize,
  ) -> bool {
    self.try_free(addr).is_ok()
  }

  pub fn try_malloc(
    &mut self,
    size: usize,
  ) -> Result<usize, AllocError> {
    if size == 0 {
      debug!("rejected zero-sized allocation");
      return Err(AllocError::ZeroSize);
    }

    let out_of_memory = AllocError::OutOfMemory { size };

    match block_size_for(size, self.config.min_block_size) {
      Some(needed) if needed <= self.total_free => {}
      _ => {
        debug!(size, total_free = self.total_free, "allocation exceeds free space");
        return Err(out_of_memory);
      }
    }

    let Some((addr, granted)) = self.root.alloc(size, self.config.min_block_size) else {
      debug!(size, total_free = self.total_free, "no free block large enough");
      return Err(out_of_memory);
    };

    self.total_free -= granted;
    self.allocations += 1;

    debug!(addr, size, granted, "allocated block");

    Ok(addr)
  }

  /// Releases the block whose base is `addr`, returning its size.
  pub fn try_free(
    &mut self,
    addr: usize,
  ) -> Result<usize, FreeError> {
    if !self.contains(addr) {
      debug!(addr, "free outside the arena");
      return Err(FreeError::OutOfBounds { addr });
    }

    match self.root.free(addr) {
      Ok(freed) => {
        self.total_free += freed;
        self.allocations -= 1;

        debug!(addr, freed, "freed block");

        Ok(freed)
      }
      Err(err) => {
        debug!(addr, %err, "rejected free");
        Err(err)
      }
    }
  }

  /// Size of the live allocation based at `addr`.
  pub fn usable_size(
    &self,
    addr: usize,
  ) -> Option<usize> {
    self
      .leaf_at(addr)
      .filter(|leaf| leaf.allocated && leaf.base == addr)
      .map(|leaf| leaf.size)
  }

  fn leaf_at(
    &self,
    addr: usize,
  ) -> Option<BlockInfo> {
    let leaf = self.root.find(addr)?;

    Some(BlockInfo {
      base: leaf.base(),
      size: leaf.size(),
      allocated: !leaf.is_free_leaf(),
    })
  }

  /// Every leaf block, lowest address first.
  pub fn blocks(&self) -> Vec<BlockInfo> {
    let mut out = Vec::new();
    self.root.leaves(&mut out);
    out
  }

  /// Returns the allocator to a single free block.
  ///
  /// Every address handed out so far becomes invalid.
  pub fn reset(&mut self) {
    self.root = BlockNode::new(self.config.base, self.config.arena_size);
    self.total_free = self.config.arena_size;
    self.allocations = 0;
  }

  pub fn contains(
    &self,
    addr: usize,
  ) -> bool {
    addr >= self.config.base && addr - self.config.base < self.config.arena_size
  }

  pub fn base(&self) -> usize {
    self.config.base
  }

  pub fn arena_size(&self) -> usize {
    self.config.arena_size
  }

  pub fn min_block_size(&self) -> usize {
    self.config.min_block_size
  }

  /// Free addresses across all blocks. Fragmentation may keep them from
  /// being usable as a single block.
  pub fn total_free(&self) -> usize {
    self.total_free
  }

  /// Addresses held by live allocations, internal fragmentation included.
  pub fn total_allocated(&self) -> usize {
    self.config.arena_size - self.total_free
  }

  pub fn allocation_count(&self) -> usize {
    self.allocations
  }

  /// True when nothing is allocated and the tree has merged back into one block.
  pub fn is_empty(&self) -> bool {
    self.root.is_free_leaf()
  }
}
