use tracing::trace;

use crate::{align_down, error::FreeError};

/// Allocation state of a [`BlockNode`].
///
/// Only leaves carry an allocated/free state. A split node is purely
/// structural: its two children cover exactly its own range.
#[derive(Debug)]
pub enum BlockState {
  FreeLeaf,
  AllocatedLeaf,
  Split {
    first: Box<BlockNode>,
    second: Box<BlockNode>,
  },
}

/// A node of the buddy tree, covering `[base, base + size)`.
#[derive(Debug)]
pub struct BlockNode {
  base: usize,
  size: usize,
  state: BlockState,
}

/// Leaf block as reported by [`BuddyAllocator::blocks`](crate::BuddyAllocator::blocks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  pub base: usize,
  pub size: usize,
  pub allocated: bool,
}

impl BlockInfo {
  /// One past the last address of the block.
  pub fn end(&self) -> usize {
    self.base + self.size
  }
}

impl BlockNode {
  /// Creates a free leaf.
  pub fn new(
    base: usize,
    size: usize,
  ) -> Self {
    Self {
      base,
      size,
      state: BlockState::FreeLeaf,
    }
  }

  pub fn base(&self) -> usize {
    self.base
  }

  pub fn size(&self) -> usize {
    self.size
  }

  pub fn is_free_leaf(&self) -> bool {
    matches!(self.state, BlockState::FreeLeaf)
  }

  /// Finds room for `request` bytes in this subtree.
  ///
  /// Returns the base address and size of the granted block. A free leaf is
  /// taken whole when its half could not hold the request or when it is
  /// already `min_block` bytes; otherwise it is split and the request
  /// descends into the lower half. Split nodes try their lower child first.
  pub fn alloc(
    &mut self,
    request: usize,
    min_block: usize,
  ) -> Option<(usize, usize)> {
    match &mut self.state {
      BlockState::AllocatedLeaf => None,

      BlockState::Split { first, second } => {
        // Children are half our size, neither can fit it.
        if request >= self.size {
          return None;
        }

        first
          .alloc(request, min_block)
          .or_else(|| second.alloc(request, min_block))
      }

      BlockState::FreeLeaf => {
        if request > self.size {
          return None;
        }

        let half = self.size / 2;

        if request > half || self.size <= min_block {
          self.state = BlockState::AllocatedLeaf;
          return Some((self.base, self.size));
        }

        trace!(base = self.base, size = self.size, "splitting block");

        let mut first = Box::new(BlockNode::new(self.base, half));
        let second = Box::new(BlockNode::new(self.base + half, half));

        let granted = first.alloc(request, min_block);
        self.state = BlockState::Split { first, second };

        granted
      }
    }
  }

  /// Releases the allocated leaf whose base is `addr`.
  ///
  /// `addr` must lie within this node's range. On success returns the size of
  /// the released block; buddies left free on the way back up are merged into
  /// their parent. On failure nothing is modified.
  pub fn free(
    &mut self,
    addr: usize,
  ) -> Result<usize, FreeError> {
    match &mut self.state {
      BlockState::Split { first, second } => {
        let freed = if addr >= second.base {
          second.free(addr)?
        } else {
          first.free(addr)?
        };

        if first.is_free_leaf() && second.is_free_leaf() {
          trace!(base = self.base, size = self.size, "coalescing buddies");
          self.state = BlockState::FreeLeaf;
        }

        Ok(freed)
      }

      BlockState::AllocatedLeaf if addr == self.base => {
        self.state = BlockState::FreeLeaf;
        Ok(self.size)
      }

      BlockState::AllocatedLeaf => Err(FreeError::InteriorPointer {
        addr,
        block: self.base,
      }),

      BlockState::FreeLeaf if addr == self.base => Err(FreeError::DoubleFree { addr }),

      BlockState::FreeLeaf => Err(FreeError::NotAllocated { addr }),
    }
  }

  /// Returns the leaf containing `addr`, if `addr` lies within this node.
  pub fn find(
    &self,
    addr: usize,
  ) -> Option<&BlockNode> {
    if addr < self.base || addr - self.base >= self.size {
      return None;
    }

    let mut node = self;

    while let BlockState::Split { first, second } = &node.state {
      node = if addr >= second.base { &**second } else { &**first };
    }

    debug_assert_eq!(align_down!(addr - self.base, node.size) + self.base, node.base);

    Some(node)
  }

  /// Appends every leaf of this subtree to `out`, lowest address first.
  pub fn leaves(
    &self,
    out: &mut Vec<BlockInfo>,
  ) {
    match &self.state {
      BlockState::Split { first, second } => {
        first.leaves(out);
        second.leaves(out);
      }
      BlockState::FreeLeaf | BlockState::AllocatedLeaf => out.push(BlockInfo {
        base: self.base,
        size: self.size,
        allocated: matches!(self.state, BlockState::AllocatedLeaf),
      }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn leaves(node: &BlockNode) -> Vec<BlockInfo> {
    let mut out = Vec::new();
    node.leaves(&mut out);
    out
  }

  #[test]
  fn test_whole_block_when_half_is_too_small() {
    let mut node = BlockNode::new(0, 64);

    assert_eq!(node.alloc(33, 1), Some((0, 64)));
    assert!(matches!(&node.state, BlockState::AllocatedLeaf));
    assert_eq!(node.alloc(1, 1), None);
  }

  #[test]
  fn test_split_when_half_fits() {
    let mut node = BlockNode::new(0, 64);

    assert_eq!(node.alloc(32, 1), Some((0, 32)));

    match &node.state {
      BlockState::Split { first, second } => {
        assert!(matches!(&first.state, BlockState::AllocatedLeaf));
        assert!(second.is_free_leaf());
        assert_eq!((first.base(), first.size()), (0, 32));
        assert_eq!((second.base(), second.size()), (32, 32));
      }
      other => panic!("expected split node, got {other:?}"),
    }
  }

  #[test]
  fn test_request_larger_than_block() {
    let mut node = BlockNode::new(0, 64);

    assert_eq!(node.alloc(65, 1), None);
    assert!(node.is_free_leaf());
  }

  #[test]
  fn test_min_block_stops_splitting() {
    let mut node = BlockNode::new(0, 64);

    assert_eq!(node.alloc(1, 16), Some((0, 16)));
    assert_eq!(node.alloc(1, 16), Some((16, 16)));

    let sizes: Vec<usize> = leaves(&node).iter().map(|leaf| leaf.size).collect();
    assert_eq!(sizes, vec![16, 16, 32]);
  }

  #[test]
  fn test_lower_child_first() {
    let mut node = BlockNode::new(256, 128);

    assert_eq!(node.alloc(16, 1), Some((256, 16)));
    assert_eq!(node.alloc(16, 1), Some((272, 16)));
    assert_eq!(node.alloc(64, 1), Some((320, 64)));
    assert_eq!(node.alloc(32, 1), Some((288, 32)));
    assert_eq!(node.alloc(1, 1), None);
  }

  #[test]
  fn test_free_cascades_coalesce() {
    let mut node = BlockNode::new(0, 1024);

    assert_eq!(node.alloc(40, 1), Some((0, 64)));
    assert_eq!(leaves(&node).len(), 5);

    assert_eq!(node.free(0), Ok(64));
    assert!(node.is_free_leaf());
    assert_eq!(node.size(), 1024);
  }

  #[test]
  fn test_free_keeps_split_while_buddy_allocated() {
    let mut node = BlockNode::new(0, 64);

    node.alloc(32, 1);
    node.alloc(32, 1);

    assert_eq!(node.free(0), Ok(32));
    assert!(matches!(&node.state, BlockState::Split { .. }));

    assert_eq!(node.free(32), Ok(32));
    assert!(node.is_free_leaf());
  }

  #[test]
  fn test_free_errors_leave_tree_untouched() {
    let mut node = BlockNode::new(0, 128);

    node.alloc(32, 1);
    let before = leaves(&node);

    assert_eq!(node.free(8), Err(FreeError::InteriorPointer { addr: 8, block: 0 }));
    assert_eq!(node.free(32), Err(FreeError::DoubleFree { addr: 32 }));
    assert_eq!(node.free(100), Err(FreeError::NotAllocated { addr: 100 }));
    assert_eq!(leaves(&node), before);

    assert_eq!(node.free(0), Ok(32));
    assert_eq!(node.free(0), Err(FreeError::DoubleFree { addr: 0 }));
  }

  #[test]
  fn test_find() {
    let mut node = BlockNode::new(0, 128);

    node.alloc(16, 1);

    let leaf = node.find(9).map(|leaf| (leaf.base(), leaf.size()));
    assert_eq!(leaf, Some((0, 16)));

    let leaf = node.find(70).map(|leaf| (leaf.base(), leaf.size()));
    assert_eq!(leaf, Some((64, 64)));

    assert!(node.find(128).is_none());
  }

  #[test]
  fn test_leaves_tile_range() {
    let mut node = BlockNode::new(1024, 256);

    node.alloc(10, 1);
    node.alloc(100, 1);
    node.alloc(3, 1);

    let blocks = leaves(&node);

    assert_eq!(blocks.first().map(|leaf| leaf.base), Some(1024));
    assert_eq!(blocks.last().map(BlockInfo::end), Some(1280));

    for pair in blocks.windows(2) {
      assert_eq!(pair[0].end(), pair[1].base);
    }
  }
}
