use buddy_arena::{BuddyAllocator, BuddyConfig};
use tracing::Level;

/// Prints every leaf of the tree, lowest address first.
fn print_blocks(
  label: &str,
  allocator: &BuddyAllocator,
) {
  println!(
    "[{}] free = {}, allocated = {}",
    label,
    allocator.total_free(),
    allocator.total_allocated()
  );

  for block in allocator.blocks() {
    println!(
      "    [{:>4}, {:>4})  {:>4}  {}",
      block.base,
      block.end(),
      block.size,
      if block.allocated { "allocated" } else { "free" }
    );
  }
}

fn main() {
  tracing_subscriber::fmt()
    .with_max_level(Level::TRACE)
    .init();

  let mut allocator = match BuddyAllocator::new(1024) {
    Ok(allocator) => allocator,
    Err(err) => {
      eprintln!("cannot build allocator: {err}");
      return;
    }
  };

  // --------------------------------------------------------------------
  // 1) malloc(40): 1024 is halved down to 64, where 40 no longer fits
  //    the half, so the whole 64 block is taken at address 0.
  // --------------------------------------------------------------------
  let addr = allocator.malloc(40);
  println!("\n[1] malloc(40) = {:?}", addr);
  print_blocks("1", &allocator);

  // --------------------------------------------------------------------
  // 2) free it: every buddy on the way up is free, so the tree merges
  //    back into a single 1024 block.
  // --------------------------------------------------------------------
  if let Some(addr) = addr {
    println!("\n[2] free({}) = {}", addr, allocator.free(addr));
    println!("[2] free({}) again = {}", addr, allocator.free(addr));
  }
  print_blocks("2", &allocator);

  // --------------------------------------------------------------------
  // 3) Rejected requests never abort.
  // --------------------------------------------------------------------
  println!("\n[3] malloc(2000) = {:?}", allocator.try_malloc(2000));
  println!("[3] malloc(0) = {:?}", allocator.try_malloc(0));
  println!("[3] free(4096) = {:?}", allocator.try_free(4096));
  println!("[3] new(1000) = {:?}", BuddyAllocator::new(1000).err());

  // --------------------------------------------------------------------
  // 4) A coarser arena: nothing smaller than 32 is ever carved out.
  // --------------------------------------------------------------------
  let coarse = BuddyConfig::new(256)
    .with_base(0x1000)
    .with_min_block_size(32)
    .build();

  if let Ok(mut coarse) = coarse {
    let small = coarse.malloc(3);
    println!("\n[4] malloc(3) = {:#x?}, usable = {:?}", small, small.and_then(|a| coarse.usable_size(a)));
    print_blocks("4", &coarse);
  }
}
