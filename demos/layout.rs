use rheap::{Allocator, Handle};

/// Prints a step banner followed by the current chunk layout.
fn show(
  allocator: &mut Allocator,
  label: &str,
) {
  println!("\n[{label}]");
  allocator.dump_layout();
}

/// Prints where a handle landed in the arena.
fn print_alloc(
  allocator: &Allocator,
  size: usize,
  handle: Option<Handle>,
) {
  match allocator.offset_of(handle) {
    Some(offset) => println!("Allocated {size} bytes, payload offset = +{offset}"),
    None => println!("Allocation of {size} bytes failed"),
  }
}

fn main() {
  let mut allocator = Allocator::new();

  // A hint below the floor still yields a 4096 byte arena.
  if let Err(err) = allocator.initialize(1000) {
    eprintln!("{err}");
    std::process::exit(1);
  }
  show(&mut allocator, "start: one free chunk");

  // --------------------------------------------------------------------
  // 1) A few allocations, each split off the front of the free chunk.
  // --------------------------------------------------------------------
  let first = allocator.allocate(4);
  print_alloc(&allocator, 4, first);
  let second = allocator.allocate(12);
  print_alloc(&allocator, 12, second);
  let third = allocator.allocate(100);
  print_alloc(&allocator, 100, third);
  let fourth = allocator.allocate(32);
  print_alloc(&allocator, 32, fourth);
  show(&mut allocator, "1: four allocations");

  // Write into a payload to show it is usable.
  if let Some(bytes) = third.and_then(|handle| allocator.payload_mut(handle)) {
    bytes.fill(0xAB);
    println!("Filled third payload ({} bytes) with 0xAB", bytes.len());
  }

  // --------------------------------------------------------------------
  // 2) Free two chunks that are not neighbours: they stay separate.
  // --------------------------------------------------------------------
  allocator.deallocate(first);
  allocator.deallocate(third);
  show(&mut allocator, "2: freed first and third");

  // --------------------------------------------------------------------
  // 3) Best fit: 4 bytes need a 12 byte chunk, exactly the hole at +0.
  // --------------------------------------------------------------------
  let reused = allocator.allocate(4);
  print_alloc(&allocator, 4, reused);
  println!(
    "reused == first? {}",
    if reused == first { "Yes, best fit took the smallest hole" } else { "No" }
  );
  show(&mut allocator, "3: best fit");

  // --------------------------------------------------------------------
  // 4) Freeing the second chunk merges it with the hole after it.
  // --------------------------------------------------------------------
  allocator.deallocate(second);
  show(&mut allocator, "4: coalesced");

  // --------------------------------------------------------------------
  // 5) A request larger than any free chunk fails without harm.
  // --------------------------------------------------------------------
  let too_big = allocator.allocate(8192);
  print_alloc(&allocator, 8192, too_big);

  if let Some(Ok(stats)) = allocator.stats() {
    println!("\n{stats:#?}");
  }

  allocator.deallocate(reused);
  allocator.deallocate(fourth);
  show(&mut allocator, "end: everything freed");

  allocator.shutdown();
}
