//! Integration tests for the rheap allocator

use rheap::{Allocator, ContractViolation, Heap, Status};

/// Small deterministic generator so runs are reproducible.
struct XorShift(u64);

impl XorShift {
  fn next_u64(&mut self) -> u64 {
    self.0 ^= self.0 << 13;
    self.0 ^= self.0 >> 7;
    self.0 ^= self.0 << 17;
    self.0
  }
}

fn snapshot(heap: &Heap) -> (Vec<(usize, Status, usize)>, Vec<usize>) {
  let chunks = heap
    .chunks()
    .map(|chunk| chunk.unwrap())
    .map(|chunk| (chunk.offset, chunk.status, chunk.size))
    .collect();
  (chunks, heap.free_chunks().to_vec())
}

#[test]
fn test_minimum_floor() {
  assert_eq!(Heap::new(0).unwrap().size(), 4096);
  assert_eq!(Heap::new(4096).unwrap().size(), 4096);
  assert_eq!(Heap::new(5000).unwrap().size(), 5000);
  assert_eq!(Heap::new(5001).unwrap().size(), 5004);
}

#[test]
fn test_invariants_under_random_workload() {
  let mut heap = Heap::new(16 * 1024).unwrap();
  let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
  let mut live = Vec::new();

  for _ in 0..2000 {
    if live.is_empty() || rng.next_u64() % 3 != 0 {
      let size = (rng.next_u64() % 300) as usize + 1;
      if let Some(handle) = heap.allocate(size) {
        let payload = heap.payload(handle).unwrap();
        assert!(payload.len() >= size);
        live.push(handle);
      }
    } else {
      let victim = (rng.next_u64() % live.len() as u64) as usize;
      let handle = live.swap_remove(victim);
      heap.try_deallocate(Some(handle)).unwrap();
    }

    heap.validate().unwrap();
  }

  for handle in live.drain(..) {
    heap.try_deallocate(Some(handle)).unwrap();
    heap.validate().unwrap();
  }

  assert_eq!(heap.free_chunks(), &[0]);
  assert_eq!(heap.stats().unwrap().largest_free, 16 * 1024);
}

#[test]
fn test_round_trip_restores_state() {
  let mut heap = Heap::new(0).unwrap();
  let keep = heap.allocate(50).unwrap();
  let hole = heap.allocate(500).unwrap();
  heap.allocate(50).unwrap();
  heap.try_deallocate(Some(hole)).unwrap();
  heap.try_deallocate(Some(keep)).unwrap();

  let before = snapshot(&heap);
  let largest = heap.stats().unwrap().largest_free;

  for size in [1, 7, 64, 499, largest - 8] {
    let handle = heap.allocate(size).unwrap();
    heap.try_deallocate(Some(handle)).unwrap();
    assert_eq!(snapshot(&heap), before, "round trip of {size} bytes");
  }
}

#[test]
fn test_exhaustion_keeps_tiling() {
  let mut heap = Heap::new(0).unwrap();
  let mut handles = Vec::new();

  while let Some(handle) = heap.allocate(64) {
    handles.push(handle);
  }

  for _ in 0..10 {
    assert_eq!(heap.allocate(64), None);
  }
  assert_eq!(heap.allocate(5000), None);
  heap.validate().unwrap();

  let stats = heap.stats().unwrap();
  assert_eq!(stats.allocated_chunks, handles.len());
  assert_eq!(stats.free_bytes + stats.allocated_bytes, 4096);
}

#[test]
fn test_fragmented_frees_outgrow_reserved_index() {
  // 12 byte chunks freed whole can outnumber arena / MIN_CHUNK free entries.
  let mut heap = Heap::new(0).unwrap();
  let mut handles = Vec::new();
  while let Some(handle) = heap.allocate(4) {
    handles.push(handle);
  }

  for handle in handles.iter().step_by(2) {
    heap.try_deallocate(Some(*handle)).unwrap();
  }

  heap.validate().unwrap();
  assert!(heap.free_chunks().len() > 4096 / rheap::MIN_CHUNK);
}

#[test]
fn test_double_free_is_a_violation() {
  let mut heap = Heap::new(0).unwrap();
  let handle = heap.allocate(10);

  heap.try_deallocate(handle).unwrap();
  let before = snapshot(&heap);

  assert_eq!(
    heap.try_deallocate(handle),
    Err(ContractViolation::NotAllocated { offset: 8 })
  );
  assert_eq!(snapshot(&heap), before);
}

#[test]
fn test_allocator_dump_layout() {
  let mut allocator = Allocator::new();
  allocator.initialize(0).unwrap();
  allocator.allocate(100).unwrap();

  // Goes to stdout; must not terminate on a healthy heap.
  allocator.dump_layout();
  assert!(allocator.is_initialized());
}
