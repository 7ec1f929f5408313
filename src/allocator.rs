use std::{io, process};

use log::{debug, error, warn};

use crate::{
  chunk::Handle,
  diagnostics::HeapStats,
  error::{ContractViolation, Corruption, DumpError, Result},
  heap::Heap,
};

/// Owning handle over at most one [`Heap`], with the lifecycle of a process heap.
///
/// Unlike [`Heap::try_deallocate`], [`Allocator::deallocate`] treats a bad
/// handle as fatal: it releases the heap and exits the process with status 1.
#[derive(Default)]
pub struct Allocator {
  heap: Option<Heap>,
}

impl Allocator {
  pub const fn new() -> Self {
    Self { heap: None }
  }

  /// Sets up a fresh heap, dropping any previous one first.
  ///
  /// # Errors
  ///
  /// [`HeapError::OutOfMemory`](crate::HeapError::OutOfMemory) if the arena
  /// cannot be reserved. The allocator then holds no heap.
  pub fn initialize(
    &mut self,
    size_hint: usize,
  ) -> Result<()> {
    self.shutdown();
    self.heap = Some(Heap::new(size_hint)?);
    Ok(())
  }

  pub fn is_initialized(&self) -> bool {
    self.heap.is_some()
  }

  pub fn heap(&self) -> Option<&Heap> {
    self.heap.as_ref()
  }

  /// Returns `None` for a zero size, when no chunk fits, or before [`initialize`](Self::initialize).
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Option<Handle> {
    self.heap.as_mut()?.allocate(size)
  }

  /// Frees `handle`, terminating the process if it is null or not allocated.
  pub fn deallocate(
    &mut self,
    handle: Option<Handle>,
  ) {
    let outcome = match self.heap.as_mut() {
      Some(heap) => heap.try_deallocate(handle),
      None => Err(ContractViolation::Uninitialized),
    };

    if let Err(violation) = outcome {
      self.bad_free(violation);
    }
  }

  /// Releases the arena and the free index. Safe to call more than once.
  pub fn shutdown(&mut self) {
    if let Some(heap) = self.heap.take() {
      debug!("releasing heap of {} bytes", heap.size());
    }
  }

  pub fn offset_of(
    &self,
    handle: Option<Handle>,
  ) -> Option<usize> {
    self.heap.as_ref()?.offset_of(handle)
  }

  pub fn payload(
    &self,
    handle: Handle,
  ) -> Option<&[u8]> {
    self.heap.as_ref()?.payload(handle)
  }

  pub fn payload_mut(
    &mut self,
    handle: Handle,
  ) -> Option<&mut [u8]> {
    self.heap.as_mut()?.payload_mut(handle)
  }

  pub fn stats(&self) -> Option<core::result::Result<HeapStats, Corruption>> {
    self.heap.as_ref().map(Heap::stats)
  }

  /// Prints the chunk layout to stdout. A corrupted chunk status is fatal.
  pub fn dump_layout(&mut self) {
    let Some(heap) = self.heap.as_ref() else {
      return;
    };

    match heap.write_layout(&mut io::stdout().lock()) {
      Ok(()) => {}
      Err(DumpError::Io(err)) => warn!("heap layout not written: {err}"),
      Err(DumpError::Corrupted(corruption)) => {
        error!("corrupted heap: {corruption}");
        eprintln!("corrupted heap: {corruption}");
        self.shutdown();
        process::exit(1);
      }
    }
  }

  fn bad_free(
    &mut self,
    violation: ContractViolation,
  ) -> ! {
    error!("{violation}");
    eprintln!("Attempt to free unallocated chunk");

    self.shutdown();
    process::exit(1);
  }
}
