use log::{debug, error, trace};

use crate::{
  align::checked_align,
  arena::Arena,
  chunk::{Chunk, Chunks, DESCRIPTOR_LEN, Handle, MAX_HEAP, MIN_CHUNK, MIN_HEAP, Status},
  error::{ContractViolation, HeapError, Result},
  free_index::FreeIndex,
};

/// Arena size actually reserved for a size hint, or `None` if it cannot be
/// described by a chunk descriptor.
pub(crate) fn regulated_size(size_hint: usize) -> Option<usize> {
  checked_align(size_hint)
    .map(|size| size.max(MIN_HEAP))
    .filter(|&size| size <= MAX_HEAP)
}

/// A best-fit heap over one fixed arena.
///
/// Chunks tile the arena back to back: the chunk at offset `a` with size `s`
/// is followed by the chunk at `a + s`, and the last one ends exactly at the
/// arena end. Every free chunk is listed in the free index and no two free
/// chunks are ever left next to each other once a call returns.
pub struct Heap {
  arena: Arena,
  free: FreeIndex,
}

impl Heap {
  /// Reserves an arena for `size_hint` bytes and lays one free chunk over it.
  ///
  /// The size is rounded up to a multiple of 4 and floored at [`MIN_HEAP`].
  ///
  /// # Errors
  ///
  /// [`HeapError::OutOfMemory`] if the arena or its free index cannot be
  /// reserved. Nothing stays reserved on failure.
  pub fn new(size_hint: usize) -> Result<Self> {
    let out_of_memory = HeapError::OutOfMemory {
      requested: size_hint,
    };

    let size = regulated_size(size_hint).ok_or(out_of_memory)?;
    let mut arena = Arena::zeroed(size).ok_or(out_of_memory)?;
    arena.set_descriptor(0, Status::Free, size);

    // `arena` is released on this early return.
    let mut free = FreeIndex::with_capacity(size / MIN_CHUNK).map_err(|_| out_of_memory)?;
    free.insert(0);

    debug!(
      "heap initialized with {size} bytes (hint {size_hint}), free index reserves {} entries",
      free.capacity()
    );

    Ok(Self { arena, free })
  }

  /// Total arena size in bytes.
  pub fn size(&self) -> usize {
    self.arena.len()
  }

  /// Offsets of the free chunks, ascending.
  pub fn free_chunks(&self) -> &[usize] {
    self.free.as_slice()
  }

  /// Walks the arena chunk by chunk from its first byte.
  pub fn chunks(&self) -> Chunks<'_> {
    Chunks::new(self.arena.as_slice())
  }

  /// Allocates a chunk with at least `size` payload bytes.
  ///
  /// Returns `None` for a zero size or when no free chunk is large enough.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Option<Handle> {
    if size < 1 {
      return None;
    }

    let chunk_size = checked_align(size)?.checked_add(DESCRIPTOR_LEN)?;
    let Some(found) = self.best_fit(chunk_size) else {
      debug!("none of {} free chunks holds {chunk_size} bytes", self.free.len());
      return None;
    };

    self.free.delete(found.offset);

    if found.size < chunk_size + MIN_CHUNK {
      // The remainder would be a sliver; hand out the whole chunk.
      self.arena.set_status(found.offset, Status::Allocated);
    } else {
      let rest = found.offset + chunk_size;
      self.arena.set_descriptor(rest, Status::Free, found.size - chunk_size);
      self.free.insert(rest);
      self.arena.set_descriptor(found.offset, Status::Allocated, chunk_size);
      trace!("split +{} leaving {} free bytes at +{rest}", found.offset, found.size - chunk_size);
    }

    trace!("allocated +{} for {size} bytes", found.offset);

    Some(Handle::for_chunk(found.offset))
  }

  /// Smallest free chunk of at least `chunk_size` bytes; the lowest offset wins ties.
  fn best_fit(
    &self,
    chunk_size: usize,
  ) -> Option<Chunk> {
    if self.free.is_empty() {
      return None;
    }

    let mut best: Option<Chunk> = None;
    for chunk in self.chunks() {
      let chunk = match chunk {
        Ok(chunk) => chunk,
        Err(corruption) => {
          error!("corrupted heap: {corruption}");
          return None;
        }
      };

      if chunk.status == Status::Free
        && chunk.size >= chunk_size
        && best.is_none_or(|best| chunk.size < best.size)
      {
        best = Some(chunk);
      }
    }

    best
  }

  /// Resolves a handle to the allocated chunk it names.
  pub(crate) fn allocated_chunk(
    &self,
    handle: Option<Handle>,
  ) -> core::result::Result<Chunk, ContractViolation> {
    let handle = handle.ok_or(ContractViolation::NullHandle)?;
    let offset = handle.offset();

    if offset >= self.arena.len() {
      return Err(ContractViolation::OutOfBounds { offset });
    }

    let chunk = handle
      .chunk()
      .and_then(|start| self.chunks().map_while(|chunk| chunk.ok()).find(|chunk| chunk.offset == start))
      .ok_or(ContractViolation::NotAChunk { offset })?;

    if chunk.status != Status::Allocated {
      return Err(ContractViolation::NotAllocated { offset });
    }

    Ok(chunk)
  }

  /// Frees the chunk behind `handle` and coalesces the free space around it.
  ///
  /// # Errors
  ///
  /// A [`ContractViolation`] when the handle is null or does not name an
  /// allocated chunk. The heap is left untouched in that case.
  pub fn try_deallocate(
    &mut self,
    handle: Option<Handle>,
  ) -> core::result::Result<(), ContractViolation> {
    let chunk = self.allocated_chunk(handle)?;

    self.arena.set_status(chunk.offset, Status::Free);
    self.free.insert(chunk.offset);
    trace!("freed +{} ({} bytes)", chunk.offset, chunk.size);

    self.coalesce();

    Ok(())
  }

  /// Merges every run of physically adjacent free chunks into its lowest member.
  fn coalesce(&mut self) {
    let mut position = 0;

    while let Some(current) = self.free.get(position) {
      let mut size = self.arena.size_at(current);

      while let Some(next) = self.free.get(position + 1) {
        if current + size != next {
          break;
        }

        size += self.arena.size_at(next);
        self.arena.set_status(next, Status::Merged);
        self.free.remove_at(position + 1);
        trace!("merged +{next} into +{current}");
      }

      self.arena.set_descriptor(current, Status::Free, size);
      position += 1;
    }
  }

  /// Caller-usable bytes of an allocated chunk.
  pub fn payload(
    &self,
    handle: Handle,
  ) -> Option<&[u8]> {
    let chunk = self.allocated_chunk(Some(handle)).ok()?;

    self.arena.as_slice().get(handle.offset()..chunk.end())
  }

  pub fn payload_mut(
    &mut self,
    handle: Handle,
  ) -> Option<&mut [u8]> {
    let chunk = self.allocated_chunk(Some(handle)).ok()?;

    self.arena.as_mut_slice().get_mut(handle.offset()..chunk.end())
  }

  #[cfg(test)]
  pub(crate) fn arena_mut(&mut self) -> &mut Arena {
    &mut self.arena
  }
}
