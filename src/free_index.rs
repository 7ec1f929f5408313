//! Ascending list of free-chunk offsets.
//!
//! Membership mirrors the arena exactly: an offset is listed if and only if
//! the chunk there has [`Status::Free`](crate::chunk::Status::Free).

use std::collections::TryReserveError;

pub(crate) struct FreeIndex {
  entries: Vec<usize>,
}

impl FreeIndex {
  /// Reserves room for `capacity` entries up front.
  ///
  /// The reservation is the expected ceiling, not a hard cap: a chunk freed
  /// whole can be smaller than `MIN_CHUNK`, so a pathological pattern may
  /// list more entries, and the storage then grows.
  pub fn with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
    let mut entries = Vec::new();
    entries.try_reserve_exact(capacity)?;

    Ok(Self { entries })
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn capacity(&self) -> usize {
    self.entries.capacity()
  }

  pub fn as_slice(&self) -> &[usize] {
    &self.entries
  }

  pub fn get(
    &self,
    position: usize,
  ) -> Option<usize> {
    self.entries.get(position).copied()
  }

  /// Position of `offset`, or `None` if it is not listed.
  pub fn search(
    &self,
    offset: usize,
  ) -> Option<usize> {
    self.entries.binary_search(&offset).ok()
  }

  /// Inserts `offset`, shifting every greater entry up by one.
  pub fn insert(
    &mut self,
    offset: usize,
  ) {
    let position = self.entries.partition_point(|&entry| entry < offset);
    debug_assert!(self.get(position) != Some(offset), "+{offset} already free");

    if self.entries.len() == self.entries.capacity() {
      log::debug!("free index grows past {} entries", self.entries.capacity());
    }
    self.entries.insert(position, offset);
  }

  /// Removes `offset` if listed; a missing offset is ignored.
  pub fn delete(
    &mut self,
    offset: usize,
  ) -> bool {
    match self.search(offset) {
      Some(position) => {
        self.entries.remove(position);
        true
      }
      None => false,
    }
  }

  pub fn remove_at(
    &mut self,
    position: usize,
  ) -> usize {
    self.entries.remove(position)
  }
}
