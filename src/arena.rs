use std::{ptr::NonNull, slice};

use crate::chunk::{Descriptor, Status};

/// Zero-filled byte region obtained from the C allocator.
///
/// All access goes through slices, so every descriptor read or write is
/// bounds-checked against `len`.
pub(crate) struct Arena {
  base: NonNull<u8>,
  len: usize,
}

impl Arena {
  /// Reserves `len` zeroed bytes, or `None` if the C allocator refuses.
  pub fn zeroed(len: usize) -> Option<Self> {
    let base = unsafe { libc::calloc(len, 1) };

    NonNull::new(base.cast::<u8>()).map(|base| Self { base, len })
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn as_slice(&self) -> &[u8] {
    // SAFETY: `base` was returned by calloc for `len` bytes and stays owned until drop.
    unsafe { slice::from_raw_parts(self.base.as_ptr(), self.len) }
  }

  pub fn as_mut_slice(&mut self) -> &mut [u8] {
    // SAFETY: as above; `&mut self` guarantees exclusive access.
    unsafe { slice::from_raw_parts_mut(self.base.as_ptr(), self.len) }
  }

  /// Descriptor at an untrusted offset.
  pub fn descriptor(
    &self,
    offset: usize,
  ) -> Option<Descriptor> {
    Descriptor::read(self.as_slice(), offset)
  }

  /// Size of a chunk the heap already knows to be live.
  ///
  /// # Panics
  ///
  /// Panics if `offset` does not leave room for a descriptor.
  pub fn size_at(
    &self,
    offset: usize,
  ) -> usize {
    match self.descriptor(offset) {
      Some(descriptor) => descriptor.size(),
      None => panic!("chunk offset +{offset} outside arena of {} bytes", self.len),
    }
  }

  pub fn set_descriptor(
    &mut self,
    offset: usize,
    status: Status,
    size: usize,
  ) {
    Descriptor::new(status, size).write(self.as_mut_slice(), offset);
  }

  pub fn set_status(
    &mut self,
    offset: usize,
    status: Status,
  ) {
    let size = self.size_at(offset);
    self.set_descriptor(offset, status, size);
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    unsafe { libc::free(self.base.as_ptr().cast()) };
  }
}
