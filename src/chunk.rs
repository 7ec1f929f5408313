use static_assertions::const_assert;

use crate::{align::ALIGNMENT, error::Corruption};

/// Bytes taken by the `(status, size)` descriptor at the start of each chunk.
pub const DESCRIPTOR_LEN: usize = 8;

/// Smallest chunk ever split off as free space, descriptor included.
pub const MIN_CHUNK: usize = 32;

/// Floor applied to the arena size at initialization.
pub const MIN_HEAP: usize = 4096;

/// Largest arena a 32-bit size field can describe.
pub const MAX_HEAP: usize = u32::MAX as usize & !(ALIGNMENT - 1);

const_assert!(DESCRIPTOR_LEN % ALIGNMENT == 0);
const_assert!(MIN_CHUNK > DESCRIPTOR_LEN);
const_assert!(MIN_CHUNK % ALIGNMENT == 0);
const_assert!(MIN_HEAP % MIN_CHUNK == 0);
const_assert!(MAX_HEAP >= MIN_HEAP);

/// Lifecycle marker stored in a chunk descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
  /// Handed out to a caller.
  Allocated,
  /// Available, and listed in the free index.
  Free,
  /// Absorbed into a lower neighbour during coalescing. Never live again.
  Merged,
}

impl Status {
  const ALLOCATED: u32 = 0x5555_5555;
  const FREE: u32 = 0xAAAA_AAAA;
  const MERGED: u32 = 0x0000_0000;

  /// The bit pattern written into the arena for this status.
  pub const fn tag(self) -> u32 {
    match self {
      Self::Allocated => Self::ALLOCATED,
      Self::Free => Self::FREE,
      Self::Merged => Self::MERGED,
    }
  }

  pub const fn from_tag(tag: u32) -> Option<Self> {
    match tag {
      Self::ALLOCATED => Some(Self::Allocated),
      Self::FREE => Some(Self::Free),
      Self::MERGED => Some(Self::Merged),
      _ => None,
    }
  }

  /// Single-letter form used by the layout dump.
  pub const fn symbol(self) -> char {
    match self {
      Self::Allocated => 'A',
      Self::Free => 'F',
      Self::Merged => 'M',
    }
  }
}

/// Raw chunk header as it sits in the arena.
///
/// The tag is kept undecoded so a corrupted pattern can still be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
  pub tag: u32,
  pub size: u32,
}

impl Descriptor {
  pub fn new(
    status: Status,
    size: usize,
  ) -> Self {
    debug_assert!(size <= MAX_HEAP);
    Self {
      tag: status.tag(),
      size: size as u32,
    }
  }

  pub const fn status(&self) -> Option<Status> {
    Status::from_tag(self.tag)
  }

  pub const fn size(&self) -> usize {
    self.size as usize
  }

  /// Decodes the descriptor at `offset`, or `None` if it would not fit in `bytes`.
  pub fn read(
    bytes: &[u8],
    offset: usize,
  ) -> Option<Self> {
    let [t0, t1, t2, t3, s0, s1, s2, s3] = *bytes.get(offset..)?.first_chunk::<DESCRIPTOR_LEN>()?;

    Some(Self {
      tag: u32::from_ne_bytes([t0, t1, t2, t3]),
      size: u32::from_ne_bytes([s0, s1, s2, s3]),
    })
  }

  /// Encodes the descriptor at `offset`.
  ///
  /// # Panics
  ///
  /// Panics if the descriptor does not fit in `bytes`.
  pub fn write(
    self,
    bytes: &mut [u8],
    offset: usize,
  ) {
    let raw = &mut bytes[offset..offset + DESCRIPTOR_LEN];
    raw[..4].copy_from_slice(&self.tag.to_ne_bytes());
    raw[4..].copy_from_slice(&self.size.to_ne_bytes());
  }
}

/// A live chunk found while walking the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
  /// Offset of the descriptor from the arena start.
  pub offset: usize,
  pub status: Status,
  /// Total bytes, descriptor included.
  pub size: usize,
}

impl Chunk {
  /// Bytes usable by the caller.
  pub const fn payload_len(&self) -> usize {
    self.size - DESCRIPTOR_LEN
  }

  /// Offset of the first byte past this chunk, where its neighbour starts.
  pub const fn end(&self) -> usize {
    self.offset + self.size
  }
}

/// Caller-facing reference to an allocation: the payload offset in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(usize);

impl Handle {
  /// Builds a handle from a raw payload offset.
  ///
  /// Nothing is checked here; [`Heap::try_deallocate`](crate::Heap::try_deallocate)
  /// rejects handles that do not name an allocated chunk.
  pub const fn from_offset(offset: usize) -> Self {
    Self(offset)
  }

  pub const fn offset(self) -> usize {
    self.0
  }

  pub(crate) const fn for_chunk(chunk: usize) -> Self {
    Self(chunk + DESCRIPTOR_LEN)
  }

  pub(crate) const fn chunk(self) -> Option<usize> {
    self.0.checked_sub(DESCRIPTOR_LEN)
  }
}

/// Physical walk over the arena, from the first byte to the last, stepping
/// by each chunk's size.
///
/// Only `Free` and `Allocated` chunks can sit on the walk. Anything else, or a
/// size that would stall or overrun the walk, ends it with a [`Corruption`].
pub struct Chunks<'a> {
  bytes: &'a [u8],
  offset: usize,
  done: bool,
}

impl<'a> Chunks<'a> {
  pub fn new(bytes: &'a [u8]) -> Self {
    Self {
      bytes,
      offset: 0,
      done: false,
    }
  }

  fn step(&mut self) -> Result<Chunk, Corruption> {
    let offset = self.offset;
    let descriptor = Descriptor::read(self.bytes, offset).ok_or(Corruption::Truncated { offset })?;

    let size = descriptor.size();
    if size < DESCRIPTOR_LEN || size % ALIGNMENT != 0 || size > self.bytes.len() - offset {
      return Err(Corruption::BadSize { offset, size });
    }

    let status = match descriptor.status() {
      Some(status @ (Status::Free | Status::Allocated)) => status,
      _ => {
        return Err(Corruption::BadStatus {
          offset,
          tag: descriptor.tag,
        });
      }
    };

    self.offset += size;
    Ok(Chunk { offset, status, size })
  }
}

impl Iterator for Chunks<'_> {
  type Item = Result<Chunk, Corruption>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.done || self.offset >= self.bytes.len() {
      return None;
    }

    let item = self.step();
    self.done = item.is_err();
    Some(item)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn layout(chunks: &[(Status, usize)]) -> Vec<u8> {
    let total: usize = chunks.iter().map(|&(_, size)| size).sum();
    let mut bytes = vec![0u8; total];
    let mut offset = 0;
    for &(status, size) in chunks {
      Descriptor::new(status, size).write(&mut bytes, offset);
      offset += size;
    }
    bytes
  }

  #[test]
  fn test_status_tags() {
    for status in [Status::Allocated, Status::Free, Status::Merged] {
      assert_eq!(Status::from_tag(status.tag()), Some(status));
    }
    assert_eq!(Status::Allocated.tag(), 0x5555_5555);
    assert_eq!(Status::Free.tag(), 0xAAAA_AAAA);
    assert_eq!(Status::from_tag(0xDEAD_BEEF), None);
  }

  #[test]
  fn test_descriptor_read_write() {
    let mut bytes = [0u8; 24];
    Descriptor::new(Status::Free, 16).write(&mut bytes, 8);

    let descriptor = Descriptor::read(&bytes, 8).unwrap();
    assert_eq!(descriptor.status(), Some(Status::Free));
    assert_eq!(descriptor.size(), 16);

    assert_eq!(Descriptor::read(&bytes, 0).unwrap().status(), Some(Status::Merged));
    assert!(Descriptor::read(&bytes, 17).is_none());
    assert!(Descriptor::read(&bytes, 100).is_none());
  }

  #[test]
  fn test_walk() {
    let bytes = layout(&[(Status::Allocated, 12), (Status::Free, 52), (Status::Allocated, 32)]);

    let chunks: Vec<Chunk> = Chunks::new(&bytes).collect::<Result<_, _>>().unwrap();

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0], Chunk { offset: 0, status: Status::Allocated, size: 12 });
    assert_eq!(chunks[1], Chunk { offset: 12, status: Status::Free, size: 52 });
    assert_eq!(chunks[1].payload_len(), 44);
    assert_eq!(chunks[2].offset, chunks[1].end());
    assert_eq!(chunks[2].end(), bytes.len());
  }

  #[test]
  fn test_walk_stops_on_bad_status() {
    let mut bytes = layout(&[(Status::Free, 16), (Status::Free, 16)]);
    bytes[16..20].copy_from_slice(&0x1234_5678u32.to_ne_bytes());

    let items: Vec<_> = Chunks::new(&bytes).collect();

    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert_eq!(items[1], Err(Corruption::BadStatus { offset: 16, tag: 0x1234_5678 }));
  }

  #[test]
  fn test_walk_rejects_merged_on_path() {
    let bytes = layout(&[(Status::Merged, 16)]);

    let items: Vec<_> = Chunks::new(&bytes).collect();

    assert_eq!(items, vec![Err(Corruption::BadStatus { offset: 0, tag: 0 })]);
  }

  #[test]
  fn test_walk_stops_on_bad_size() {
    let mut bytes = layout(&[(Status::Free, 32)]);
    bytes[4..8].copy_from_slice(&0u32.to_ne_bytes());
    assert_eq!(
      Chunks::new(&bytes).next(),
      Some(Err(Corruption::BadSize { offset: 0, size: 0 }))
    );

    bytes[4..8].copy_from_slice(&64u32.to_ne_bytes());
    assert_eq!(
      Chunks::new(&bytes).next(),
      Some(Err(Corruption::BadSize { offset: 0, size: 64 }))
    );
  }

  #[test]
  fn test_handle_offsets() {
    let handle = Handle::for_chunk(40);
    assert_eq!(handle.offset(), 48);
    assert_eq!(handle.chunk(), Some(40));
    assert_eq!(Handle::from_offset(4).chunk(), None);
  }
}
