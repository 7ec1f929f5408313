use std::io;

use thiserror::Error;

/// Errors reported while setting up a heap.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
  #[error("cannot reserve a heap for a size hint of {requested} bytes")]
  OutOfMemory { requested: usize },
}

pub type Result<T> = core::result::Result<T, HeapError>;

/// A caller broke the deallocation contract.
///
/// These are not allocation failures: the terminating entry points treat them
/// as fatal and end the process.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ContractViolation {
  #[error("attempt to free a null handle")]
  NullHandle,
  #[error("attempt to free through an allocator that holds no heap")]
  Uninitialized,
  #[error("handle +{offset} lies outside the arena")]
  OutOfBounds { offset: usize },
  #[error("handle +{offset} does not start a chunk payload")]
  NotAChunk { offset: usize },
  #[error("handle +{offset} names a chunk that is not allocated")]
  NotAllocated { offset: usize },
}

/// The arena or the free index no longer describes a well-formed heap.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Corruption {
  #[error("chunk status {tag:08x}")]
  BadStatus { offset: usize, tag: u32 },
  #[error("chunk at +{offset} claims {size} bytes")]
  BadSize { offset: usize, size: usize },
  #[error("descriptor at +{offset} runs past the arena end")]
  Truncated { offset: usize },
  #[error("free chunk at +{offset} is missing from the free index")]
  Unindexed { offset: usize },
  #[error("free index entry +{offset} is not a free chunk")]
  StaleEntry { offset: usize },
  #[error("free index is not strictly ascending at +{offset}")]
  Unordered { offset: usize },
  #[error("free chunks at +{offset} and +{next} were left uncoalesced")]
  Adjacent { offset: usize, next: usize },
}

/// Failure while writing the chunk layout.
#[derive(Debug, Error)]
pub enum DumpError {
  #[error("corrupted heap: {0}")]
  Corrupted(#[from] Corruption),
  #[error("failed to write heap layout")]
  Io(#[from] io::Error),
}
