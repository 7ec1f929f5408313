//! Read-only reporting over a [`Heap`]: offsets, layout dumps, statistics and
//! invariant checks. Nothing here mutates the heap.

use std::io::Write;

use crate::{
  chunk::{Handle, Status},
  error::{Corruption, DumpError},
  heap::Heap,
};

/// Chunks printed per line by [`Heap::write_layout`].
const CHUNKS_PER_ROW: usize = 5;

/// Totals gathered from one walk over the arena.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
  pub arena_size: usize,
  pub free_chunks: usize,
  pub free_bytes: usize,
  pub allocated_chunks: usize,
  pub allocated_bytes: usize,
  pub largest_free: usize,
}

impl Heap {
  /// Offset of a payload from the arena start, or `None` for a null handle or
  /// one past the arena end.
  pub fn offset_of(
    &self,
    handle: Option<Handle>,
  ) -> Option<usize> {
    handle.map(Handle::offset).filter(|&offset| offset < self.size())
  }

  /// Writes every chunk in address order as `+OOOOO (S,SSSSS)`, five per line.
  ///
  /// # Errors
  ///
  /// [`DumpError::Corrupted`] at the first chunk the walk cannot decode; the
  /// chunks before it have already been written.
  pub fn write_layout<W: Write>(
    &self,
    out: &mut W,
  ) -> Result<(), DumpError> {
    let mut on_row = 0;

    for chunk in self.chunks() {
      let chunk = chunk?;
      on_row += 1;

      let separator = if on_row % CHUNKS_PER_ROW == 0 { '\n' } else { ' ' };
      write!(
        out,
        "+{:05} ({},{:5}){separator}",
        chunk.offset,
        chunk.status.symbol(),
        chunk.size
      )?;
    }

    if on_row % CHUNKS_PER_ROW > 0 {
      writeln!(out)?;
    }

    Ok(())
  }

  pub fn stats(&self) -> Result<HeapStats, Corruption> {
    let mut stats = HeapStats {
      arena_size: self.size(),
      ..HeapStats::default()
    };

    for chunk in self.chunks() {
      let chunk = chunk?;
      match chunk.status {
        Status::Free => {
          stats.free_chunks += 1;
          stats.free_bytes += chunk.size;
          stats.largest_free = stats.largest_free.max(chunk.size);
        }
        _ => {
          stats.allocated_chunks += 1;
          stats.allocated_bytes += chunk.size;
        }
      }
    }

    Ok(stats)
  }

  /// Checks that chunks tile the arena, that the free index lists exactly the
  /// free chunks in ascending order, and that no two free chunks touch.
  pub fn validate(&self) -> Result<(), Corruption> {
    let index = self.free_chunks();

    if let Some(pair) = index.windows(2).find(|pair| pair[0] >= pair[1]) {
      return Err(Corruption::Unordered { offset: pair[1] });
    }

    let mut listed = index.iter().copied().peekable();
    let mut previous_free: Option<usize> = None;

    for chunk in self.chunks() {
      let chunk = chunk?;

      // Entries below this chunk were skipped over by the walk.
      if let Some(&entry) = listed.peek() {
        if entry < chunk.offset {
          return Err(Corruption::StaleEntry { offset: entry });
        }
      }

      if chunk.status != Status::Free {
        previous_free = None;
        continue;
      }

      if listed.next_if_eq(&chunk.offset).is_none() {
        return Err(Corruption::Unindexed {
          offset: chunk.offset,
        });
      }
      if let Some(offset) = previous_free {
        return Err(Corruption::Adjacent {
          offset,
          next: chunk.offset,
        });
      }
      previous_free = Some(chunk.offset);
    }

    match listed.next() {
      Some(offset) => Err(Corruption::StaleEntry { offset }),
      None => Ok(()),
    }
  }
}
