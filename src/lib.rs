//! # rheap - A Best-Fit Arena Heap
//!
//! This crate provides a self-contained **best-fit heap** that carves
//! allocations out of one fixed, pre-reserved arena. It follows the contract
//! of a general-purpose heap allocator: size-rounded allocations, splitting
//! of oversized chunks, and coalescing of neighbouring free space on free.
//!
//! ## Overview
//!
//! ```text
//!   Arena Layout:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                              ARENA                                   │
//!   │                                                                      │
//!   │   ┌────┬──────┬────┬──────────┬────┬────────────────────────────┐    │
//!   │   │hdr │  A1  │hdr │   free   │hdr │            free            │ .. │
//!   │   └────┴──────┴────┴──────────┴────┴────────────────────────────┘    │
//!   │   ▲           ▲                ▲                                     │
//!   │   +0          +a+s             ...                                   │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Chunks tile the arena: the chunk at +a with size s is followed by the
//!   chunk at +(a+s). No gaps, no overlap.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rheap
//!   ├── align        - Size rounding (align!, checked_align)
//!   ├── arena        - Zeroed byte region from the C allocator (internal)
//!   ├── chunk        - Descriptor encoding, status tags, arena walk
//!   ├── free_index   - Sorted free-chunk offsets (internal)
//!   ├── heap         - Heap: allocate, deallocate, split, coalesce
//!   ├── allocator    - Allocator: lifecycle and fatal misuse handling
//!   └── diagnostics  - Offsets, layout dump, stats, validation
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rheap::Allocator;
//!
//! let mut allocator = Allocator::new();
//! allocator.initialize(4096).unwrap();
//!
//! // Allocate 42 bytes and use them
//! let handle = allocator.allocate(42).unwrap();
//! allocator.payload_mut(handle).unwrap()[0] = 7;
//! assert_eq!(allocator.offset_of(Some(handle)), Some(8));
//!
//! // Free them again; a second free would end the process
//! allocator.deallocate(Some(handle));
//! allocator.shutdown();
//! ```
//!
//! ## How It Works
//!
//! Each chunk starts with an 8 byte descriptor:
//!
//! ```text
//!   Single Chunk:
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │     Descriptor        │           Payload              │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ status: u32     │  │  ┌──────────────────────────┐  │
//!   │  │ size:   u32     │  │  │  size - 8 bytes usable   │  │
//!   │  └─────────────────┘  │  └──────────────────────────┘  │
//!   │       8 bytes         │                                │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Handle returned to the caller
//! ```
//!
//! Allocating `n` bytes needs a chunk of `align!(n) + 8` bytes. The whole
//! arena is walked and the smallest free chunk that fits is taken, the
//! lowest one on ties. If at least [`MIN_CHUNK`] bytes would be left over
//! the chunk is split:
//!
//! ```text
//!   Before:  ┌──────────────────── free (s) ─────────────────────┐
//!   After:   ┌── allocated (need) ──┬────── free (s - need) ──────┐
//! ```
//!
//! Freeing lists the chunk in the free index and merges every run of
//! touching free chunks into its lowest member:
//!
//! ```text
//!   Before:  ┌── free ──┬── freed ──┬── free ──┬── alloc ──┐
//!   After:   ┌────────────── free ────────────┬── alloc ──┐
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **Fixed arena**: The arena never grows after initialization
//! - **4 byte granularity**: No alignment beyond rounding sizes to 4
//! - **O(n) operations**: Allocation and free walk the whole arena
//!
//! ## Safety
//!
//! Callers never touch raw pointers. Handles are arena offsets and every
//! access is bounds-checked, so a bad handle is caught as a
//! [`ContractViolation`] instead of corrupting memory.

pub mod align;
mod allocator;
mod arena;
mod chunk;
mod diagnostics;
mod error;
mod free_index;
mod heap;

pub use allocator::Allocator;
pub use chunk::{Chunk, Chunks, DESCRIPTOR_LEN, Handle, MAX_HEAP, MIN_CHUNK, MIN_HEAP, Status};
pub use diagnostics::HeapStats;
pub use error::{ContractViolation, Corruption, DumpError, HeapError, Result};
pub use heap::Heap;
