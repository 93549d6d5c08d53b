#![no_std]
extern crate alloc;

pub mod allocator;
pub mod index;

pub use allocator::{GroupAllocator, GroupCounts};
pub use index::{IndexConflict, IndexedMap};
