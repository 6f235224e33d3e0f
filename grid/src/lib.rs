//! Sparse storage for an unbounded two-state cell plane.
//!
//! The plane is carved into 32x32 bit-packed [Chunk]s addressed by
//! [ChunkCoord].  A [ChunkStore] maps coordinates to chunks and never retains
//! an empty chunk; absent chunks read as all-dead.  [ByteStore] is the
//! parallel structure holding one byte per cell, used for overlays such as
//! cell age.
mod byte_store;
mod chunk;
mod coords;
mod store;

pub use byte_store::*;
pub use chunk::*;
pub use coords::*;
pub use store::*;
