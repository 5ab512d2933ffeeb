//! Pure transformations for ranged fetching.
//!
//! Planning, header formatting, response validation and ordered assembly.
//! Nothing in here touches the network or the filesystem.

mod assemble;
mod plan;
mod validation;

pub use assemble::{ChunkSlots, assemble};
pub use plan::{clip_to_length, plan};
pub use validation::{ContentRange, is_success, range_header, validate_response};
