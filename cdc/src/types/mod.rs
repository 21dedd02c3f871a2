//! Common types used throughout the synchronizer.
//!
//! Re-exports the canonical change event, typed cell values, target
//! operations, sequence tokens, and batch outcomes.

mod cell;
mod event;
mod operation;
mod outcome;
mod sequence;

pub use cell::*;
pub use event::*;
pub use operation::*;
pub use outcome::*;
pub use sequence::*;
