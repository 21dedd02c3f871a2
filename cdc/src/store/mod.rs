//! Target store abstractions and implementations.
//!
//! The synchronizer writes through the [`base::TargetClient`] trait. The
//! memory implementation backs tests and development; the postgres
//! implementation is the production target.

pub mod base;
pub mod memory;
pub mod postgres;
