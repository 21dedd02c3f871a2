//! Shared configuration for the CDC synchronizer.
//!
//! Configuration is loaded in layers: a base file, an environment-specific
//! file, and `APP_`-prefixed environment variable overrides. The shared
//! module contains the configuration structs consumed by the synchronizer
//! and its binaries.

pub mod environment;
pub mod load;
pub mod shared;

/// Trait implemented by configuration structures that require list parsing help.
pub trait Config {
    /// Keys whose values should be parsed as lists when loading the configuration.
    const LIST_PARSE_KEYS: &'static [&'static str];
}
