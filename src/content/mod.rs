//! Content store access.
//!
//! The server only reads from the content root; nothing here writes.

pub mod resolver;

pub use resolver::{ResolveError, ResolvedResource, Resolver, resolve};
