//! Capsule - minimal Gemini server
//!
//! Core library for request parsing, content resolution and response framing.

pub mod config;
pub mod content;
pub mod gemini;
pub mod server;
