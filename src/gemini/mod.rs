//! Gemini protocol implementation.
//!
//! A client sends one URL terminated by CRLF; the server answers with one
//! status line, an optional body, and closes the connection.
//!
//! # Architecture
//!
//! - **`connection`**: per-connection state machine driving one request to one response
//! - **`parser`**: extracts the request line from the incoming bytes
//! - **`request`**: request URL validation and path extraction
//! - **`response`**: response value, builder, and one constructor per status
//! - **`status`**: the closed set of status codes and their categories
//! - **`writer`**: frames a response and writes it in one piece
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │ AwaitingRequest  │ ← Buffer bytes until CRLF (max 1024 + 2, idle timeout)
//!        └──────┬───────────┘
//!               │ Request line parsed
//!               ├─ Malformed / refused → Responding (59 or 53)
//!               ├─ Timeout / EOF → Closed
//!               ▼
//!        ┌──────────────────┐
//!        │    Resolving     │ ← Look up the path under the content root
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Responding    │ ← Write status line + body, shut down
//!        └──────┬───────────┘
//!               ▼
//!            Closed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use capsule::content::Resolver;
//! use capsule::gemini::connection::{Connection, ServerContext};
//!
//! let context = Arc::new(ServerContext::new(Resolver::new("content")?, Duration::from_secs(10)));
//! let (socket, _peer) = listener.accept().await?;
//! let stream = acceptor.accept(socket).await?;
//! Connection::new(stream, context).run().await?;
//! ```

pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod status;
pub mod writer;
