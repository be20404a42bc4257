//! TCP/TLS front end: accepts connections and hands decrypted streams to
//! [`crate::gemini::connection::Connection`].

pub mod listener;
pub mod tls;
