//! Connection handle and shared connection state.
//!
//! [`Connection`] wraps one established stream. [`ConnectionState`] records
//! which connection, if any, is live; only the connect-and-read worker
//! mutates it, while the send worker takes snapshots.

mod handle;
mod state;

pub use handle::Connection;
pub use state::ConnectionState;

#[cfg(test)]
mod tests;
