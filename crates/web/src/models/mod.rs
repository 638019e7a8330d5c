//! Data stored in the HTTP session.

pub mod session;

pub use session as session_keys;
