// crates/core/src/lib.rs
//! Request model shared by the webdasher datastore and HTTP server.
//!
//! Everything here is pure: payload validation, typed request bodies and the
//! mapping of client-reported rows onto the two stored record kinds.

pub mod error;
pub mod paths;
pub mod request;
pub mod rows;

pub use error::*;
pub use request::*;
pub use rows::*;
