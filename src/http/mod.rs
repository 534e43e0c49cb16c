//! HTTP protocol layer
//!
//! Cache, MIME, range and response-building primitives shared by the
//! dispatcher, decoupled from path resolution.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

pub use range::parse_range_header;
