//! Request-time static content resolver.
//!
//! Given an incoming path and query plus an immutable, validated
//! configuration, [`StaticHandler`] decides between serving file bytes, a
//! canonicalizing 301 redirect, a generated directory listing, an SPA
//! fallback, a custom error page, or a plain 404/403/500 — attaching
//! `Content-Type`, `Cache-Control` and `Last-Modified` metadata along the
//! way.
//!
//! The crate is transport-agnostic and read-only: the host process owns
//! listeners, lifecycle and `tracing` subscribers; it builds a
//! [`RequestContext`] per request and forwards the returned `hyper`
//! response. Filesystem access runs through the [`Vfs`] capability trait, so
//! tests substitute [`MemFs`] for real disk.

pub mod config;
pub mod handler;
pub mod http;
pub mod listing;
pub mod resolver;
pub mod vfs;

pub use config::{Config, ConfigError, StaticConfig};
pub use handler::{RequestContext, ResponseDecision, StaticHandler};
pub use vfs::{DirEntryInfo, FileNode, FsError, MemFs, RealFs, Vfs};
