//! Networking layer for embedded components.
//!
//! This crate handles:
//! - Inserting and removing `<script>` tags by URL
//! - Deduplicating concurrent loads of the same script
//! - Fetching script bodies over HTTP (gzip, brotli)

pub mod fetcher;
pub mod loader;

pub use fetcher::{HttpScriptFetcher, ScriptFetcher};
pub use loader::{LoadError, LoaderConfig, ResourceManager, ScriptLoader, ScriptPlacement};
