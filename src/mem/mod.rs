//! Mem API integration — the outbound half of the adapter.
//!
//! `client` wraps the Mem REST API (notes, collections, mem-it) behind a
//! typed client with a fixed error taxonomy. One call = one attempt; no
//! retries, no response caching.

pub mod client;
