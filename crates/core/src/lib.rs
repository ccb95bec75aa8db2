//! Core logic for the Ghost Qiniu storage adapter.
//!
//! This crate contains the adapter itself with ZERO web framework dependencies.
//! The HTTP surface that exposes it to a host lives in the api crate.
//!
//! # Modules
//!
//! - `storage` - Storage capability set, path templating, upload tokens and the Qiniu client

pub mod storage;
