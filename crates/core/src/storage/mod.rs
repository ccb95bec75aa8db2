//! Qiniu object storage adapter for Ghost.
//!
//! This module implements the blog's file storage contract on top of a
//! Qiniu bucket:
//! - `save` uploads through the form upload API with a freshly signed token
//! - `read` fetches from the bucket's public domain
//! - `exists` never probes the bucket and `delete` is not supported
//! - `serve` passes requests through, files are served by the domain
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        QiniuStorage                              │
//! │                  (StorageAdapter capability set)                 │
//! ├──────────────────────────────┬──────────────────────────────────┤
//! │ PathContext + Template       │ Credentials → upload token       │
//! │ dir/name from format         │ RemoteClient (form upload, GET)  │
//! └──────────────────────────────┴──────────────────────────────────┘
//! ```

mod adapter;
mod client;
mod config;
mod context;
mod error;
mod service;
mod template;
mod token;
mod unique;

pub use adapter::{Serve, StorageAdapter, UploadRequest};
pub use client::{PutResponse, QiniuClient, RemoteClient};
pub use config::QiniuConfig;
pub use context::{Clock, Field, FixedClock, PathContext, SystemClock};
pub use error::StorageError;
pub use service::QiniuStorage;
pub use template::{Template, TemplateError, split_format};
pub use token::{Credentials, PutPolicy};
pub use unique::{join_path, normalize_separators, sanitize_file_name, unique_file_name};
