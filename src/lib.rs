//! filevault - personal file storage over HTTP
//!
//! Users register and log in with scrypt-protected credentials, then upload,
//! list, preview, download and delete their own files. Every file operation
//! is scoped to the caller; another user's file is indistinguishable from a
//! missing one.

pub mod auth;
pub mod cli;
pub mod file_storage;
pub mod http_server;
pub mod observability;
