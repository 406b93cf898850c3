//! Pure, host-file-system-facing layer for the versioning file system.
//!
//! This crate has no knowledge of FUSE: it only understands the version
//! store on disk and the layout/staging operations over it. `vfsfuse`
//! wires this up to the kernel upcall interface.

pub mod config;
pub mod error;
pub mod layout;
pub mod staging;

pub use config::{is_hidden_name, is_valid_name, MAX_VERSIONS, STORE_DIR_NAME};
pub use error::VfsError;
