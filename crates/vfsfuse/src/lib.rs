//! FUSE bridge for the versioning file system.
//!
//! Wires `vfscore`'s pure version-store operations up to the `fuser`
//! upcall surface: attribute reporting, directory enumeration, and the
//! open/create/read/write/flush/release/truncate/unlink/rename/utimens
//! operations.

pub mod filesystem;
pub mod inode;
pub mod mount;

pub use filesystem::VersionFilesystem;
pub use mount::mount_foreground;
