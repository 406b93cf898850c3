//! Inode table for the FUSE filesystem.
//!
//! The mount exposes a single flat directory, so this is a plain bijection
//! between logical name and inode number — unlike a hierarchical VFS there
//! is no path normalization to do, and names are taken verbatim. Inode 1
//! is reserved for the root.

use std::collections::HashMap;

#[derive(Debug)]
pub struct InodeTable {
    name_to_inode: HashMap<String, u64>,
    inode_to_name: HashMap<u64, String>,
    next_inode: u64,
}

impl InodeTable {
    pub fn new() -> Self {
        InodeTable {
            name_to_inode: HashMap::new(),
            inode_to_name: HashMap::new(),
            next_inode: 2, // 1 is reserved for root
        }
    }

    /// Root inode, fixed at 1 by FUSE convention.
    pub const ROOT: u64 = 1;

    pub fn get_or_create(&mut self, name: &str) -> u64 {
        if let Some(&ino) = self.name_to_inode.get(name) {
            return ino;
        }
        let ino = self.next_inode;
        self.next_inode += 1;
        self.name_to_inode.insert(name.to_string(), ino);
        self.inode_to_name.insert(ino, name.to_string());
        ino
    }

    pub fn get_name(&self, ino: u64) -> Option<&str> {
        self.inode_to_name.get(&ino).map(String::as_str)
    }

    pub fn get_inode(&self, name: &str) -> Option<u64> {
        self.name_to_inode.get(name).copied()
    }

    /// Drop the mapping for `name` entirely (used by unlink — the inode
    /// number is never reused, matching the kernel's expectation that a
    /// stale inode simply starts returning ENOENT).
    pub fn remove(&mut self, name: &str) {
        if let Some(ino) = self.name_to_inode.remove(name) {
            self.inode_to_name.remove(&ino);
        }
    }

    /// Re-key an inode entry after a rename, preserving the inode number.
    pub fn rename(&mut self, old: &str, new: &str) {
        if let Some(ino) = self.name_to_inode.remove(old) {
            self.inode_to_name.insert(ino, new.to_string());
            self.name_to_inode.insert(new.to_string(), ino);
        }
    }
}
