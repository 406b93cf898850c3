//! `fuser::Filesystem` implementation for the versioning file system.
//!
//! Every handler runs to completion on the thread the FUSE bridge calls it
//! on — there is no internal worker pool. Dispatch is cooperative and
//! single-threaded, so the staging table and inode table are plain owned
//! fields rather than `Arc<Mutex<_>>`: there is only ever one caller.
//!
//! Each upcall is a thin `Reply*`-shaped wrapper around a `do_*` method that
//! returns a plain `Result<_, VfsError>`. `fuser::Reply*` values can't be
//! constructed outside the `fuser` crate, so the `do_*` methods are what
//! the tests at the bottom of this file drive directly.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::io::{Read, Seek, SeekFrom, Write as IoWrite};
use std::os::raw::c_int;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fuser::{
    FileAttr, FileType, Filesystem, KernelConfig, ReplyAttr, ReplyCreate, ReplyData,
    ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, ReplyWrite, Request, TimeOrNow,
};

use vfscore::error::VfsError;
use vfscore::layout;
use vfscore::staging::CommitOutcome;

use crate::inode::InodeTable;

/// Metadata cache TTL handed back to the kernel. All mutations to the
/// mount go through this driver, so the kernel never observes a change it
/// wasn't told about; a long TTL just avoids redundant getattr round-trips.
const TTL: Duration = Duration::from_secs(3600);
const BLOCK_SIZE: u32 = 512;

struct UidGid {
    uid: u32,
    gid: u32,
}

impl UidGid {
    fn current() -> Self {
        UidGid {
            uid: unsafe { libc::getuid() },
            gid: unsafe { libc::getgid() },
        }
    }
}

/// An open file handle: which logical name it refers to, and the host
/// path reads should be served from (always `name.1` — writes are
/// diverted to the staging file and never touch the handle).
struct OpenFile {
    name: String,
    read_path: PathBuf,
}

/// The FUSE filesystem driver.
pub struct VersionFilesystem {
    store: PathBuf,
    inodes: InodeTable,
    staging: vfscore::staging::StagingManager,
    open_files: HashMap<u64, OpenFile>,
    next_fh: u64,
    ids: UidGid,
}

impl VersionFilesystem {
    /// Create the driver, ensuring the version store directory exists
    /// (idempotent create).
    pub fn new(store: PathBuf) -> std::io::Result<Self> {
        fs::create_dir_all(&store)?;
        Ok(VersionFilesystem {
            store,
            inodes: InodeTable::new(),
            staging: vfscore::staging::StagingManager::new(),
            open_files: HashMap::new(),
            next_fh: 1,
            ids: UidGid::current(),
        })
    }

    fn alloc_fh(&mut self) -> u64 {
        let fh = self.next_fh;
        self.next_fh += 1;
        fh
    }

    /// Re-create the version store directory if it has gone missing.
    /// Idempotent, and cheap when the directory already exists — called at
    /// the top of every handler so that a store deleted out from under a
    /// live mount recovers on the next upcall instead of failing for the
    /// rest of the mount's lifetime.
    fn ensure_store(&self) -> Result<(), VfsError> {
        fs::create_dir_all(&self.store).map_err(|e| VfsError::io(&self.store, e))
    }

    fn dir_attr(&self, ino: u64) -> FileAttr {
        FileAttr {
            ino,
            size: 0,
            blocks: 0,
            atime: UNIX_EPOCH,
            mtime: UNIX_EPOCH,
            ctime: UNIX_EPOCH,
            crtime: UNIX_EPOCH,
            kind: FileType::Directory,
            perm: 0o755,
            nlink: 2,
            uid: self.ids.uid,
            gid: self.ids.gid,
            rdev: 0,
            blksize: BLOCK_SIZE,
            flags: 0,
        }
    }

    fn file_attr(&self, ino: u64, size: u64, mtime: SystemTime) -> FileAttr {
        FileAttr {
            ino,
            size,
            blocks: (size + BLOCK_SIZE as u64 - 1) / BLOCK_SIZE as u64,
            atime: mtime,
            mtime,
            ctime: mtime,
            crtime: mtime,
            kind: FileType::RegularFile,
            perm: 0o644,
            nlink: 1,
            uid: self.ids.uid,
            gid: self.ids.gid,
            rdev: 0,
            blksize: BLOCK_SIZE,
            flags: 0,
        }
    }

    /// Build the `FileAttr` for the current version of a present logical
    /// file, from the host metadata of `name.1`.
    fn attr_for_name(&self, ino: u64, name: &str) -> Option<FileAttr> {
        let path = layout::store_path(&self.store, name, 1);
        let meta = fs::metadata(&path).ok()?;
        Some(self.file_attr(ino, meta.len(), meta.modified().unwrap_or(UNIX_EPOCH)))
    }

    // ---- testable inner layer -------------------------------------------
    //
    // Everything below returns a plain `Result<_, VfsError>` and can be
    // driven directly from a test, without a `fuser::Reply*` value. The
    // `fuser::Filesystem` impl further down is a thin wrapper that resolves
    // FUSE-specific inputs (inode numbers, file handles) to a logical name
    // and turns the `Result` into the matching reply.

    /// Resolve and build the attribute record for `name`, assigning it
    /// inode `ino` (the caller has already allocated or looked one up).
    fn do_attr(&self, ino: u64, name: &str) -> Result<FileAttr, VfsError> {
        self.ensure_store()?;
        if vfscore::is_hidden_name(name) || !layout::is_present(&self.store, name) {
            return Err(VfsError::NotFound(name.to_string()));
        }
        self.attr_for_name(ino, name)
            .ok_or_else(|| VfsError::NotFound(name.to_string()))
    }

    /// `lookup`: resolve `name`, assigning it an inode if this is the first
    /// time it has been seen.
    fn do_lookup(&mut self, name: &str) -> Result<(u64, FileAttr), VfsError> {
        self.ensure_store()?;
        if vfscore::is_hidden_name(name) || !layout::is_present(&self.store, name) {
            return Err(VfsError::NotFound(name.to_string()));
        }
        let ino = self.inodes.get_or_create(name);
        let attr = self.do_attr(ino, name)?;
        Ok((ino, attr))
    }

    /// `readdir`: `.`, `..`, then every visible present logical name.
    fn do_readdir(&mut self) -> Result<Vec<(u64, FileType, String)>, VfsError> {
        self.ensure_store()?;
        let names = layout::list_visible_names(&self.store)?;

        let mut entries = Vec::with_capacity(names.len() + 2);
        entries.push((InodeTable::ROOT, FileType::Directory, ".".to_string()));
        entries.push((InodeTable::ROOT, FileType::Directory, "..".to_string()));
        for name in &names {
            let child_ino = self.inodes.get_or_create(name);
            entries.push((child_ino, FileType::RegularFile, name.clone()));
        }
        Ok(entries)
    }

    /// `open`: fail if `name.1` is absent, else allocate a handle that
    /// serves reads from `name.1`.
    fn do_open(&mut self, name: &str) -> Result<u64, VfsError> {
        self.ensure_store()?;
        if !layout::is_present(&self.store, name) {
            return Err(VfsError::NotFound(name.to_string()));
        }
        let read_path = layout::store_path(&self.store, name, 1);
        let fh = self.alloc_fh();
        self.open_files.insert(
            fh,
            OpenFile {
                name: name.to_string(),
                read_path,
            },
        );
        Ok(fh)
    }

    /// `create`: reject hidden names; if `name.1` is absent, create it
    /// empty (an empty create does not by itself produce a second
    /// version — there is no prior content to evict).
    fn do_create(&mut self, name: &str) -> Result<(u64, FileAttr, u64), VfsError> {
        self.ensure_store()?;
        if vfscore::is_hidden_name(name) {
            return Err(VfsError::NotPermitted(name.to_string()));
        }

        let current = layout::store_path(&self.store, name, 1);
        if !current.exists() {
            fs::write(&current, []).map_err(|e| VfsError::io(&current, e))?;
        }

        let ino = self.inodes.get_or_create(name);
        let attr = self
            .attr_for_name(ino, name)
            .ok_or_else(|| VfsError::NotFound(name.to_string()))?;

        let fh = self.alloc_fh();
        self.open_files.insert(
            fh,
            OpenFile {
                name: name.to_string(),
                read_path: current,
            },
        );
        Ok((ino, attr, fh))
    }

    /// `read`: always serves the current version (`name.1`), regardless of
    /// when the handle was opened. A seek failure replies with an empty
    /// read rather than an error, matching the original driver's
    /// tolerance for an offset past end-of-file.
    fn do_read(&self, name: &str, offset: i64, size: u32) -> Result<Vec<u8>, VfsError> {
        self.ensure_store()?;
        let path = layout::store_path(&self.store, name, 1);
        let mut file = fs::File::open(&path).map_err(|e| VfsError::io(&path, e))?;
        if file.seek(SeekFrom::Start(offset as u64)).is_err() {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; size as usize];
        let n = file.read(&mut buf).map_err(|e| VfsError::io(&path, e))?;
        buf.truncate(n);
        Ok(buf)
    }

    /// `write`: diverted to the staging file, never to `name.1` directly.
    fn do_write(&mut self, name: &str, offset: i64, data: &[u8]) -> Result<u32, VfsError> {
        self.ensure_store()?;
        let entry = self.staging.acquire(&self.store, name)?.clone();

        let mut file = fs::OpenOptions::new()
            .write(true)
            .open(&entry.path)
            .map_err(|e| VfsError::io(&entry.path, e))?;
        file.seek(SeekFrom::Start(offset as u64))
            .map_err(|e| VfsError::io(&entry.path, e))?;
        file.write_all(data)
            .map_err(|e| VfsError::io(&entry.path, e))?;
        Ok(data.len() as u32)
    }

    /// `truncate` (via `setattr`'s `size` field): also diverted to staging.
    fn do_truncate(&mut self, name: &str, length: u64) -> Result<(), VfsError> {
        self.ensure_store()?;
        let entry = self.staging.acquire(&self.store, name)?.clone();
        let file = fs::OpenOptions::new()
            .write(true)
            .open(&entry.path)
            .map_err(|e| VfsError::io(&entry.path, e))?;
        file.set_len(length)
            .map_err(|e| VfsError::io(&entry.path, e))?;
        Ok(())
    }

    /// `utimens`: only `name.1` is touched; historical versions are
    /// untouched.
    fn do_utimens(
        &self,
        name: &str,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
    ) -> Result<(), VfsError> {
        self.ensure_store()?;
        let current = layout::store_path(&self.store, name, 1);
        if current.exists() {
            apply_times(&current, atime, mtime);
        }
        Ok(())
    }

    /// `flush`: apply the staging manager's commit-policy.
    fn do_flush(&mut self, name: &str) -> Result<CommitOutcome, VfsError> {
        self.ensure_store()?;
        self.staging.commit(&self.store, name)
    }

    /// `unlink`: delete every version and any staging artifact.
    fn do_unlink(&mut self, name: &str) -> Result<(), VfsError> {
        self.ensure_store()?;
        if vfscore::is_hidden_name(name) || !layout::is_present(&self.store, name) {
            return Err(VfsError::NotFound(name.to_string()));
        }
        layout::delete_all(&self.store, name)?;
        self.staging.discard(&self.store, name);
        self.inodes.remove(name);
        Ok(())
    }

    /// `rename`: move every version across, preserving indices.
    fn do_rename(&mut self, name: &str, newname: &str) -> Result<(), VfsError> {
        self.ensure_store()?;
        if vfscore::is_hidden_name(name) || vfscore::is_hidden_name(newname) {
            return Err(VfsError::NotPermitted(name.to_string()));
        }
        if !layout::is_present(&self.store, name) {
            return Err(VfsError::NotFound(name.to_string()));
        }
        layout::rename_chain(&self.store, name, newname)?;
        self.staging.rekey(&self.store, name, newname);
        self.inodes.rename(name, newname);
        Ok(())
    }
}

fn errno_for(err: &VfsError) -> c_int {
    match err {
        VfsError::NotFound(_) => libc::ENOENT,
        VfsError::NotPermitted(_) => libc::EPERM,
        VfsError::Io { .. } => libc::EIO,
    }
}

impl Filesystem for VersionFilesystem {
    fn init(&mut self, _req: &Request, _config: &mut KernelConfig) -> Result<(), c_int> {
        Ok(())
    }

    fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
        if parent != InodeTable::ROOT {
            reply.error(libc::ENOENT);
            return;
        }

        let name = name.to_string_lossy().to_string();
        match self.do_lookup(&name) {
            Ok((_, attr)) => reply.entry(&TTL, &attr, 0),
            Err(e) => reply.error(errno_for(&e)),
        }
    }

    fn getattr(&mut self, _req: &Request, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        if ino == InodeTable::ROOT {
            reply.attr(&TTL, &self.dir_attr(ino));
            return;
        }

        let Some(name) = self.inodes.get_name(ino).map(str::to_string) else {
            reply.error(libc::ENOENT);
            return;
        };

        match self.do_attr(ino, &name) {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(e) => reply.error(errno_for(&e)),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        if ino != InodeTable::ROOT {
            reply.error(libc::ENOENT);
            return;
        }

        let entries = match self.do_readdir() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "readdir failed to scan store");
                reply.error(errno_for(&e));
                return;
            }
        };

        for (i, (ino, kind, name)) in entries.iter().enumerate().skip(offset as usize) {
            if reply.add(*ino, (i + 1) as i64, *kind, name) {
                break;
            }
        }
        reply.ok();
    }

    fn open(&mut self, _req: &Request, ino: u64, _flags: i32, reply: ReplyOpen) {
        let Some(name) = self.inodes.get_name(ino).map(str::to_string) else {
            reply.error(libc::ENOENT);
            return;
        };

        match self.do_open(&name) {
            Ok(fh) => reply.opened(fh, 0),
            Err(e) => reply.error(errno_for(&e)),
        }
    }

    fn create(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        if parent != InodeTable::ROOT {
            reply.error(libc::ENOENT);
            return;
        }

        let name = name.to_string_lossy().to_string();
        match self.do_create(&name) {
            Ok((_, attr, fh)) => reply.created(&TTL, &attr, 0, fh, 0),
            Err(e) => {
                tracing::warn!(name, error = %e, "create failed");
                reply.error(errno_for(&e));
            }
        }
    }

    fn read(
        &mut self,
        _req: &Request,
        _ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let Some(name) = self.open_files.get(&fh).map(|f| f.name.clone()) else {
            reply.error(libc::EBADF);
            return;
        };

        match self.do_read(&name, offset, size) {
            Ok(buf) => reply.data(&buf),
            Err(e) => reply.error(errno_for(&e)),
        }
    }

    fn write(
        &mut self,
        _req: &Request,
        _ino: u64,
        fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        let Some(name) = self.open_files.get(&fh).map(|f| f.name.clone()) else {
            reply.error(libc::EBADF);
            return;
        };

        match self.do_write(&name, offset, data) {
            Ok(n) => reply.written(n),
            Err(e) => reply.error(errno_for(&e)),
        }
    }

    fn setattr(
        &mut self,
        _req: &Request,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        size: Option<u64>,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        if ino == InodeTable::ROOT {
            reply.attr(&TTL, &self.dir_attr(ino));
            return;
        }

        let Some(name) = self.inodes.get_name(ino).map(str::to_string) else {
            reply.error(libc::ENOENT);
            return;
        };

        if let Some(new_size) = size {
            if let Err(e) = self.do_truncate(&name, new_size) {
                reply.error(errno_for(&e));
                return;
            }
        }

        if atime.is_some() || mtime.is_some() {
            if let Err(e) = self.do_utimens(&name, atime, mtime) {
                reply.error(errno_for(&e));
                return;
            }
        }

        match self.do_attr(ino, &name) {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(e) => reply.error(errno_for(&e)),
        }
    }

    fn flush(&mut self, _req: &Request, ino: u64, fh: u64, _lock_owner: u64, reply: ReplyEmpty) {
        let Some(name) = self
            .open_files
            .get(&fh)
            .map(|f| f.name.clone())
            .or_else(|| self.inodes.get_name(ino).map(str::to_string))
        else {
            reply.ok();
            return;
        };

        match self.do_flush(&name) {
            Ok(_) => {
                let current = layout::store_path(&self.store, &name, 1);
                if let Ok(file) = fs::File::open(&current) {
                    let _ = file.sync_all();
                }
                reply.ok();
            }
            Err(e) => {
                tracing::warn!(name, error = %e, "flush failed to commit");
                reply.error(errno_for(&e));
            }
        }
    }

    fn release(
        &mut self,
        _req: &Request,
        _ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        self.open_files.remove(&fh);
        reply.ok();
    }

    fn unlink(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        if parent != InodeTable::ROOT {
            reply.error(libc::ENOENT);
            return;
        }

        let name = name.to_string_lossy().to_string();
        match self.do_unlink(&name) {
            Ok(()) => reply.ok(),
            Err(e) => {
                tracing::warn!(name, error = %e, "unlink failed");
                reply.error(errno_for(&e));
            }
        }
    }

    fn rename(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        newparent: u64,
        newname: &OsStr,
        _flags: u32,
        reply: ReplyEmpty,
    ) {
        if parent != InodeTable::ROOT || newparent != InodeTable::ROOT {
            reply.error(libc::ENOENT);
            return;
        }

        let name = name.to_string_lossy().to_string();
        let newname = newname.to_string_lossy().to_string();

        match self.do_rename(&name, &newname) {
            Ok(()) => reply.ok(),
            Err(e) => {
                tracing::warn!(name, newname, error = %e, "rename failed");
                reply.error(errno_for(&e));
            }
        }
    }
}

/// Apply a `utimens`-style time request to a host file path. `TimeOrNow`
/// comes from `fuser`; `Now` resolves to the current wall-clock time.
fn apply_times(path: &std::path::Path, atime: Option<TimeOrNow>, mtime: Option<TimeOrNow>) {
    let resolve = |t: TimeOrNow| match t {
        TimeOrNow::SpecificTime(t) => t,
        TimeOrNow::Now => SystemTime::now(),
    };

    let Ok(file) = fs::File::options().write(true).open(path) else {
        return;
    };
    let mut times = fs::FileTimes::new();
    if let Some(a) = atime {
        times = times.set_accessed(resolve(a));
    }
    if let Some(m) = mtime {
        times = times.set_modified(resolve(m));
    }
    let _ = file.set_times(times);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_fs(dir: &std::path::Path) -> VersionFilesystem {
        VersionFilesystem::new(dir.to_path_buf()).unwrap()
    }

    /// Scenario 1 (spec.md §8): create, write, close — store contains only
    /// `a.1`, no `a.2`.
    #[test]
    fn create_write_close_produces_single_version() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = new_fs(dir.path());

        fs.do_create("a").unwrap();
        fs.do_write("a", 0, b"hello").unwrap();
        fs.do_flush("a").unwrap();

        assert_eq!(
            fs::read(layout::store_path(dir.path(), "a", 1)).unwrap(),
            b"hello"
        );
        assert!(!layout::store_path(dir.path(), "a", 2).exists());
    }

    /// Scenario 2: re-open, overwrite, close — previous content rotates
    /// into `a.2`.
    #[test]
    fn overwrite_rotates_previous_version_into_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = new_fs(dir.path());

        fs.do_create("a").unwrap();
        fs.do_write("a", 0, b"hello").unwrap();
        fs.do_flush("a").unwrap();

        fs.do_open("a").unwrap();
        fs.do_write("a", 0, b"HELLO").unwrap();
        fs.do_flush("a").unwrap();

        assert_eq!(
            fs::read(layout::store_path(dir.path(), "a", 1)).unwrap(),
            b"HELLO"
        );
        assert_eq!(
            fs::read(layout::store_path(dir.path(), "a", 2)).unwrap(),
            b"hello"
        );
    }

    /// Scenario 3: re-open, write identical bytes, close — chain is
    /// unchanged, no `a.3`.
    #[test]
    fn identical_rewrite_does_not_create_new_version() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = new_fs(dir.path());

        fs.do_create("a").unwrap();
        fs.do_write("a", 0, b"hello").unwrap();
        fs.do_flush("a").unwrap();
        fs.do_open("a").unwrap();
        fs.do_write("a", 0, b"HELLO").unwrap();
        fs.do_flush("a").unwrap();

        fs.do_open("a").unwrap();
        fs.do_write("a", 0, b"HELLO").unwrap();
        fs.do_flush("a").unwrap();

        assert_eq!(
            fs::read(layout::store_path(dir.path(), "a", 1)).unwrap(),
            b"HELLO"
        );
        assert_eq!(
            fs::read(layout::store_path(dir.path(), "a", 2)).unwrap(),
            b"hello"
        );
        assert!(!layout::store_path(dir.path(), "a", 3).exists());
    }

    /// Scenario 4: 8 distinct successive versions of `b` — only `b.1..b.6`
    /// survive, `b.1` is the most recent.
    #[test]
    fn rotation_evicts_beyond_max_versions() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = new_fs(dir.path());

        fs.do_create("b").unwrap();
        for i in 1..=8u32 {
            let content = format!("v{i}");
            fs.do_write("b", 0, content.as_bytes()).unwrap();
            fs.do_flush("b").unwrap();
        }

        let expect = |n: u32, v: u32| {
            assert_eq!(
                fs::read_to_string(layout::store_path(dir.path(), "b", n)).unwrap(),
                format!("v{v}")
            );
        };
        expect(1, 8);
        expect(2, 7);
        expect(3, 6);
        expect(4, 5);
        expect(5, 4);
        expect(6, 3);
        assert!(!layout::store_path(dir.path(), "b", 7).exists());
    }

    /// Scenario 6: unlink removes every version; readdir no longer lists
    /// the name.
    #[test]
    fn unlink_removes_all_versions_and_drops_from_readdir() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = new_fs(dir.path());

        fs.do_create("a").unwrap();
        fs.do_write("a", 0, b"hello").unwrap();
        fs.do_flush("a").unwrap();
        fs.do_open("a").unwrap();
        fs.do_write("a", 0, b"HELLO").unwrap();
        fs.do_flush("a").unwrap();

        assert!(layout::store_path(dir.path(), "a", 1).exists());
        assert!(layout::store_path(dir.path(), "a", 2).exists());

        fs.do_unlink("a").unwrap();

        assert!(!layout::store_path(dir.path(), "a", 1).exists());
        assert!(!layout::store_path(dir.path(), "a", 2).exists());

        let names: Vec<String> = fs
            .do_readdir()
            .unwrap()
            .into_iter()
            .filter(|(_, kind, _)| *kind == FileType::RegularFile)
            .map(|(_, _, name)| name)
            .collect();
        assert!(!names.contains(&"a".to_string()));
    }

    /// Rename through the driver preserves the whole version chain.
    #[test]
    fn rename_preserves_version_chain_through_driver() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = new_fs(dir.path());

        fs.do_create("a").unwrap();
        fs.do_write("a", 0, b"hello").unwrap();
        fs.do_flush("a").unwrap();
        fs.do_open("a").unwrap();
        fs.do_write("a", 0, b"HELLO").unwrap();
        fs.do_flush("a").unwrap();

        fs.do_rename("a", "b").unwrap();

        assert!(!layout::is_present(dir.path(), "a"));
        assert_eq!(
            fs::read(layout::store_path(dir.path(), "b", 1)).unwrap(),
            b"HELLO"
        );
        assert_eq!(
            fs::read(layout::store_path(dir.path(), "b", 2)).unwrap(),
            b"hello"
        );
    }

    /// Inode resolution: `lookup` assigns and reuses one inode per name,
    /// and its attribute matches the current version's host metadata.
    #[test]
    fn lookup_resolves_inode_and_matching_attr() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = new_fs(dir.path());

        fs.do_create("a").unwrap();
        fs.do_write("a", 0, b"hello").unwrap();
        fs.do_flush("a").unwrap();

        let (ino, attr) = fs.do_lookup("a").unwrap();
        assert_eq!(attr.size, 5);
        assert_eq!(fs.do_attr(ino, "a").unwrap().size, 5);
    }

    #[test]
    fn lookup_rejects_hidden_and_absent_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = new_fs(dir.path());

        assert!(matches!(fs.do_lookup("nope"), Err(VfsError::NotFound(_))));
        assert!(matches!(
            fs.do_lookup(".hidden"),
            Err(VfsError::NotFound(_))
        ));
    }

    /// The store directory recovers if deleted out from under a live
    /// mount, rather than failing every subsequent upcall.
    #[test]
    fn store_directory_is_recreated_if_removed_out_from_under_the_mount() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("store");
        let mut fs = new_fs(&store);
        fs.do_create("a").unwrap();

        fs::remove_dir_all(&store).unwrap();
        assert!(!store.exists());

        fs.do_write("a", 0, b"hello").unwrap();
        assert!(store.exists());
        fs.do_flush("a").unwrap();
        assert_eq!(fs::read(layout::store_path(&store, "a", 1)).unwrap(), b"hello");
    }
}
