//! Virtual filesystem: an isolated tree of directories and files.
//!
//! Scope:
//! - Create/remove directories, open/enumerate directories, open files for
//!   sequential reads. No host filesystem interaction anywhere.
//! - Guest-observable failures are `Errno` return values with real-OS
//!   semantics; handle misuse surfaces as `HandleError` for the caller to
//!   escalate (it is never visible to a well-behaved guest).
//!
//! Invariants:
//! - A path resolves to at most one node; the root `/` always exists.
//! - Directory enumeration order is the insertion order of children, fixed
//!   at creation; a handle snapshots that order at open.
//! - Removing a non-empty directory fails `NOTEMPTY` and changes nothing.
//! - Exhausted enumeration and end-of-file repeat `None` forever.

use std::collections::{BTreeMap, BTreeSet};

use crate::vos::errno::Errno;
use crate::vos::stream;

/// The namespace root. Always present, never removable.
pub const ROOT: &str = "/";

/// Mode recorded on the root and on seeded directories.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Handle to an open directory enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirFd(pub u32);

/// Handle to an open file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileFd(pub u32);

/// Why a handle could not be dispatched. Not guest-observable: the caller
/// treats any of these as a scope fault that aborts the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleError {
    /// The descriptor is not live for the operation's handle kind.
    Unknown { fd: u32 },
    /// The descriptor was issued but has already been closed.
    Closed { fd: u32 },
}

#[derive(Clone, Debug)]
struct DirNode {
    /// Child names in insertion order; the enumeration contract.
    children: Vec<String>,
    /// Recorded at creation, not interpreted.
    mode: u32,
}

#[derive(Clone, Debug)]
struct FileNode {
    data: Vec<u8>,
}

#[derive(Clone, Debug)]
struct DirHandle {
    /// Snapshot of the child list taken at open.
    entries: Vec<String>,
    pos: usize,
}

#[derive(Clone, Debug)]
struct FileHandle {
    path: String,
    cursor: usize,
}

/// Per-scope filesystem state.
#[derive(Clone, Debug)]
pub struct VirtualFs {
    dirs: BTreeMap<String, DirNode>,
    files: BTreeMap<String, FileNode>,
    dir_handles: BTreeMap<u32, DirHandle>,
    file_handles: BTreeMap<u32, FileHandle>,
    /// Descriptors that were issued and later closed.
    retired: BTreeSet<u32>,
    next_fd: u32,
}

impl Default for VirtualFs {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualFs {
    /// Empty filesystem containing only the root directory.
    pub fn new() -> Self {
        let mut dirs = BTreeMap::new();
        dirs.insert(
            ROOT.to_string(),
            DirNode {
                children: Vec::new(),
                mode: DEFAULT_DIR_MODE,
            },
        );
        Self {
            dirs,
            files: BTreeMap::new(),
            dir_handles: BTreeMap::new(),
            file_handles: BTreeMap::new(),
            retired: BTreeSet::new(),
            // Descriptors 0..=2 are reserved for the scope's stdio streams.
            next_fd: 3,
        }
    }

    /// Open a directory for enumeration.
    ///
    /// The handle snapshots the child list in insertion order; later tree
    /// mutations do not affect an open enumeration.
    pub fn open_dir(&mut self, path: &str) -> Result<DirFd, Errno> {
        let norm = normalize(path);
        if self.files.contains_key(&norm) {
            return Err(Errno::Notdir);
        }
        let Some(node) = self.dirs.get(&norm) else {
            return Err(Errno::Noent);
        };
        let entries = node.children.clone();
        let fd = self.next_fd;
        self.next_fd += 1;
        self.dir_handles.insert(fd, DirHandle { entries, pos: 0 });
        Ok(DirFd(fd))
    }

    /// Next child name, or `None` once the snapshot is exhausted.
    pub fn read_dir(&mut self, fd: DirFd) -> Result<Option<String>, HandleError> {
        let handle = match self.dir_handles.get_mut(&fd.0) {
            Some(handle) => handle,
            None if self.retired.contains(&fd.0) => return Err(HandleError::Closed { fd: fd.0 }),
            None => return Err(HandleError::Unknown { fd: fd.0 }),
        };
        if handle.pos >= handle.entries.len() {
            return Ok(None);
        }
        let name = handle.entries[handle.pos].clone();
        handle.pos += 1;
        Ok(Some(name))
    }

    /// Close a directory handle. Succeeds exactly once per handle.
    pub fn close_dir(&mut self, fd: DirFd) -> Result<(), HandleError> {
        if self.dir_handles.remove(&fd.0).is_some() {
            self.retired.insert(fd.0);
            return Ok(());
        }
        if self.retired.contains(&fd.0) {
            Err(HandleError::Closed { fd: fd.0 })
        } else {
            Err(HandleError::Unknown { fd: fd.0 })
        }
    }

    /// Create a directory. `mode` is recorded on the node, not interpreted.
    pub fn create_dir(&mut self, path: &str, mode: u32) -> Result<(), Errno> {
        let norm = normalize(path);
        if self.dirs.contains_key(&norm) || self.files.contains_key(&norm) {
            return Err(Errno::Exist);
        }
        let parent = parent_of(&norm);
        if self.files.contains_key(parent) {
            return Err(Errno::Notdir);
        }
        let Some(parent_node) = self.dirs.get_mut(parent) else {
            return Err(Errno::Noent);
        };
        parent_node.children.push(leaf_of(&norm).to_string());
        self.dirs.insert(
            norm,
            DirNode {
                children: Vec::new(),
                mode,
            },
        );
        Ok(())
    }

    /// Remove an empty directory. Never partially succeeds.
    pub fn remove_dir(&mut self, path: &str) -> Result<(), Errno> {
        let norm = normalize(path);
        if norm == ROOT {
            return Err(Errno::Inval);
        }
        if self.files.contains_key(&norm) {
            return Err(Errno::Notdir);
        }
        let Some(node) = self.dirs.get(&norm) else {
            return Err(Errno::Noent);
        };
        if !node.children.is_empty() {
            return Err(Errno::Notempty);
        }
        self.dirs.remove(&norm);
        if let Some(parent_node) = self.dirs.get_mut(parent_of(&norm)) {
            let leaf = leaf_of(&norm);
            parent_node.children.retain(|child| child != leaf);
        }
        Ok(())
    }

    /// Open a file for sequential reads.
    pub fn open_file(&mut self, path: &str) -> Result<FileFd, Errno> {
        let norm = normalize(path);
        if self.dirs.contains_key(&norm) {
            return Err(Errno::Isdir);
        }
        if !self.files.contains_key(&norm) {
            return Err(Errno::Noent);
        }
        let fd = self.next_fd;
        self.next_fd += 1;
        self.file_handles.insert(
            fd,
            FileHandle {
                path: norm,
                cursor: 0,
            },
        );
        Ok(FileFd(fd))
    }

    /// Next byte at the handle's cursor, or `None` at end of file.
    pub fn read_byte(&mut self, fd: FileFd) -> Result<Option<u8>, HandleError> {
        let handle = match self.file_handles.get_mut(&fd.0) {
            Some(handle) => handle,
            None if self.retired.contains(&fd.0) => return Err(HandleError::Closed { fd: fd.0 }),
            None => return Err(HandleError::Unknown { fd: fd.0 }),
        };
        // The surface has no unlink, so a live handle's node cannot vanish.
        let Some(node) = self.files.get(&handle.path) else {
            return Ok(None);
        };
        Ok(stream::take_byte(&node.data, &mut handle.cursor))
    }

    /// Next line at the handle's cursor (terminator included), or `None` at
    /// end of file. A final unterminated line is returned whole.
    pub fn read_line(&mut self, fd: FileFd) -> Result<Option<Vec<u8>>, HandleError> {
        let handle = match self.file_handles.get_mut(&fd.0) {
            Some(handle) => handle,
            None if self.retired.contains(&fd.0) => return Err(HandleError::Closed { fd: fd.0 }),
            None => return Err(HandleError::Unknown { fd: fd.0 }),
        };
        let Some(node) = self.files.get(&handle.path) else {
            return Ok(None);
        };
        Ok(stream::take_line(&node.data, &mut handle.cursor))
    }

    /// Close a file handle. Succeeds exactly once per handle.
    pub fn close_file(&mut self, fd: FileFd) -> Result<(), HandleError> {
        if self.file_handles.remove(&fd.0).is_some() {
            self.retired.insert(fd.0);
            return Ok(());
        }
        if self.retired.contains(&fd.0) {
            Err(HandleError::Closed { fd: fd.0 })
        } else {
            Err(HandleError::Unknown { fd: fd.0 })
        }
    }

    /// Seed a directory with the default mode. Same rules as `create_dir`.
    pub fn add_dir(&mut self, path: &str) -> Result<(), Errno> {
        self.create_dir(path, DEFAULT_DIR_MODE)
    }

    /// Seed a file under an existing parent directory.
    pub fn add_file(&mut self, path: &str, data: Vec<u8>) -> Result<(), Errno> {
        let norm = normalize(path);
        if norm == ROOT || self.dirs.contains_key(&norm) || self.files.contains_key(&norm) {
            return Err(Errno::Exist);
        }
        let parent = parent_of(&norm);
        if self.files.contains_key(parent) {
            return Err(Errno::Notdir);
        }
        let Some(parent_node) = self.dirs.get_mut(parent) else {
            return Err(Errno::Noent);
        };
        parent_node.children.push(leaf_of(&norm).to_string());
        self.files.insert(norm, FileNode { data });
        Ok(())
    }

    /// Whether a directory node exists at the path.
    pub fn is_dir(&self, path: &str) -> bool {
        self.dirs.contains_key(&normalize(path))
    }

    /// Whether a file node exists at the path.
    pub fn is_file(&self, path: &str) -> bool {
        self.files.contains_key(&normalize(path))
    }

    /// Mode recorded on a directory node, if one exists at the path.
    pub fn dir_mode(&self, path: &str) -> Option<u32> {
        self.dirs.get(&normalize(path)).map(|node| node.mode)
    }
}

/// Normalize a path to its canonical absolute form.
///
/// Relative paths resolve against the root; `.` and empty components drop;
/// `..` pops (clamped at the root); no trailing slash except on `/` itself.
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for comp in path.split('/') {
        match comp {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            name => parts.push(name),
        }
    }
    if parts.is_empty() {
        return ROOT.to_string();
    }
    let mut out = String::with_capacity(path.len() + 1);
    for part in &parts {
        out.push('/');
        out.push_str(part);
    }
    out
}

/// Parent of a normalized path. The root is its own parent.
fn parent_of(norm: &str) -> &str {
    match norm.rfind('/') {
        Some(0) | None => ROOT,
        Some(idx) => &norm[..idx],
    }
}

/// Final component of a normalized path.
fn leaf_of(norm: &str) -> &str {
    match norm.rfind('/') {
        Some(idx) => &norm[idx + 1..],
        None => norm,
    }
}
