//! Filesystem entry types

use std::fs::Metadata;

/// Kind of a stat'ed path, as far as the crawler cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Anything that is not a directory (regular file, device, fifo, ...)
    File,
    /// Directory
    Directory,
}

impl EntryKind {
    /// Classify from metadata
    pub fn from_metadata(meta: &Metadata) -> Self {
        if meta.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        }
    }

    /// Check if this is a directory
    pub fn is_dir(&self) -> bool {
        *self == EntryKind::Directory
    }

    /// Check if this is a leaf (anything but a directory)
    pub fn is_leaf(&self) -> bool {
        !self.is_dir()
    }
}
