//! The binary reader capability: `read_i32` + `seek`, realized over either direct file I/O or
//! the paged cache. Two variants of one small capability, as a tagged sum rather than an object
//! hierarchy (§9 design notes).
//!
//! A reader is single-threaded and cheap to construct; each concurrent lookup task builds its
//! own.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use crate::cache::PagedCache;
use crate::error::DiacError;

#[derive(Clone, Copy, Debug)]
pub enum Whence {
    Begin,
    Current,
    End,
}

/// Either a plain file handle, or a cursor into the shared paged cache.
pub enum BinaryReader {
    Stream(File),
    Cached { cache: Arc<PagedCache>, cursor: u64 },
}

impl BinaryReader {
    pub fn open_stream(path: impl AsRef<Path>) -> Result<Self, DiacError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DiacError::Model {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::Stream(file))
    }

    pub fn cached(cache: Arc<PagedCache>) -> Self {
        Self::Cached { cache, cursor: 0 }
    }

    /// Reads one little-endian `i32`, advancing the cursor by 4 bytes.
    pub fn read_i32(&mut self) -> std::io::Result<i32> {
        let mut buf = [0u8; 4];
        match self {
            BinaryReader::Stream(file) => {
                file.read_exact(&mut buf)?;
            }
            BinaryReader::Cached { cache, cursor } => {
                cache.read(&mut buf, 4, *cursor);
                *cursor += 4;
            }
        }
        Ok(i32::from_le_bytes(buf))
    }

    pub fn seek(&mut self, offset: i64, whence: Whence) -> std::io::Result<()> {
        match self {
            BinaryReader::Stream(file) => {
                let pos = match whence {
                    Whence::Begin => SeekFrom::Start(offset as u64),
                    Whence::Current => SeekFrom::Current(offset),
                    Whence::End => SeekFrom::End(offset),
                };
                file.seek(pos)?;
            }
            BinaryReader::Cached { cache, cursor } => {
                *cursor = match whence {
                    Whence::Begin => offset as u64,
                    Whence::Current => cursor.wrapping_add_signed(offset),
                    Whence::End => cache.size().wrapping_add_signed(offset),
                };
            }
        }
        Ok(())
    }
}
