//! Paged file cache: amortizes random 16-byte reads into the trigram model over a page-aligned,
//! lazily-populated, never-evicted cache.
//!
//! A user-space surrogate for memory mapping, portable across platforms and usable from many
//! concurrent readers. Pages are loaded under an exclusive lock on miss; lookups take only a
//! shared lock, matching §4.1 of the design.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::error::DiacError;

pub const DEFAULT_PAGE_SIZE: usize = 4 * 1024 * 1024;

fn is_power_of_two(n: usize) -> bool {
    n != 0 && (n & (n - 1)) == 0
}

pub struct PagedCache {
    path: PathBuf,
    page_size: usize,
    file_size: u64,
    pages: RwLock<HashMap<u64, Arc<[u8]>>>,
}

impl PagedCache {
    /// Opens `path` for paged random access. `page_size` MUST be a power of two.
    pub fn open(path: impl AsRef<Path>, page_size: usize) -> Result<Self, DiacError> {
        assert!(is_power_of_two(page_size), "page size must be a power of two");

        let path = path.as_ref().to_path_buf();
        let file_size = std::fs::metadata(&path)
            .map_err(|source| DiacError::Model {
                path: path.clone(),
                source,
            })?
            .len();

        Ok(Self {
            path,
            page_size,
            file_size,
            pages: RwLock::new(HashMap::new()),
        })
    }

    pub fn size(&self) -> u64 {
        self.file_size
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Eagerly materializes every page of the file. Optional warm-up; never required for
    /// correctness.
    pub fn load_all_pages(&self) {
        let page_count = self.file_size.div_ceil(self.page_size as u64);
        debug!(page_count, "warming paged cache");

        let progress = indicatif::ProgressBar::new(page_count);
        progress.set_style(
            indicatif::ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} pages")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar()),
        );

        let mut offset = 0u64;
        while offset < self.file_size {
            self.materialize_page(offset);
            offset += self.page_size as u64;
            progress.inc(1);
        }
        progress.finish_and_clear();
    }

    /// Copies `count` bytes starting at absolute `offset` into `dst`, spanning pages as needed.
    ///
    /// Every materialized page is exactly `page_size` bytes (short reads near EOF are
    /// zero-padded when the page is loaded), so a read never runs short here.
    pub fn read(&self, dst: &mut [u8], count: usize, offset: u64) {
        let mut remaining = count;
        let mut src_offset = offset;
        let mut dst_pos = 0usize;

        while remaining > 0 {
            let page_offset = (src_offset / self.page_size as u64) * self.page_size as u64;
            let page = self.page_for(page_offset);

            let within_page = (src_offset - page_offset) as usize;
            let n = remaining.min(self.page_size - within_page);

            dst[dst_pos..dst_pos + n].copy_from_slice(&page[within_page..within_page + n]);

            remaining -= n;
            dst_pos += n;
            src_offset += n as u64;
        }
    }

    fn page_for(&self, page_offset: u64) -> Arc<[u8]> {
        if let Some(page) = self.pages.read().get(&page_offset) {
            trace!(page_offset, "paged cache hit");
            return Arc::clone(page);
        }

        let page = self.materialize_page(page_offset);
        page
    }

    fn materialize_page(&self, page_offset: u64) -> Arc<[u8]> {
        let mut write_guard = self.pages.write();
        if let Some(page) = write_guard.get(&page_offset) {
            return Arc::clone(page);
        }

        let page: Arc<[u8]> = self.load_page_from_disk(page_offset).into();
        write_guard.insert(page_offset, Arc::clone(&page));
        page
    }

    fn load_page_from_disk(&self, page_offset: u64) -> Vec<u8> {
        let mut buf = vec![0u8; self.page_size];

        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "model file unavailable while paging; returning zero-filled page");
                return buf;
            }
        };

        if file.seek(SeekFrom::Start(page_offset)).is_err() {
            return buf;
        }

        // A short read (final partial page) is fine; the rest of `buf` stays zero-filled.
        let _ = file.read(&mut buf);
        buf
    }
}
