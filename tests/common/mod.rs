//! Builds synthetic MSF images for the integration tests.
//!
//! Pages are handed out in reverse order so that no stream, and not the
//! directory either, ends up on consecutive pages.

#![allow(dead_code)]

use msfident::{MAGIC, NIL_STREAM_SIZE};

pub const HEADER_PAGE_SIZE: usize = 0x20;
pub const HEADER_FREE_PAGE_MAP: usize = 0x24;
pub const HEADER_NUM_PAGES: usize = 0x28;
pub const HEADER_DIR_SIZE: usize = 0x2C;
pub const HEADER_BLOCK_MAP: usize = 0x34;

pub struct Image {
    pub bytes: Vec<u8>,
    pub page_size: u32,
    /// Contents of every stream, `None` for nil streams.
    pub streams: Vec<Option<Vec<u8>>>,
    pub stream_pages: Vec<Vec<u32>>,
    pub directory_pages: Vec<u32>,
}

impl Image {
    pub fn set_u32(&mut self, offset: usize, value: u32) {
        self.bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Rewrites the `page`th page number of `stream` inside the serialized
    /// directory.
    pub fn set_stream_page(&mut self, stream: usize, page: usize, value: u32) {
        let preceding: usize = self.stream_pages[..stream].iter().map(Vec::len).sum();
        let offset = 4 * (1 + self.streams.len() + preceding + page);
        let page_size = self.page_size as usize;
        let file_page = self.directory_pages[offset / page_size] as usize;
        self.set_u32(file_page * page_size + offset % page_size, value);
    }
}

pub struct MsfBuilder {
    page_size: u32,
    streams: Vec<Option<Vec<u8>>>,
}

fn pages_for(len: usize, page_size: u32) -> u32 {
    len.div_ceil(page_size as usize) as u32
}

impl MsfBuilder {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            streams: Vec::new(),
        }
    }

    pub fn stream(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.streams.push(Some(data.into()));
        self
    }

    pub fn nil_stream(mut self) -> Self {
        self.streams.push(None);
        self
    }

    pub fn build(self) -> Image {
        let page_size = self.page_size;
        let ps = page_size as usize;
        // Header pages plus the two free page map pages.
        let header_pages = pages_for(0x38, page_size);
        let reserved = header_pages + 2;

        let data_pages: u32 = self
            .streams
            .iter()
            .flatten()
            .map(|data| pages_for(data.len(), page_size))
            .sum();

        let mut next = 0;
        let mut stream_pages = Vec::new();
        for stream in &self.streams {
            let count = stream.as_ref().map_or(0, |data| pages_for(data.len(), page_size));
            let pages: Vec<u32> = (0..count)
                .map(|_| {
                    next += 1;
                    reserved + data_pages - next
                })
                .collect();
            stream_pages.push(pages);
        }

        let mut directory = Vec::new();
        directory.extend_from_slice(&(self.streams.len() as u32).to_le_bytes());
        for stream in &self.streams {
            let size = stream.as_ref().map_or(NIL_STREAM_SIZE, |data| data.len() as u32);
            directory.extend_from_slice(&size.to_le_bytes());
        }
        for page in stream_pages.iter().flatten() {
            directory.extend_from_slice(&page.to_le_bytes());
        }

        let dir_base = reserved + data_pages;
        let dir_page_count = pages_for(directory.len(), page_size);
        let directory_pages: Vec<u32> = (0..dir_page_count)
            .map(|i| dir_base + dir_page_count - 1 - i)
            .collect();

        let block_map = dir_base + dir_page_count;
        let block_map_pages = pages_for(directory_pages.len() * 4, page_size).max(1);
        let num_pages = block_map + block_map_pages;

        let mut bytes = vec![0u8; num_pages as usize * ps];
        bytes[..MAGIC.len()].copy_from_slice(MAGIC);

        for (data, pages) in self.streams.iter().zip(&stream_pages) {
            let Some(data) = data else { continue };
            for (chunk, page) in data.chunks(ps).zip(pages) {
                let start = *page as usize * ps;
                bytes[start..start + chunk.len()].copy_from_slice(chunk);
            }
        }
        for (chunk, page) in directory.chunks(ps).zip(&directory_pages) {
            let start = *page as usize * ps;
            bytes[start..start + chunk.len()].copy_from_slice(chunk);
        }
        let mut offset = block_map as usize * ps;
        for page in &directory_pages {
            bytes[offset..offset + 4].copy_from_slice(&page.to_le_bytes());
            offset += 4;
        }

        let mut image = Image {
            bytes,
            page_size,
            streams: self.streams,
            stream_pages,
            directory_pages,
        };
        image.set_u32(HEADER_PAGE_SIZE, page_size);
        image.set_u32(HEADER_FREE_PAGE_MAP, header_pages);
        image.set_u32(HEADER_NUM_PAGES, num_pages);
        image.set_u32(HEADER_DIR_SIZE, directory.len() as u32);
        image.set_u32(HEADER_BLOCK_MAP, block_map);
        image
    }
}

/// Deterministic, non-repeating-looking filler so that misplaced pages are
/// caught by content comparisons.
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u32).wrapping_mul(31).wrapping_add(seed as u32 * 97) as u8 ^ (i >> 8) as u8)
        .collect()
}

/// A PDB information stream: version, signature, age, GUID, followed by an
/// (empty) named stream map as written by the linker.
pub fn pdb_info_stream(signature: u32, age: i32, guid: [u8; 16]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&20000404u32.to_le_bytes());
    data.extend_from_slice(&signature.to_le_bytes());
    data.extend_from_slice(&age.to_le_bytes());
    data.extend_from_slice(&guid);
    // String buffer size, then hash table size/capacity and empty bit vectors.
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&1u32.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    // Feature code: VC140.
    data.extend_from_slice(&20140508u32.to_le_bytes());
    data
}
