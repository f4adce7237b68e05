// Copyright (C) Back Engineering Labs, Inc. - All Rights Reserved
//
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential

use crate::msf::PageNumber;

/// How many pages are required to store N amount of bytes?
///
/// `page_size` must be nonzero; the container rejects a zero page size
/// before any of this math runs.
pub fn pages_needed_to_store(bytes: u32, page_size: u32) -> u32 {
    bytes / page_size + u32::from(bytes % page_size != 0)
}

/// List of pages used by a stream, in stream order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageList {
    /// Size of every page in bytes.
    page_size: u32,
    /// Page numbers backing consecutive page-sized chunks.
    pages: Box<[PageNumber]>,
}

impl PageList {
    pub fn new(page_size: u32, pages: impl Into<Box<[PageNumber]>>) -> Self {
        Self {
            page_size,
            pages: pages.into(),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Return all of the page numbers in order.
    pub fn pages(&self) -> &[PageNumber] {
        &self.pages
    }

    /// Number of pages, not bytes.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Byte offset of the `i`th page in the source file.
    pub fn byte_offset(&self, i: usize) -> Option<u64> {
        let page = *self.pages.get(i)?;
        Some(u64::from(page) * u64::from(self.page_size))
    }

    /// Number of bytes covered by the whole list (always a page multiple).
    pub fn byte_capacity(&self) -> u64 {
        self.pages.len() as u64 * u64::from(self.page_size)
    }
}
