// Copyright (C) Back Engineering Labs, Inc. - All Rights Reserved
//
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential

use scroll::{Pread, LE};

use crate::{
    error::{FormatError, Result},
    msf::PageNumber,
    pagelist::{pages_needed_to_store, PageList},
};

/// Stream size used by writers for streams that were deleted or never
/// written. Such a stream owns no pages.
pub const NIL_STREAM_SIZE: u32 = u32::MAX;

/// Abstraction of the stream itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    /// Byte size of stream, exactly as stored in the directory.
    size: u32,
    /// Pages used by this stream.
    pages: PageList,
}

impl StreamDescriptor {
    pub fn new(size: u32, pages: PageList) -> Self {
        Self { size, pages }
    }

    /// Logical length of the stream. Nil streams are empty.
    pub fn byte_length(&self) -> u32 {
        if self.is_nil() {
            0
        } else {
            self.size
        }
    }

    pub fn is_nil(&self) -> bool {
        self.size == NIL_STREAM_SIZE
    }

    pub fn pages(&self) -> &PageList {
        &self.pages
    }
}

/// The decoded root directory: every stream of the container, in index
/// order.
#[derive(Debug, Default, Clone)]
pub struct StreamDirectory {
    pub streams: Vec<StreamDescriptor>,
}

// https://llvm.org/docs/PDB/MsfFile.html#the-stream-directory
// struct StreamDirectory {
//     ulittle32_t NumStreams;
//     ulittle32_t StreamSizes[NumStreams];
//     ulittle32_t StreamBlocks[NumStreams][];
// };
impl StreamDirectory {
    /// Decode the stream map out of the (already stitched together) root
    /// directory bytes.
    pub fn parse(bytes: &[u8], page_size: u32) -> Result<Self> {
        let mut offset = 0;
        let stream_count = bytes.gread_with::<u32>(&mut offset, LE)? as usize;

        // Every count below is checked against what is actually left in the
        // directory before anything is allocated.
        let mut sizes = Vec::new();
        reserve_for_u32s(&mut sizes, stream_count, bytes.len() - offset)?;
        for _ in 0..stream_count {
            sizes.push(bytes.gread_with::<u32>(&mut offset, LE)?);
        }

        let mut streams = Vec::new();
        streams
            .try_reserve_exact(stream_count)
            .map_err(|_| FormatError::Truncated)?;
        for size in sizes {
            let num_pages = if size == NIL_STREAM_SIZE {
                0
            } else {
                pages_needed_to_store(size, page_size) as usize
            };
            let mut pages: Vec<PageNumber> = Vec::new();
            reserve_for_u32s(&mut pages, num_pages, bytes.len() - offset)?;
            for _ in 0..num_pages {
                pages.push(bytes.gread_with::<u32>(&mut offset, LE)?);
            }
            streams.push(StreamDescriptor::new(size, PageList::new(page_size, pages)));
        }

        Ok(Self { streams })
    }
}

fn reserve_for_u32s(vec: &mut Vec<u32>, count: usize, remaining: usize) -> Result<()> {
    if count > remaining / 4 {
        return Err(FormatError::Truncated);
    }
    vec.try_reserve_exact(count).map_err(|_| FormatError::Truncated)
}
