// Copyright (C) Back Engineering Labs, Inc. - All Rights Reserved
//
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential

use std::io;

use scroll::{Pread, LE};
use static_assertions::const_assert;

use crate::{
    directory::{StreamDescriptor, StreamDirectory},
    error::{FormatError, Result},
    offset_struct,
    pagelist::{pages_needed_to_store, PageList},
    source::{Backing, ReadAt},
};

/// Magic bytes of the PDB file format 7.0
pub const MAGIC: &[u8; 32] = b"Microsoft C/C++ MSF 7.00\r\n\x1a\x44\x53\x00\x00\x00";
pub type PageNumber = u32;

// https://llvm.org/docs/PDB/MsfFile.html
// struct SuperBlock {
//     char FileMagic[sizeof(Magic)];
//     ulittle32_t BlockSize;
//     ulittle32_t FreeBlockMapBlock;
//     ulittle32_t NumBlocks;
//     ulittle32_t NumDirectoryBytes;
//     ulittle32_t Unknown;
//     ulittle32_t BlockMapAddr;
// };
offset_struct!(pub MsfHeader {
    // Must be equal to "Microsoft C / C++ MSF 7.00\\r\\n" followed by the bytes 1A 44 53 00 00 00.
    [0x00] magic: [u8; 32],
    // The page size of the internal file system. Writers use 512, 1024, 2048 or 4096.
    [0x20] page_size: u32,
    // Page holding the free page bitmap. Kept, not interpreted.
    [0x24] free_page_map: u32,
    // The total number of pages in the file. NumPages * PageSize must equal the size of the file.
    [0x28] num_pages: u32,
    // The size of the stream directory, in bytes.
    [0x2C] stream_dir_size: u32,
    [0x30] unknown: u32,
    // The index of a page holding an array of page numbers, listing the pages the stream
    // directory resides on. The directory may not fit on a single page, hence the extra layer
    // of indirection. The array holds ceil(NumDirectoryBytes / PageSize) entries.
    [0x34] stream_block_map: u32,
});

const_assert!(MsfHeader::size() == 0x38);

impl MsfHeader {
    /// Checks whether `bytes` starts with the MSF 7.00 signature, without
    /// parsing anything else.
    pub fn peek(bytes: &[u8]) -> bool {
        bytes.starts_with(MAGIC)
    }

    /// How many pages are required to store N amount of bytes?
    pub fn pages_needed_to_store(&self, bytes: u32) -> u32 {
        pages_needed_to_store(bytes, self.get_page_size())
    }
}

/// A read-only, fully indexed MSF container.
///
/// The whole stream map is decoded by [`MsfContainer::open`]; after that the
/// container never changes. Stream contents are not cached, every
/// [`MsfContainer::read_stream`] goes back to the source.
#[derive(Debug)]
pub struct MsfContainer<'s, S> {
    source: Backing<'s, S>,
    header: MsfHeader,
    /// Pages used by the stream directory.
    directory_pages: PageList,
    streams: Vec<StreamDescriptor>,
}

impl<'s, S: ReadAt> MsfContainer<'s, S> {
    /// Opens a container that owns `source` and releases it when dropped.
    pub fn open(source: S) -> Result<Self> {
        Self::with_backing(Backing::Owned(source))
    }

    /// Opens a container over a source that stays owned by the caller.
    pub fn open_borrowed(source: &'s S) -> Result<Self> {
        Self::with_backing(Backing::Borrowed(source))
    }

    /// Validates the header and decodes the root directory.
    pub fn with_backing(source: Backing<'s, S>) -> Result<Self> {
        let mut raw = [0u8; MsfHeader::size()];
        // A file too short to hold the signature is not an MSF file at all.
        source
            .read_exact_at(0, &mut raw[..MAGIC.len()])
            .map_err(|e| match e.kind() {
                io::ErrorKind::UnexpectedEof => FormatError::BadMagic,
                _ => FormatError::Io(e),
            })?;
        if !MsfHeader::peek(&raw) {
            return Err(FormatError::BadMagic);
        }
        source.read_exact_at(MAGIC.len() as u64, &mut raw[MAGIC.len()..])?;
        let header = MsfHeader::from_bytes(raw);

        let page_size = header.get_page_size();
        if page_size == 0 {
            return Err(FormatError::BadMagic);
        }

        let actual = ReadAt::len(&*source)?;
        let expected = u64::from(header.get_num_pages()) * u64::from(page_size);
        if actual != expected {
            return Err(FormatError::SizeMismatch { expected, actual });
        }

        // Nothing the directory describes can be larger than the file.
        let dir_size = header.get_stream_dir_size();
        if u64::from(dir_size) > actual {
            return Err(FormatError::Truncated);
        }

        // Get the page that contains page numbers for each page that the
        // stream directory uses. (Yes the stream directory might need multiple pages.)
        let num_dir_pages = header.pages_needed_to_store(dir_size) as usize;
        let mut block_map = alloc_zeroed(num_dir_pages * 4)?;
        let block_map_offset = u64::from(header.get_stream_block_map()) * u64::from(page_size);
        source.read_exact_at(block_map_offset, &mut block_map)?;

        let mut offset = 0;
        let mut pages = Vec::with_capacity(num_dir_pages);
        for _ in 0..num_dir_pages {
            pages.push(block_map.gread_with::<PageNumber>(&mut offset, LE)?);
        }
        let directory_pages = PageList::new(page_size, pages);

        // The directory is itself a stream: stitch its pages together and
        // only then decode it.
        let mut directory_bytes = alloc_zeroed(dir_size as usize)?;
        read_pages(&*source, &directory_pages, &mut directory_bytes)?;
        let directory = StreamDirectory::parse(&directory_bytes, page_size)?;

        tracing::debug!(
            page_size,
            num_pages = header.get_num_pages(),
            directory_pages = directory_pages.len(),
            streams = directory.streams.len(),
            "opened MSF container"
        );

        Ok(Self {
            source,
            header,
            directory_pages,
            streams: directory.streams,
        })
    }

    /// Reads the whole stream `index` into `destination`.
    ///
    /// Returns the logical length of the stream. Whole pages are copied as
    /// long as `destination` has room, so bytes past the returned length may
    /// be overwritten with the unused tail of the last page. On error the
    /// contents of `destination` are unspecified.
    pub fn read_stream(&self, index: usize, destination: &mut [u8]) -> Result<usize> {
        let stream = self.stream(index).ok_or(FormatError::NoSuchStream(index))?;
        let required = stream.byte_length() as usize;
        if destination.len() < required {
            return Err(FormatError::BufferTooSmall {
                required,
                provided: destination.len(),
            });
        }

        let capacity = usize::try_from(stream.pages().byte_capacity()).unwrap_or(usize::MAX);
        let len = destination.len().min(capacity);
        read_pages(&*self.source, stream.pages(), &mut destination[..len])?;

        tracing::trace!(index, bytes = required, "read stream");
        Ok(required)
    }

    /// Reads the first bytes of stream `index`, at most `destination.len()`
    /// of them, touching only the pages that cover them.
    ///
    /// Returns the number of bytes copied, which is short only when the
    /// stream itself is.
    pub fn read_stream_prefix(&self, index: usize, destination: &mut [u8]) -> Result<usize> {
        let stream = self.stream(index).ok_or(FormatError::NoSuchStream(index))?;
        let len = destination.len().min(stream.byte_length() as usize);
        read_pages(&*self.source, stream.pages(), &mut destination[..len])?;

        tracing::trace!(index, bytes = len, "read stream prefix");
        Ok(len)
    }

    /// Reads stream `index` into a new buffer of exactly its logical length.
    pub fn read_stream_to_vec(&self, index: usize) -> Result<Vec<u8>> {
        let stream = self.stream(index).ok_or(FormatError::NoSuchStream(index))?;
        let mut bytes = alloc_zeroed(stream.byte_length() as usize)?;
        self.read_stream(index, &mut bytes)?;
        Ok(bytes)
    }

    /// Releases the container. The source is handed back if the container
    /// owned it; a borrowed source is simply left alone.
    pub fn close(self) -> Option<S> {
        self.source.into_owned()
    }
}

impl<S> MsfContainer<'_, S> {
    pub fn header(&self) -> &MsfHeader {
        &self.header
    }

    pub fn page_size(&self) -> u32 {
        self.header.get_page_size()
    }

    pub fn page_count(&self) -> u32 {
        self.header.get_num_pages()
    }

    pub fn free_page_map_page_index(&self) -> u32 {
        self.header.get_free_page_map()
    }

    pub fn root_directory_byte_size(&self) -> u32 {
        self.header.get_stream_dir_size()
    }

    pub fn page_map_page_index(&self) -> u32 {
        self.header.get_stream_block_map()
    }

    pub fn root_directory_page_indices(&self) -> &[PageNumber] {
        self.directory_pages.pages()
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    pub fn streams(&self) -> &[StreamDescriptor] {
        &self.streams
    }

    pub fn stream(&self, index: usize) -> Option<&StreamDescriptor> {
        self.streams.get(index)
    }

    /// Whether dropping the container also drops the source.
    pub fn owns_source(&self) -> bool {
        self.source.is_owned()
    }
}

/// Copies consecutive pages of `pages` into `destination`, one page-sized
/// chunk per page. The final chunk may be shorter than a page.
fn read_pages<S: ReadAt + ?Sized>(
    source: &S,
    pages: &PageList,
    destination: &mut [u8],
) -> Result<()> {
    for (i, chunk) in destination
        .chunks_mut(pages.page_size() as usize)
        .enumerate()
    {
        let offset = pages.byte_offset(i).ok_or(FormatError::Truncated)?;
        source.read_exact_at(offset, chunk)?;
    }
    Ok(())
}

fn alloc_zeroed(len: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(len)
        .map_err(|_| FormatError::Truncated)?;
    bytes.resize(len, 0);
    Ok(bytes)
}
