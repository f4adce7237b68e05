// Copyright (C) Back Engineering Labs, Inc. - All Rights Reserved
//
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential

//! Byte sources an MSF container can be opened over.
//!
//! Everything is expressed as positioned reads so that a container never
//! needs `&mut` access to read a stream. Sources that only have a single
//! cursor go through [`SeekReader`], which makes every seek+read pair atomic.

use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    ops::Deref,
};

use memmap2::Mmap;
use parking_lot::Mutex;

/// A random-access, read-only byte source.
pub trait ReadAt {
    /// Total length of the source in bytes.
    fn len(&self) -> io::Result<u64>;

    /// Fills `buf` with the bytes starting at `offset`.
    ///
    /// Fails with [`io::ErrorKind::UnexpectedEof`] if the source ends before
    /// `buf` is full.
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()>;
}

fn eof() -> io::Error {
    io::Error::from(io::ErrorKind::UnexpectedEof)
}

impl ReadAt for [u8] {
    fn len(&self) -> io::Result<u64> {
        Ok(<[u8]>::len(self) as u64)
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let start = usize::try_from(offset).map_err(|_| eof())?;
        let end = start.checked_add(buf.len()).ok_or_else(eof)?;
        let src = self.get(start..end).ok_or_else(eof)?;
        buf.copy_from_slice(src);
        Ok(())
    }
}

impl ReadAt for Vec<u8> {
    fn len(&self) -> io::Result<u64> {
        self.as_slice().len().try_into().map_err(|_| eof())
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.as_slice().read_exact_at(offset, buf)
    }
}

impl ReadAt for Mmap {
    fn len(&self) -> io::Result<u64> {
        Ok(self.deref().len() as u64)
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.deref().read_exact_at(offset, buf)
    }
}

impl ReadAt for File {
    fn len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    #[cfg(unix)]
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        std::os::unix::fs::FileExt::read_exact_at(self, buf, offset)
    }

    #[cfg(windows)]
    fn read_exact_at(&self, mut offset: u64, mut buf: &mut [u8]) -> io::Result<()> {
        use std::os::windows::fs::FileExt;

        while !buf.is_empty() {
            match self.seek_read(buf, offset) {
                Ok(0) => return Err(eof()),
                Ok(n) => {
                    buf = &mut buf[n..];
                    offset += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    #[cfg(not(any(unix, windows)))]
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let mut file = self;
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)
    }
}

impl<T: ReadAt + ?Sized> ReadAt for &T {
    fn len(&self) -> io::Result<u64> {
        (**self).len()
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        (**self).read_exact_at(offset, buf)
    }
}

impl<T: ReadAt + ?Sized> ReadAt for Box<T> {
    fn len(&self) -> io::Result<u64> {
        (**self).len()
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        (**self).read_exact_at(offset, buf)
    }
}

/// Adapts a single-cursor reader (`Read + Seek`) into a [`ReadAt`].
///
/// The cursor is shared, so every positioned read holds the lock for the
/// whole seek+read sequence.
#[derive(Debug)]
pub struct SeekReader<R> {
    inner: Mutex<R>,
}

impl<R: Read + Seek> SeekReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

impl<R: Read + Seek> ReadAt for SeekReader<R> {
    fn len(&self) -> io::Result<u64> {
        let mut inner = self.inner.lock();
        let position = inner.stream_position()?;
        let end = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(position))?;
        Ok(end)
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let mut inner = self.inner.lock();
        inner.seek(SeekFrom::Start(offset))?;
        inner.read_exact(buf)
    }
}

/// Who is responsible for releasing a value: the holder (`Owned`) or
/// somebody else (`Borrowed`, the "leave open" case).
///
/// Dropping an `Owned` backing drops the value exactly once. A `Borrowed`
/// backing never releases anything.
#[derive(Debug)]
pub enum Backing<'s, S> {
    Owned(S),
    Borrowed(&'s S),
}

impl<'s, S> Backing<'s, S> {
    pub fn is_owned(&self) -> bool {
        matches!(self, Backing::Owned(_))
    }

    /// Gives the value back if it was owned.
    pub fn into_owned(self) -> Option<S> {
        match self {
            Backing::Owned(value) => Some(value),
            Backing::Borrowed(_) => None,
        }
    }
}

impl<S> Deref for Backing<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        match self {
            Backing::Owned(value) => value,
            Backing::Borrowed(value) => *value,
        }
    }
}

impl<S> From<S> for Backing<'_, S> {
    fn from(value: S) -> Self {
        Backing::Owned(value)
    }
}
