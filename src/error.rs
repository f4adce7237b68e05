// Copyright (C) Back Engineering Labs, Inc. - All Rights Reserved
//
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential

use std::io;

use thiserror::Error;

/// Everything that can go wrong while opening an MSF container or decoding
/// data out of it. None of these are retried; each one ends the current
/// operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FormatError {
    /// The signature does not match, or a header field is structurally
    /// invalid (a page size of zero).
    #[error("not an MSF 7.00 container")]
    BadMagic,
    /// `page_count * page_size` disagrees with the length of the source.
    #[error("page geometry describes {expected} bytes but the source holds {actual}")]
    SizeMismatch { expected: u64, actual: u64 },
    /// Fewer bytes were available than a decode step needed.
    #[error("unexpected end of data")]
    Truncated,
    /// The stream index is past the end of the stream map.
    #[error("stream {0} does not exist")]
    NoSuchStream(usize),
    /// The destination cannot hold the whole stream.
    #[error("stream needs {required} bytes but the buffer holds {provided}")]
    BufferTooSmall { required: usize, provided: usize },
    /// The PDB information stream is too short to carry an identity.
    #[error("PDB information stream is only {0} bytes long")]
    TooShort(usize),
    /// The byte source failed for a reason other than running out of data.
    #[error("failed to read from source")]
    Io(#[source] io::Error),
}

impl From<io::Error> for FormatError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::UnexpectedEof => FormatError::Truncated,
            _ => FormatError::Io(error),
        }
    }
}

impl From<scroll::Error> for FormatError {
    fn from(error: scroll::Error) -> Self {
        match error {
            scroll::Error::IO(error) => error.into(),
            _ => FormatError::Truncated,
        }
    }
}

pub type Result<T, E = FormatError> = std::result::Result<T, E>;
