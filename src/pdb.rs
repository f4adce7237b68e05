// Copyright (C) Back Engineering Labs, Inc. - All Rights Reserved
//
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential
// Read: https://llvm.org/docs/PDB/PdbStream.html

use std::fmt;

use debugid::DebugId;
use static_assertions::const_assert;
use uuid::Uuid;

use crate::{
    error::{FormatError, Result},
    msf::MsfContainer,
    source::{Backing, ReadAt},
    struct_overlay,
};

/// Stream index of the PDB information stream.
pub const PDB_STREAM_INDEX: usize = 1;

// https://llvm.org/docs/PDB/PdbStream.html#stream-header
struct_overlay!(pub PdbStreamHeader {
    // One of the PdbStreamVersion values, VC70 (20000404) for anything modern.
    [0x00] version: u32,
    // Seconds since 1970 when the PDB was written. Not used for matching.
    [0x04] signature: u32,
    // Incremented every time the PDB is written.
    [0x08] age: i32,
    // Matches the GUID in the image's CodeView debug directory entry.
    [0x0C] guid: [u8; 16],
});
const_assert!(PdbStreamHeader::size() == 28);

impl PdbStreamHeader<'_> {
    /// The GUID in the Windows layout: the first three fields are little-endian.
    pub fn identifier(&self) -> Uuid {
        Uuid::from_bytes_le(self.get_guid())
    }
}

/// Identity of a PDB, used to match it against the image it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PdbMetadata {
    pub identifier: Uuid,
    pub age: i32,
}

impl PdbMetadata {
    /// GUID and age combined into a single debug identifier.
    pub fn debug_id(&self) -> DebugId {
        DebugId::from_parts(self.identifier, self.age as u32)
    }

    /// Key used by symbol servers: the GUID as 32 uppercase hex digits
    /// directly followed by the age in uppercase hex.
    pub fn symbol_server_key(&self) -> String {
        format!("{:X}{:X}", self.identifier.simple(), self.age as u32)
    }
}

impl fmt::Display for PdbMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (age {})", self.identifier.hyphenated(), self.age)
    }
}

/// Reads the identity out of the PDB information stream of `container`.
pub fn read_identity<S: ReadAt>(container: &MsfContainer<'_, S>) -> Result<PdbMetadata> {
    let mut prefix = [0u8; PdbStreamHeader::size()];
    let len = container.read_stream_prefix(PDB_STREAM_INDEX, &mut prefix)?;
    // A short prefix means the whole stream was read.
    let header = PdbStreamHeader::new(&prefix[..len]).ok_or(FormatError::TooShort(len))?;
    let metadata = PdbMetadata {
        identifier: header.identifier(),
        age: header.get_age(),
    };

    tracing::trace!(
        version = header.get_version(),
        identifier = %metadata.identifier,
        age = metadata.age,
        "decoded PDB identity"
    );
    Ok(metadata)
}

/// Extracts [`PdbMetadata`] from an MSF container it either owns or borrows.
#[derive(Debug)]
pub struct PdbIdentityReader<'c, 's, S> {
    container: Backing<'c, MsfContainer<'s, S>>,
}

impl<'c, 's, S: ReadAt> PdbIdentityReader<'c, 's, S> {
    /// Takes ownership of `container`.
    pub fn new(container: MsfContainer<'s, S>) -> Self {
        Self {
            container: Backing::Owned(container),
        }
    }

    /// Leaves `container` with the caller.
    pub fn borrowed(container: &'c MsfContainer<'s, S>) -> Self {
        Self {
            container: Backing::Borrowed(container),
        }
    }

    pub fn container(&self) -> &MsfContainer<'s, S> {
        &self.container
    }

    pub fn read_identity(&self) -> Result<PdbMetadata> {
        read_identity(self.container())
    }

    /// Gives the container back if this reader owned it.
    pub fn into_container(self) -> Option<MsfContainer<'s, S>> {
        self.container.into_owned()
    }
}
