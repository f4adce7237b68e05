// Copyright (C) Back Engineering Labs, Inc. - All Rights Reserved
//
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential

//! Read-only access to Microsoft MSF containers (the page based format PDB
//! files are stored in) and extraction of the PDB identity (GUID + age) used
//! to match a PDB against its image.
//!
//! ```no_run
//! use msfident::{MsfContainer, PdbIdentityReader};
//!
//! let file = std::fs::File::open("HelloWorld.pdb")?;
//! let container = MsfContainer::open(file)?;
//! let identity = PdbIdentityReader::new(container).read_identity()?;
//! println!("{}", identity.symbol_server_key());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod overlays;

pub mod directory;
pub mod error;
pub mod msf;
pub mod pagelist;
pub mod pdb;
pub mod source;

pub use crate::{
    directory::{StreamDescriptor, NIL_STREAM_SIZE},
    error::{FormatError, Result},
    msf::{MsfContainer, MsfHeader, PageNumber, MAGIC},
    pagelist::PageList,
    pdb::{read_identity, PdbIdentityReader, PdbMetadata, PDB_STREAM_INDEX},
    source::{Backing, ReadAt, SeekReader},
};
