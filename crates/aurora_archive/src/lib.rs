//! This library reads the resource containers used by games built on BioWare's **Aurora** engine
//! and related titles.
//!
//! # Resource Containers
//!
//! A container is a single binary archive holding many named, typed resources. Every supported
//! format is parsed by a [`ContainerReader`] into a [`ResourceIndex`], which answers lookups by
//! sequence index, by name and type, and (when the container declares a hash algorithm) by name
//! hash. Resources are handed out as [`ResourceStream`]s bounded to exactly their byte range.
//!
//! | Format | Reader        | Names                       | Types              | Name hashes   |
//! |--------|---------------|-----------------------------|--------------------|---------------|
//! | NDS    | [`NdsReader`] | length prefixed             | filename extension | none          |
//! | ERF    | [`ErfReader`] | 16 bytes, NUL padded        | numeric tag        | none          |
//! | TRE    | [`TreReader`] | NUL terminated, name block  | filename extension | CRC-32/BZIP2  |
//!
//! ## Lookups
//!
//! Asking for a sequence index the container does not have is a programming error and is
//! reported as [`error::IndexError`]. Asking for a name or hash that is not present is an
//! ordinary outcome and is reported as `None`.
//!
//! ## Additional Information
//!
//! - **Endianness**: Little-endian for all multi-byte integers in every format
//! - **Compression**: entry data is handed out as stored, see [`ResourceEntry::compression`]
//!

use std::fmt;

use bytes::Bytes;

pub mod compression;
pub mod erf;
pub mod error;
pub mod index;
pub mod nds;
pub mod tre;
pub mod types;

pub use compression::CompressionMethod;
pub use erf::ErfReader;
pub use index::{ResourceIndex, ResourceStream};
pub use nds::NdsReader;
pub use tre::TreReader;
pub use types::{HashAlgorithm, Locator, ResourceEntry, ResourceType};

/// The closed set of supported container formats
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    /// Nintendo DS ROM file system
    Nds,
    /// Encapsulated resource file, version 1.0
    Erf,
    /// TRE tree, version 0005
    Tre,
}

impl ContainerFormat {
    /// Guess the format of some container bytes by their signature
    ///
    /// NDS images carry no magic number and are never detected.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if tre::is_tre(data) {
            Some(ContainerFormat::Tre)
        } else if erf::is_erf(data) {
            Some(ContainerFormat::Erf)
        } else {
            None
        }
    }

    /// Parse container bytes of this format
    pub fn parse_named(&self, container: &str, data: Bytes) -> error::Result<ResourceIndex> {
        match self {
            ContainerFormat::Nds => NdsReader.parse_named(container, data),
            ContainerFormat::Erf => ErfReader.parse_named(container, data),
            ContainerFormat::Tre => TreReader.parse_named(container, data),
        }
    }

    /// Short name of the format
    pub fn name(&self) -> &'static str {
        match self {
            ContainerFormat::Nds => "NDS",
            ContainerFormat::Erf => "ERF",
            ContainerFormat::Tre => "TRE",
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses the bytes of one container format into a [`ResourceIndex`]
pub trait ContainerReader {
    /// The format this reader understands
    fn format(&self) -> ContainerFormat;

    /// Parse a container, naming it `container` in the locators of its entries
    fn parse_named(&self, container: &str, data: Bytes) -> error::Result<ResourceIndex>;

    /// Parse a container, naming it after its format
    fn parse(&self, data: Bytes) -> error::Result<ResourceIndex> {
        self.parse_named(self.format().name(), data)
    }
}

/// Check that `offset + length` lies inside a container of `size` bytes
pub(crate) fn check_table(
    format: ContainerFormat,
    table: &'static str,
    offset: u64,
    length: u64,
    size: u64,
) -> Result<(), error::FormatError> {
    match offset.checked_add(length) {
        Some(end) if end <= size => Ok(()),
        _ => Err(error::FormatError::TableOutOfBounds {
            format,
            table,
            offset,
            length,
            size,
        }),
    }
}

/// Byte length of `count` table entries of `entry_size` bytes, if that fits in the container
pub(crate) fn table_length(
    format: ContainerFormat,
    table: &'static str,
    count: u64,
    entry_size: u64,
    available: u64,
) -> Result<u64, error::FormatError> {
    match count.checked_mul(entry_size) {
        Some(length) if length <= available => Ok(length),
        _ => Err(error::FormatError::CountOverflow {
            format,
            table,
            count,
            available,
        }),
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::{error::FormatError, table_length, ContainerFormat};

    #[test]
    fn detect_by_signature() {
        assert_eq!(
            ContainerFormat::detect(b"EERT5000\0\0\0\0"),
            Some(ContainerFormat::Tre)
        );
        assert_eq!(
            ContainerFormat::detect(b"HAK V1.0\0\0\0\0"),
            Some(ContainerFormat::Erf)
        );
        assert_eq!(ContainerFormat::detect(b"xoreos test\0"), None);
        assert_eq!(ContainerFormat::detect(b""), None);
    }

    #[test]
    fn table_length_overflow() {
        assert_eq!(
            table_length(ContainerFormat::Erf, "keys", 2, 24, 48).unwrap(),
            48
        );
        assert!(matches!(
            table_length(ContainerFormat::Erf, "keys", u64::MAX, 24, 48),
            Err(FormatError::CountOverflow { .. })
        ));
        assert!(matches!(
            table_length(ContainerFormat::Erf, "keys", 3, 24, 48),
            Err(FormatError::CountOverflow { count: 3, .. })
        ));
    }
}
