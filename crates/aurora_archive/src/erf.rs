//! Reader for encapsulated resource files (ERF, MOD, HAK and SAV), version 1.0.
//!
//! | Offset (bytes) | Field                  | Description                                           |
//! |----------------|------------------------|-------------------------------------------------------|
//! | 0x0000         | File Type              | 4 bytes: "ERF ", "MOD ", "HAK " or "SAV "             |
//! | 0x0004         | Version                | 4 bytes: "V1.0"                                       |
//! | 0x0008         | Language Count         | 4 bytes: Number of localized descriptions             |
//! | 0x000C         | Localized String Size  | 4 bytes: Size of the localized descriptions           |
//! | 0x0010         | Entry Count            | 4 bytes: Number of resources                          |
//! | 0x0014         | Localized String Offset| 4 bytes: Offset to the localized descriptions         |
//! | 0x0018         | Key List Offset        | 4 bytes: Offset to the key list                       |
//! | 0x001C         | Resource List Offset   | 4 bytes: Offset to the resource list                  |
//! | 0x0020         | Build Year             | 4 bytes: Years since 1900                             |
//! | 0x0024         | Build Day              | 4 bytes: Days since January 1st                       |
//! | 0x0028         | Description StrRef     | 4 bytes: Talk table reference of the description      |
//! | 0x002C         | Reserved               | 116 bytes                                             |
//!
//! ### Key List
//!
//! | Offset (bytes) | Field                  | Description                                           |
//! |----------------|------------------------|-------------------------------------------------------|
//! | 0x0000         | ResRef                 | 16 bytes: Name of the resource, NUL padded            |
//! | 0x0010         | Resource ID            | 4 bytes: Position in the resource list                |
//! | 0x0014         | Resource Type          | 2 bytes: Numeric type tag                             |
//! | 0x0016         | Unused                 | 2 bytes                                               |
//!
//! ### Resource List
//!
//! | Offset (bytes) | Field                  | Description                                           |
//! |----------------|------------------------|-------------------------------------------------------|
//! | 0x0000         | Offset                 | 4 bytes: Offset to the data of the resource           |
//! | 0x0004         | Size                   | 4 bytes: Size of the data                             |

use std::io::Cursor;

use binrw::BinRead;
use bytes::Bytes;
use tracing::{debug, instrument};

use crate::{
    check_table,
    compression::CompressionMethod,
    error::{FormatError, Result},
    index::ResourceIndex,
    table_length,
    types::{decode_name, HashAlgorithm, ResourceType},
    ContainerFormat, ContainerReader,
};

const FORMAT: ContainerFormat = ContainerFormat::Erf;

const FILE_TYPES: [&[u8; 4]; 4] = [b"ERF ", b"MOD ", b"HAK ", b"SAV "];
const VERSION: &[u8; 4] = b"V1.0";

const KEY_SIZE: u64 = 24;
const RESOURCE_SIZE: u64 = 8;

pub(crate) fn is_erf(data: &[u8]) -> bool {
    data.len() >= 8 && FILE_TYPES.iter().any(|t| data[..4] == t[..]) && data[4..8] == VERSION[..]
}

/// ERF file header
#[derive(BinRead, Debug, Clone, PartialEq)]
#[br(little)]
pub struct ErfHeader {
    /// Flavour of the file, "ERF ", "MOD ", "HAK " or "SAV "
    pub file_type: [u8; 4],

    /// Format version, always "V1.0"
    pub version: [u8; 4],

    /// Number of localized descriptions
    pub language_count: u32,

    /// Size of the block of localized descriptions
    pub localized_string_size: u32,

    /// Number of resources
    pub entry_count: u32,

    /// Offset to the localized descriptions
    pub localized_string_offset: u32,

    /// Offset to the key list
    pub key_list_offset: u32,

    /// Offset to the resource list
    pub resource_list_offset: u32,

    /// Build year, counted from 1900
    pub build_year: u32,

    /// Build day, counted from January 1st
    pub build_day: u32,

    /// Talk table reference of the module description
    #[br(pad_after = 116)]
    pub description_str_ref: u32,
}

impl ErfHeader {
    /// Read and validate the header of an ERF file
    pub fn read_from(data: &[u8]) -> core::result::Result<Self, FormatError> {
        if !is_erf(data) {
            return Err(FormatError::BadSignature { format: FORMAT });
        }

        ErfHeader::read(&mut Cursor::new(data)).map_err(|source| FormatError::Truncated {
            format: FORMAT,
            what: "header",
            source,
        })
    }

    /// The flavour of the file without padding, for example `"HAK"`
    pub fn flavour(&self) -> String {
        String::from_utf8_lossy(&self.file_type).trim_end().to_owned()
    }
}

#[derive(BinRead, Debug)]
#[br(little)]
struct ErfKey {
    resref: [u8; 16],
    #[allow(dead_code)]
    resource_id: u32,
    #[br(pad_after = 2)]
    resource_type: u16,
}

#[derive(BinRead, Debug)]
#[br(little)]
struct ErfResource {
    offset: u32,
    size: u32,
}

/// Reader for ERF V1.0 files
///
/// ERF files do not hash their names.
#[derive(Debug, Copy, Clone, Default)]
pub struct ErfReader;

impl ContainerReader for ErfReader {
    fn format(&self) -> ContainerFormat {
        FORMAT
    }

    #[instrument(skip(self, data), fields(size = data.len()))]
    fn parse_named(&self, container: &str, data: Bytes) -> Result<ResourceIndex> {
        let header = ErfHeader::read_from(&data)?;
        let size = data.len() as u64;
        let count = header.entry_count as u64;

        check_table(
            FORMAT,
            "localized strings",
            header.localized_string_offset as u64,
            header.localized_string_size as u64,
            size,
        )?;

        let key_offset = header.key_list_offset as u64;
        check_table(FORMAT, "key list", key_offset, 0, size)?;
        let key_length = table_length(FORMAT, "key list", count, KEY_SIZE, size - key_offset)?;

        let resource_offset = header.resource_list_offset as u64;
        check_table(FORMAT, "resource list", resource_offset, 0, size)?;
        let resource_length = table_length(
            FORMAT,
            "resource list",
            count,
            RESOURCE_SIZE,
            size - resource_offset,
        )?;

        let mut keys = Cursor::new(&data[key_offset as usize..(key_offset + key_length) as usize]);
        let mut resources = Cursor::new(
            &data[resource_offset as usize..(resource_offset + resource_length) as usize],
        );

        let mut builder = ResourceIndex::builder(FORMAT, container, data.clone(), HashAlgorithm::None)
            .with_capacity(count as usize);
        for _ in 0..count {
            let key = ErfKey::read(&mut keys).map_err(|source| FormatError::Truncated {
                format: FORMAT,
                what: "key list",
                source,
            })?;
            let resource =
                ErfResource::read(&mut resources).map_err(|source| FormatError::Truncated {
                    format: FORMAT,
                    what: "resource list",
                    source,
                })?;

            builder.push(
                decode_name(&key.resref).to_ascii_lowercase(),
                ResourceType::from_id(key.resource_type),
                resource.offset as u64,
                resource.size as u64,
                None,
                CompressionMethod::None,
            )?;
        }

        let index = builder.finish();
        debug!(
            flavour = %header.flavour(),
            entries = index.len(),
            hash_algorithm = ?index.name_hash_algorithm(),
            "parsed {} container {}",
            FORMAT,
            container
        );
        Ok(index)
    }
}
