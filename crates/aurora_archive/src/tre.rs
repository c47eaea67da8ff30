//! Reader for **TRE** trees, version 0005.
//!
//! A TRE file consists of a header, followed by the data blocks, a metadata block for records,
//! and a name block.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: 0x54524545 ("TREE"), stored as "EERT"             |
//! | 0x0004         | Version                | 4 bytes: "0005", stored as "5000"                          |
//! | 0x0008         | Record Count           | 4 bytes: Number of records in the archive                  |
//! | 0x000C         | Record Offset          | 4 bytes: Offset to the record metadata block               |
//! | 0x0010         | Record Compression     | 4 bytes: Compression method for records                    |
//! | 0x0014         | Record Comp. Size      | 4 bytes: Compressed size of record block                   |
//! | 0x0018         | Name Compression       | 4 bytes: Compression method for names                      |
//! | 0x001C         | Name Comp. Size        | 4 bytes: Compressed size of the name block                 |
//! | 0x0020         | Name Uncomp. Size      | 4 bytes: Uncompressed size of the name block               |
//!
//! ### Record Metadata Block
//!
//! The record block directly precedes the name block. Either block may be compressed with
//! Zlib as a whole. Each record has the following structure:
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | CRC32                  | 4 bytes: CRC-32/BZIP2 checksum of the record's name     |
//! | 0x0004         | Uncompressed Size      | 4 bytes: Size of the data when uncompressed             |
//! | 0x0008         | Data Offset            | 4 bytes: Offset to the start of the record data block   |
//! | 0x000C         | Compression            | 4 bytes: Compression method for the record data         |
//! | 0x0010         | Compressed Size        | 4 bytes: Compressed size of the record data             |
//! | 0x0014         | Name Offset            | 4 bytes: Offset to the name within the name block       |
//!
//! ### Name Block
//!
//! Names are stored as NUL terminated strings. Records point at their name by offset.
//!
//! TRE trees are the only supported format with name hashes: the record checksum is used as
//! the hash of the full stored name.

use std::io::Cursor;

use binrw::BinRead;
use bytes::Bytes;
use tracing::{debug, instrument};

use crate::{
    check_table,
    compression::{read_block, CompressionMethod},
    error::{FormatError, Result},
    index::ResourceIndex,
    table_length,
    types::{decode_name, split_file_name, HashAlgorithm},
    ContainerFormat, ContainerReader,
};

const FORMAT: ContainerFormat = ContainerFormat::Tre;

const MAGIC: &[u8; 8] = b"EERT5000";

const RECORD_SIZE: u64 = 24;

pub(crate) fn is_tre(data: &[u8]) -> bool {
    data.starts_with(MAGIC)
}

/// TRE file header
///
/// Defines the header of the TRE file which always starts with "TREE" and then a version (in this case "0005").
/// All data is stored in little endian format
#[derive(BinRead, Debug, Copy, Clone, PartialEq)]
#[br(magic = b"EERT5000", little)]
pub struct TreHeader {
    /// The number of records stored in the file
    pub records: u32,

    /// The offset from the beginning of the file where the record metadata starts
    pub record_start: u32,

    /// The compression type used for compressing the record metadata block
    pub record_compression: u32,

    /// The size in the file for the compressed record metadata block
    pub record_compressed: u32,

    /// The compression type used for compressing the block of file names
    pub name_compression: u32,

    /// The size of the name block after compression
    pub name_compressed: u32,

    /// The size of the name block before compression
    pub name_uncompressed: u32,
}

impl TreHeader {
    /// Read and validate the header of a TRE file
    pub fn read_from(data: &[u8]) -> core::result::Result<Self, FormatError> {
        TreHeader::read(&mut Cursor::new(data)).map_err(|source| match source {
            binrw::Error::BadMagic { .. } => FormatError::BadSignature { format: FORMAT },
            source => FormatError::Truncated {
                format: FORMAT,
                what: "header",
                source,
            },
        })
    }

    /// How the record block was compressed
    pub fn record_compression(&self) -> core::result::Result<CompressionMethod, FormatError> {
        compression(self.record_compression, "record block")
    }

    /// How the name block was compressed
    pub fn name_compression(&self) -> core::result::Result<CompressionMethod, FormatError> {
        compression(self.name_compression, "name block")
    }
}

fn compression(id: u32, what: &'static str) -> core::result::Result<CompressionMethod, FormatError> {
    CompressionMethod::try_from(id).map_err(|id| FormatError::UnknownCompression {
        format: FORMAT,
        what,
        id,
    })
}

/// TRE file record
///
/// Defines an entry in the TRE file
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq)]
#[br(little)]
pub struct TreRecord {
    /// A [`crc::CRC_32_BZIP2`] checksum of the record's name
    pub checksum: u32,

    /// The size of the data for this record before compression
    pub data_uncompressed: u32,

    /// The offset to the data for this record from the start of the file
    pub data_offset: u32,

    /// The compression type used to compress this record's data
    pub data_compression: u32,

    /// The size of this record's data after compression
    pub data_compressed: u32,

    /// The offset from the start of the name block for this record's name
    pub name_offset: u32,
}

impl TreRecord {
    /// Number of bytes the record's data occupies in the file
    pub fn stored_size(&self) -> u32 {
        match self.data_compression {
            0 => self.data_uncompressed,
            _ => self.data_compressed,
        }
    }
}

/// Reader for TRE trees
///
/// ```no_run
/// use aurora_archive::{ContainerReader, TreReader};
///
/// fn list_tre_contents(data: Vec<u8>) -> aurora_archive::error::Result<()> {
///     let tre = TreReader.parse_named("patch_01.tre", data.into())?;
///
///     for entry in tre.resources() {
///         println!("{}.{} ({} bytes)", entry.name(), entry.resource_type(), entry.size());
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Copy, Clone, Default)]
pub struct TreReader;

impl TreReader {
    fn get_records(data: &[u8], header: &TreHeader) -> core::result::Result<Vec<TreRecord>, FormatError> {
        let start = header.record_start as u64;
        let stored = header.record_compressed as u64;
        check_table(FORMAT, "record block", start, stored, data.len() as u64)?;

        let block = read_block(
            &data[start as usize..(start + stored) as usize],
            header.record_compression()?,
            header.records as u64 * RECORD_SIZE,
        )
        .map_err(|e| FormatError::Truncated {
            format: FORMAT,
            what: "record block",
            source: e.into(),
        })?;
        table_length(
            FORMAT,
            "record block",
            header.records as u64,
            RECORD_SIZE,
            block.len() as u64,
        )?;

        let mut reader = Cursor::new(block.as_ref());
        (0..header.records)
            .map(|_| {
                TreRecord::read(&mut reader).map_err(|source| FormatError::Truncated {
                    format: FORMAT,
                    what: "record block",
                    source,
                })
            })
            .collect()
    }

    fn get_names(data: &[u8], header: &TreHeader) -> core::result::Result<Vec<u8>, FormatError> {
        let start = header.record_start as u64 + header.record_compressed as u64;
        let stored = header.name_compressed as u64;
        check_table(FORMAT, "name block", start, stored, data.len() as u64)?;

        read_block(
            &data[start as usize..(start + stored) as usize],
            header.name_compression()?,
            header.name_uncompressed as u64,
        )
        .map(|block| block.into_owned())
        .map_err(|e| FormatError::Truncated {
            format: FORMAT,
            what: "name block",
            source: e.into(),
        })
    }

    fn name_at(names: &[u8], index: usize, offset: u32) -> core::result::Result<String, FormatError> {
        let bad_offset = FormatError::BadNameOffset {
            format: FORMAT,
            index,
            offset: offset as u64,
        };
        let tail = names.get(offset as usize..).ok_or(bad_offset)?;
        if !tail.contains(&0) {
            return Err(FormatError::NameOverrun {
                format: FORMAT,
                index,
                offset: offset as u64,
            });
        }
        Ok(decode_name(tail))
    }
}

impl ContainerReader for TreReader {
    fn format(&self) -> ContainerFormat {
        FORMAT
    }

    #[instrument(skip(self, data), fields(size = data.len()))]
    fn parse_named(&self, container: &str, data: Bytes) -> Result<ResourceIndex> {
        let header = TreHeader::read_from(&data)?;
        let records = Self::get_records(&data, &header)?;
        let names = Self::get_names(&data, &header)?;

        let mut builder =
            ResourceIndex::builder(FORMAT, container, data.clone(), HashAlgorithm::Crc32Bzip2)
                .with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let file_name = Self::name_at(&names, index, record.name_offset)?;
            let (name, resource_type) = split_file_name(&file_name);

            builder.push(
                name,
                resource_type,
                record.data_offset as u64,
                record.stored_size() as u64,
                Some(record.checksum as u64),
                compression(record.data_compression, "record data")?,
            )?;
        }

        let index = builder.finish();
        debug!(
            entries = index.len(),
            hash_algorithm = ?index.name_hash_algorithm(),
            "parsed {} container {}",
            FORMAT,
            container
        );
        Ok(index)
    }
}
