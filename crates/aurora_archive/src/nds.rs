//! Reader for the file system of Nintendo DS ROM images.
//!
//! | Offset (bytes) | Field                  | Description                                           |
//! |----------------|------------------------|-------------------------------------------------------|
//! | 0x0000         | Title                  | 12 bytes: ASCII game title, NUL padded                |
//! | 0x000C         | Game Code              | 4 bytes: ASCII game code                              |
//! | 0x0010         | Maker Code             | 2 bytes: ASCII maker code                             |
//! | 0x0040         | File Name Table Offset | 4 bytes: Offset to the file name table                |
//! | 0x0044         | File Name Table Length | 4 bytes: Length of the file name table                |
//! | 0x0048         | FAT Offset             | 4 bytes: Offset to the file allocation table          |
//! | 0x004C         | FAT Length             | 4 bytes: Length of the file allocation table          |
//!
//! The root directory's names start 8 bytes into the file name table. Each name is a length
//! byte followed by that many bytes, a zero length ends the list. The file allocation table
//! holds a start and an end offset for every name, in the same order.
//!
//! There is no magic number. The identification block being plain ASCII is the only signature.

use std::io::Cursor;

use binrw::BinRead;
use bytes::Bytes;
use byteorder::{LittleEndian, ReadBytesExt};
use tracing::{debug, instrument};

use crate::{
    check_table,
    compression::CompressionMethod,
    error::{FormatError, Result},
    index::ResourceIndex,
    table_length,
    types::{decode_name, split_file_name, HashAlgorithm},
    ContainerFormat, ContainerReader,
};

const FORMAT: ContainerFormat = ContainerFormat::Nds;

/// Names of the root directory start this far into the file name table
const ROOT_NAMES_START: usize = 8;

/// Size of one file allocation table entry
const FAT_ENTRY_SIZE: u64 = 8;

/// NDS ROM header, as far as the file system needs it
#[derive(BinRead, Debug, Clone, PartialEq)]
#[br(little)]
pub struct NdsHeader {
    /// Game title, NUL padded
    pub title: [u8; 12],

    /// Four letter game code
    pub game_code: [u8; 4],

    /// Two letter maker code
    pub maker_code: [u8; 2],

    /// The offset from the beginning of the file where the file name table starts
    #[br(pad_before = 0x2E)]
    pub name_table_offset: u32,

    /// The size of the file name table
    pub name_table_length: u32,

    /// The offset from the beginning of the file where the file allocation table starts
    pub fat_offset: u32,

    /// The size of the file allocation table, zero when not declared
    pub fat_length: u32,
}

impl NdsHeader {
    /// Read the header of an NDS image
    pub fn read_from(data: &[u8]) -> core::result::Result<Self, FormatError> {
        let header =
            NdsHeader::read(&mut Cursor::new(data)).map_err(|source| FormatError::Truncated {
                format: FORMAT,
                what: "header",
                source,
            })?;

        let identification = header
            .title
            .iter()
            .chain(&header.game_code)
            .chain(&header.maker_code);
        for byte in identification {
            if !byte.is_ascii() {
                return Err(FormatError::BadSignature { format: FORMAT });
            }
        }

        Ok(header)
    }

    /// Game title
    pub fn title(&self) -> String {
        decode_name(&self.title)
    }

    /// Game code
    pub fn game_code(&self) -> String {
        decode_name(&self.game_code)
    }

    /// Maker code
    pub fn maker_code(&self) -> String {
        decode_name(&self.maker_code)
    }
}

/// Reader for NDS ROM images
///
/// NDS images do not hash their names.
#[derive(Debug, Copy, Clone, Default)]
pub struct NdsReader;

impl NdsReader {
    fn read_names(table: &[u8], table_offset: u64) -> core::result::Result<Vec<String>, FormatError> {
        let mut names = Vec::new();
        let mut pos = ROOT_NAMES_START;
        while pos < table.len() {
            let length = table[pos] as usize;
            if length == 0 {
                break;
            }

            let start = pos + 1;
            let raw = table
                .get(start..start + length)
                .ok_or(FormatError::NameOverrun {
                    format: FORMAT,
                    index: names.len(),
                    offset: table_offset + pos as u64,
                })?;

            names.push(decode_name(raw));
            pos = start + length;
        }
        Ok(names)
    }
}

impl ContainerReader for NdsReader {
    fn format(&self) -> ContainerFormat {
        FORMAT
    }

    #[instrument(skip(self, data), fields(size = data.len()))]
    fn parse_named(&self, container: &str, data: Bytes) -> Result<ResourceIndex> {
        let header = NdsHeader::read_from(&data)?;
        let size = data.len() as u64;

        let fnt_offset = header.name_table_offset as u64;
        let fnt_length = header.name_table_length as u64;
        check_table(FORMAT, "file name table", fnt_offset, fnt_length, size)?;
        let names = Self::read_names(
            &data[fnt_offset as usize..(fnt_offset + fnt_length) as usize],
            fnt_offset,
        )?;

        let count = names.len() as u64;
        let fat_offset = header.fat_offset as u64;
        if header.fat_length != 0 {
            check_table(
                FORMAT,
                "file allocation table",
                fat_offset,
                header.fat_length as u64,
                size,
            )?;
            table_length(
                FORMAT,
                "file allocation table",
                count,
                FAT_ENTRY_SIZE,
                header.fat_length as u64,
            )?;
        }
        check_table(FORMAT, "file allocation table", fat_offset, 0, size)?;
        let fat_length = table_length(
            FORMAT,
            "file allocation table",
            count,
            FAT_ENTRY_SIZE,
            size - fat_offset,
        )?;
        let mut fat = &data[fat_offset as usize..(fat_offset + fat_length) as usize];

        let mut builder = ResourceIndex::builder(FORMAT, container, data.clone(), HashAlgorithm::None)
            .with_capacity(names.len());
        for (index, file_name) in names.into_iter().enumerate() {
            let mut read_offset = || {
                fat.read_u32::<LittleEndian>()
                    .map(u64::from)
                    .map_err(|e| FormatError::Truncated {
                        format: FORMAT,
                        what: "file allocation table",
                        source: e.into(),
                    })
            };
            let start = read_offset()?;
            let end = read_offset()?;
            if end < start {
                return Err(FormatError::InvalidRange {
                    format: FORMAT,
                    index,
                    start,
                    end,
                }
                .into());
            }

            let (name, resource_type) = split_file_name(&file_name);
            builder.push(
                name,
                resource_type,
                start,
                end - start,
                None,
                CompressionMethod::None,
            )?;
        }

        let index = builder.finish();
        debug!(
            title = %header.title(),
            entries = index.len(),
            hash_algorithm = ?index.name_hash_algorithm(),
            "parsed {} container {}",
            FORMAT,
            container
        );
        Ok(index)
    }
}

#[cfg(test)]
mod test {
    use bytes::Bytes;
    use pretty_assertions::assert_eq;

    use super::{NdsHeader, NdsReader};
    use crate::{
        error::{Error, FormatError},
        types::ResourceType,
        ContainerReader,
    };

    /// Build a minimal image with the given root names and data blobs
    fn image(files: &[(&str, &str)]) -> Vec<u8> {
        let mut names = vec![0u8; 8];
        for (name, _) in files {
            names.push(name.len() as u8);
            names.extend_from_slice(name.as_bytes());
        }

        let fnt_offset = 0x50u32;
        let fat_offset = fnt_offset + names.len() as u32;
        let mut data_offset = fat_offset + 8 * files.len() as u32;

        let mut out = Vec::new();
        out.extend_from_slice(b"test\0\0\0\0\0\0\0\0ABCD01");
        out.resize(0x40, 0);
        out.extend_from_slice(&fnt_offset.to_le_bytes());
        out.extend_from_slice(&(names.len() as u32).to_le_bytes());
        out.extend_from_slice(&fat_offset.to_le_bytes());
        out.extend_from_slice(&(8 * files.len() as u32).to_le_bytes());
        out.extend_from_slice(&names);
        for (_, data) in files {
            out.extend_from_slice(&data_offset.to_le_bytes());
            data_offset += data.len() as u32;
            out.extend_from_slice(&data_offset.to_le_bytes());
        }
        for (_, data) in files {
            out.extend_from_slice(data.as_bytes());
        }
        out
    }

    #[test]
    fn read_header() {
        let data = image(&[]);
        let header = NdsHeader::read_from(&data).unwrap();
        assert_eq!(header.title(), "test");
        assert_eq!(header.game_code(), "ABCD");
        assert_eq!(header.maker_code(), "01");
        assert_eq!(header.name_table_offset, 0x50);
    }

    #[test]
    fn read_empty_image() {
        let index = NdsReader.parse(Bytes::from(image(&[]))).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn read_multiple_entries() {
        let data = image(&[("Hello.TXT", "Hello World"), ("world.2da", "2DA V2.0")]);
        let index = NdsReader.parse_named("test.nds", Bytes::from(data)).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.resources()[0].name(), "hello");
        assert_eq!(index.resources()[0].resource_type(), ResourceType::Txt);
        assert_eq!(index.resources()[1].name(), "world");
        assert_eq!(index.resources()[1].resource_type(), ResourceType::TwoDa);
        assert_eq!(&*index.resources()[1].locator().container, "test.nds");
        assert_eq!(index.resource(1).unwrap().bytes().as_ref(), b"2DA V2.0");
    }

    #[test]
    fn read_non_ascii_signature() {
        let mut data = image(&[]);
        data[0] = 0xFF;
        assert!(matches!(
            NdsReader.parse(Bytes::from(data)),
            Err(Error::Format(FormatError::BadSignature { .. }))
        ));
    }

    #[test]
    fn read_truncated_header() {
        assert!(matches!(
            NdsReader.parse(Bytes::from_static(b"short")),
            Err(Error::Format(FormatError::Truncated { .. }))
        ));
    }

    #[test]
    fn read_name_table_out_of_bounds() {
        let mut data = image(&[("a.txt", "a")]);
        data[0x44..0x48].copy_from_slice(&0xFFFFu32.to_le_bytes());
        assert!(matches!(
            NdsReader.parse(Bytes::from(data)),
            Err(Error::Format(FormatError::TableOutOfBounds { .. }))
        ));
    }

    #[test]
    fn read_name_overrun() {
        let mut data = image(&[("a.txt", "a")]);
        // Claim a longer name than the table holds
        data[0x58] = 0x7F;
        assert!(matches!(
            NdsReader.parse(Bytes::from(data)),
            Err(Error::Format(FormatError::NameOverrun { index: 0, .. }))
        ));
    }

    #[test]
    fn read_fat_too_short() {
        let mut data = image(&[("a.txt", "a"), ("b.txt", "b")]);
        data[0x4C..0x50].copy_from_slice(&8u32.to_le_bytes());
        assert!(matches!(
            NdsReader.parse(Bytes::from(data)),
            Err(Error::Format(FormatError::CountOverflow { count: 2, .. }))
        ));
    }

    #[test]
    fn read_fat_out_of_bounds() {
        let mut data = image(&[("a.txt", "a")]);
        data[0x4C..0x50].copy_from_slice(&0x00FF_FFF0u32.to_le_bytes());
        assert!(matches!(
            NdsReader.parse(Bytes::from(data)),
            Err(Error::Format(FormatError::TableOutOfBounds {
                table: "file allocation table",
                ..
            }))
        ));
    }

    #[test]
    fn read_entry_past_end() {
        let mut data = image(&[("a.txt", "a")]);
        let len = data.len();
        data.truncate(len - 1);
        assert!(matches!(
            NdsReader.parse(Bytes::from(data)),
            Err(Error::Format(FormatError::EntryOutOfBounds { index: 0, .. }))
        ));
    }
}
