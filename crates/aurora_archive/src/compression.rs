//! Block compression handling.
//!
//! Entry data is never decompressed by this crate, only table blocks that have to be read
//! in order to build an index.

use std::{borrow::Cow, fmt, io::Read};

use flate2::read::ZlibDecoder;
use tracing::instrument;

/// Identifies the storage format used to compress a block inside a container
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum CompressionMethod {
    /// Stores the data as it is
    #[default]
    None,

    /// Data compressed using Zlib
    Zlib,
}

impl TryFrom<u32> for CompressionMethod {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CompressionMethod::None),
            2 => Ok(CompressionMethod::Zlib),
            other => Err(other),
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionMethod::None => f.write_str("none"),
            CompressionMethod::Zlib => f.write_str("zlib"),
        }
    }
}

/// Get the plain contents of a stored table block
///
/// Uncompressed blocks are borrowed as they are. Compressed blocks are inflated, reading at
/// most `limit` bytes of output.
#[instrument(skip(block), fields(stored = block.len()), err)]
pub(crate) fn read_block(
    block: &[u8],
    compression: CompressionMethod,
    limit: u64,
) -> std::io::Result<Cow<'_, [u8]>> {
    match compression {
        CompressionMethod::None => Ok(Cow::Borrowed(block)),
        CompressionMethod::Zlib => {
            let mut out = Vec::new();
            ZlibDecoder::new(block).take(limit).read_to_end(&mut out)?;
            Ok(Cow::Owned(out))
        }
    }
}
