//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

use crate::ContainerFormat;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// The container bytes could not be parsed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] FormatError),

    /// A resource was requested by a sequence index the container does not have
    #[error(transparent)]
    #[diagnostic(transparent)]
    Index(#[from] IndexError),
}

/// Error type describing why a container could not be parsed
///
/// A format error is fatal to the one parse that produced it. Offsets are absolute
/// positions inside the container bytes.
#[derive(Error, Diagnostic, Debug)]
pub enum FormatError {
    /// the signature field does not identify the expected format
    #[error("{format} signature mismatch")]
    #[diagnostic(help("the container may be of another format, or not a container at all"))]
    BadSignature {
        /// Format that was being parsed
        format: ContainerFormat,
    },

    /// the data ended while reading a fixed-size structure
    #[error("{format} container is truncated while reading the {what}")]
    Truncated {
        /// Format that was being parsed
        format: ContainerFormat,
        /// The structure being read
        what: &'static str,
        /// Underlying reader error
        #[source]
        source: binrw::Error,
    },

    /// a table declared by the header lies outside the container
    #[error("{format} {table} at {offset:#x}+{length:#x} exceeds container of {size:#x} bytes")]
    TableOutOfBounds {
        /// Format that was being parsed
        format: ContainerFormat,
        /// Name of the table
        table: &'static str,
        /// Declared start of the table
        offset: u64,
        /// Declared length of the table
        length: u64,
        /// Total size of the container
        size: u64,
    },

    /// an entry count implies more table bytes than are available
    #[error("{format} {table} cannot hold {count} entries ({available:#x} bytes available)")]
    CountOverflow {
        /// Format that was being parsed
        format: ContainerFormat,
        /// Name of the table
        table: &'static str,
        /// Declared number of entries
        count: u64,
        /// Number of bytes actually available for the table
        available: u64,
    },

    /// an entry's data range lies outside the container
    #[error("{format} entry {index} at {offset:#x}+{length:#x} exceeds container of {size:#x} bytes")]
    EntryOutOfBounds {
        /// Format that was being parsed
        format: ContainerFormat,
        /// Sequence index of the entry
        index: usize,
        /// Declared start of the data
        offset: u64,
        /// Declared length of the data
        length: u64,
        /// Total size of the container
        size: u64,
    },

    /// an entry's data range ends before it starts
    #[error("{format} entry {index} ends at {end:#x} before it starts at {start:#x}")]
    InvalidRange {
        /// Format that was being parsed
        format: ContainerFormat,
        /// Sequence index of the entry
        index: usize,
        /// Declared start of the data
        start: u64,
        /// Declared end of the data
        end: u64,
    },

    /// an entry's name offset does not point inside the name block
    #[error("{format} entry {index} name offset {offset:#x} is outside the name block")]
    BadNameOffset {
        /// Format that was being parsed
        format: ContainerFormat,
        /// Sequence index of the entry
        index: usize,
        /// Declared name offset
        offset: u64,
    },

    /// a length-prefixed or terminated name runs past the end of its table
    #[error("{format} entry {index} name at {offset:#x} runs past the end of the name table")]
    NameOverrun {
        /// Format that was being parsed
        format: ContainerFormat,
        /// Sequence index of the entry
        index: usize,
        /// Position of the name
        offset: u64,
    },

    /// a compression method id that is not known
    #[error("{format} {what} uses unknown compression method {id}")]
    UnknownCompression {
        /// Format that was being parsed
        format: ContainerFormat,
        /// Block or entry using the method
        what: &'static str,
        /// Raw method id
        id: u32,
    },
}

/// Error raised when a sequence index does not exist in a resource index
///
/// This is a programming error on the caller's side, it is never the answer to a lookup.
#[derive(Error, Diagnostic, Debug, Clone, Copy, PartialEq, Eq)]
#[error("resource index {index} is out of range for a container with {count} entries")]
pub struct IndexError {
    /// The requested sequence index
    pub index: usize,
    /// Number of entries in the container
    pub count: usize,
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
