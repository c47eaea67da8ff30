//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

use crate::handle::ChangeHandle;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// the change handle is not mounted, it may already have been unmounted
    #[error("change handle {0} is not mounted")]
    #[diagnostic(help("a handle can be unmounted only once"))]
    UnknownChangeHandle(ChangeHandle),

    /// Transparent wrapper for [`aurora_archive::error::Error`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    Archive(#[from] aurora_archive::error::Error),

    /// no container format recognised the signature of {container}
    #[error("{container} is not a recognised resource container")]
    #[diagnostic(help(
        "NDS images carry no signature, parse them with `NdsReader` and mount the index"
    ))]
    UnrecognizedContainer {
        /// Identifier of the container
        container: String,
    },
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
