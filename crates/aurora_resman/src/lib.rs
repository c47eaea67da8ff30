//! A layered, change-tracked resource manager over Aurora engine resource containers.
//!
//! # Mounting
//!
//! Containers parsed by [`aurora_archive`] are mounted into a [`ResourceManager`] together with
//! a [`Priority`]. Resources supplied directly, without a container, are mounted as
//! [`LooseResource`]s. Every mount returns a [`ChangeHandle`] that removes exactly what the
//! mount added when it is unmounted.
//!
//! | Operation                                  | Lock  | Result                         |
//! |--------------------------------------------|-------|--------------------------------|
//! | [`ResourceManager::mount`]                 | write | [`ChangeHandle`]               |
//! | [`ResourceManager::mount_container`]       | write | [`ChangeHandle`] or an error   |
//! | [`ResourceManager::unmount`]               | write | error for unknown handles      |
//! | [`ResourceManager::resolve`]               | read  | [`Resolved`] or `None`         |
//! | [`ResourceManager::get_resource`]          | read  | a stream or `None`             |
//! | [`ResourceManager::get_resource_size`]     | read  | a size or `None`               |
//!
//! ## Resolution
//!
//! Lookups are by name, ignoring case, and type. Layers are searched from the highest priority
//! down, and within a priority from the latest mount back. The first match wins and shadows
//! every match below it.
//!
//! ## Corrections
//!
//! Single assets known to declare wrong data are fixed through explicit [`CorrectionTable`]s,
//! see [`corrections`].
//!

pub mod corrections;
pub mod error;
pub mod handle;
mod layer;
pub mod loose;
pub mod manager;
pub mod source;

pub use corrections::{CorrectionTable, WidgetKind};
pub use handle::{ChangeHandle, Priority};
pub use layer::Resolved;
pub use loose::{ByteProvider, LooseResource};
pub use manager::{ResourceManager, ResourceManagerOptions};
pub use source::MountSource;
