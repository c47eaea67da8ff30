//! Mount layers and the resources resolved from them.

use std::sync::Arc;

use aurora_archive::{Locator, ResourceEntry, ResourceIndex, ResourceStream, ResourceType};
use bytes::Bytes;

use crate::{
    handle::{ChangeHandle, Priority},
    loose::{LooseResource, LooseSet},
};

#[derive(Debug, Clone)]
pub(crate) enum LayerContents {
    Index(Arc<ResourceIndex>),
    Loose(Arc<LooseSet>),
}

/// One entry of the manager's stack
#[derive(Debug, Clone)]
pub(crate) struct MountLayer {
    pub contents: LayerContents,
    pub priority: Priority,
    pub handle: ChangeHandle,
    pub sequence: u64,
}

impl MountLayer {
    pub fn find(&self, name: &str, resource_type: ResourceType) -> Option<Resolved> {
        let target = match &self.contents {
            LayerContents::Index(index) => {
                let i = index.find_by_name(name, resource_type)?;
                Target::Entry {
                    entry: index.entry(i).ok()?.clone(),
                    data: index.resource(i).ok()?.into_bytes(),
                }
            }
            LayerContents::Loose(set) => Target::Loose(set.find(name, resource_type)?.clone()),
        };

        Some(Resolved {
            target,
            handle: self.handle,
            priority: self.priority,
        })
    }

    /// Names of all resources of a type in this layer
    pub fn names(&self, resource_type: ResourceType) -> Vec<&str> {
        match &self.contents {
            LayerContents::Index(index) => index
                .resources()
                .iter()
                .filter(|e| e.resource_type() == resource_type)
                .map(ResourceEntry::name)
                .collect(),
            LayerContents::Loose(set) => set
                .iter()
                .filter(|r| r.resource_type() == resource_type)
                .map(LooseResource::name)
                .collect(),
        }
    }

    /// Number of resources in this layer
    pub fn len(&self) -> usize {
        match &self.contents {
            LayerContents::Index(index) => index.len(),
            LayerContents::Loose(set) => set.len(),
        }
    }

    /// Name of what this layer was mounted from, for logging
    pub fn origin(&self) -> &str {
        match &self.contents {
            LayerContents::Index(index) => index.container(),
            LayerContents::Loose(_) => "loose resources",
        }
    }
}

#[derive(Debug, Clone)]
enum Target {
    Entry { entry: ResourceEntry, data: Bytes },
    Loose(LooseResource),
}

/// A resource found by the manager, together with the mount it came from
///
/// A resolved resource stays readable after its mount has been unmounted.
#[derive(Debug, Clone)]
pub struct Resolved {
    target: Target,
    handle: ChangeHandle,
    priority: Priority,
}

impl Resolved {
    /// Name of the resource as the layer stores it
    pub fn name(&self) -> &str {
        match &self.target {
            Target::Entry { entry, .. } => entry.name(),
            Target::Loose(resource) => resource.name(),
        }
    }

    /// Type of the resource
    pub fn resource_type(&self) -> ResourceType {
        match &self.target {
            Target::Entry { entry, .. } => entry.resource_type(),
            Target::Loose(resource) => resource.resource_type(),
        }
    }

    /// Where the bytes live inside their container, `None` for loose resources
    pub fn locator(&self) -> Option<&Locator> {
        self.entry().map(ResourceEntry::locator)
    }

    /// The container entry, `None` for loose resources
    pub fn entry(&self) -> Option<&ResourceEntry> {
        match &self.target {
            Target::Entry { entry, .. } => Some(entry),
            Target::Loose(_) => None,
        }
    }

    /// Size of the resource in bytes
    pub fn size(&self) -> u64 {
        match &self.target {
            Target::Entry { entry, .. } => entry.size(),
            Target::Loose(resource) => resource.size(),
        }
    }

    /// A stream over the bytes of the resource
    pub fn open(&self) -> ResourceStream {
        match &self.target {
            Target::Entry { data, .. } => ResourceStream::new(data.clone()),
            Target::Loose(resource) => ResourceStream::new(resource.bytes()),
        }
    }

    /// Handle of the mount the resource came from
    pub fn handle(&self) -> ChangeHandle {
        self.handle
    }

    /// Priority of the mount the resource came from
    pub fn priority(&self) -> Priority {
        self.priority
    }
}
