//! Resources supplied directly to the manager instead of through a container.

use std::{fmt, sync::Arc};

use aurora_archive::ResourceType;
use bytes::Bytes;
use indexmap::IndexMap;

/// Supplies the bytes of a loose resource on demand
///
/// Providers are called every time the resource is opened, outside of any lock held by the
/// manager. They work on data that is already in memory.
pub trait ByteProvider: Send + Sync {
    /// The full contents of the resource
    fn bytes(&self) -> Bytes;

    /// Size of the resource in bytes
    fn size(&self) -> u64 {
        self.bytes().len() as u64
    }
}

impl ByteProvider for Bytes {
    fn bytes(&self) -> Bytes {
        self.clone()
    }

    fn size(&self) -> u64 {
        self.len() as u64
    }
}

impl ByteProvider for &'static [u8] {
    fn bytes(&self) -> Bytes {
        Bytes::from_static(self)
    }

    fn size(&self) -> u64 {
        self.len() as u64
    }
}

/// A provider generating its bytes with a function, for resources built at runtime
pub struct Generated<F>(pub F);

impl<F> ByteProvider for Generated<F>
where
    F: Fn() -> Bytes + Send + Sync,
{
    fn bytes(&self) -> Bytes {
        (self.0)()
    }
}

/// A named, typed resource backed by a [`ByteProvider`]
#[derive(Clone)]
pub struct LooseResource {
    name: Box<str>,
    resource_type: ResourceType,
    provider: Arc<dyn ByteProvider>,
}

impl LooseResource {
    /// A loose resource holding fixed bytes
    pub fn new(name: &str, resource_type: ResourceType, data: impl Into<Bytes>) -> Self {
        Self::with_provider(name, resource_type, data.into())
    }

    /// A loose resource whose bytes come from `provider`
    pub fn with_provider(
        name: &str,
        resource_type: ResourceType,
        provider: impl ByteProvider + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            resource_type,
            provider: Arc::new(provider),
        }
    }

    /// A loose resource generated by calling `generate` whenever it is opened
    pub fn generated<F>(name: &str, resource_type: ResourceType, generate: F) -> Self
    where
        F: Fn() -> Bytes + Send + Sync + 'static,
    {
        Self::with_provider(name, resource_type, Generated(generate))
    }

    /// Name of the resource
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type of the resource
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Size of the resource in bytes
    pub fn size(&self) -> u64 {
        self.provider.size()
    }

    /// The full contents of the resource
    pub fn bytes(&self) -> Bytes {
        self.provider.bytes()
    }
}

impl fmt::Debug for LooseResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LooseResource")
            .field("name", &self.name)
            .field("resource_type", &self.resource_type)
            .finish_non_exhaustive()
    }
}

/// Lookup over the loose resources of one mount layer
///
/// The first resource given for a name and type wins.
#[derive(Debug, Default)]
pub(crate) struct LooseSet {
    resources: IndexMap<(Box<str>, ResourceType), LooseResource>,
}

impl LooseSet {
    pub fn find(&self, name: &str, resource_type: ResourceType) -> Option<&LooseResource> {
        self.resources
            .get(&(name.to_ascii_lowercase().into_boxed_str(), resource_type))
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LooseResource> {
        self.resources.values()
    }
}

impl FromIterator<LooseResource> for LooseSet {
    fn from_iter<I: IntoIterator<Item = LooseResource>>(iter: I) -> Self {
        let mut resources = IndexMap::new();
        for resource in iter {
            resources
                .entry((resource.name.to_ascii_lowercase().into_boxed_str(), resource.resource_type))
                .or_insert(resource);
        }
        Self { resources }
    }
}
