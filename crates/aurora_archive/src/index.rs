//! The immutable index a container reader produces.

use std::{
    collections::HashMap,
    fmt::{self, Debug},
    io::{self, Cursor, Read, Seek},
    sync::Arc,
};

use bytes::Bytes;
use indexmap::IndexMap;

use crate::{
    compression::CompressionMethod,
    error::{FormatError, IndexError},
    types::{HashAlgorithm, Locator, ResourceEntry, ResourceType},
    ContainerFormat,
};

/// A byte stream bounded to exactly one resource
///
/// The stream owns a view of the container bytes, so it stays valid after the index it
/// came from is dropped and never reads past the end of its resource.
#[derive(Clone)]
pub struct ResourceStream {
    inner: Cursor<Bytes>,
}

impl ResourceStream {
    /// Create a stream over some bytes
    pub fn new(data: Bytes) -> Self {
        Self {
            inner: Cursor::new(data),
        }
    }

    /// Total size of the stream in bytes
    pub fn len(&self) -> u64 {
        self.inner.get_ref().len() as u64
    }

    /// Whether the resource is empty
    pub fn is_empty(&self) -> bool {
        self.inner.get_ref().is_empty()
    }

    /// All bytes of the resource, regardless of the stream position
    pub fn bytes(&self) -> &Bytes {
        self.inner.get_ref()
    }

    /// Unwrap and return the bytes of the resource
    pub fn into_bytes(self) -> Bytes {
        self.inner.into_inner()
    }
}

impl Debug for ResourceStream {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ResourceStream({} of {} bytes)",
            self.inner.position(),
            self.len()
        )
    }
}

impl Read for ResourceStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for ResourceStream {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// Case-insensitive lookup key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NameKey(Box<str>, ResourceType);

impl NameKey {
    fn new(name: &str, resource_type: ResourceType) -> Self {
        Self(name.to_ascii_lowercase().into(), resource_type)
    }
}

/// An immutable, queryable collection of the resources in one container
///
/// ```no_run
/// use aurora_archive::{ContainerReader, NdsReader, ResourceType};
/// use std::io::Read;
///
/// fn print_poem(data: Vec<u8>) -> aurora_archive::error::Result<()> {
///     let index = NdsReader.parse(data.into())?;
///
///     if let Some(i) = index.find_by_name("ozymandias", ResourceType::Txt) {
///         let mut poem = String::new();
///         index.resource(i)?.read_to_string(&mut poem).unwrap();
///         println!("{poem}");
///     }
///
///     Ok(())
/// }
/// ```
pub struct ResourceIndex {
    format: ContainerFormat,
    container: Arc<str>,
    data: Bytes,
    hash_algorithm: HashAlgorithm,
    entries: Vec<ResourceEntry>,
    by_name: IndexMap<NameKey, usize>,
    by_hash: HashMap<u64, usize>,
}

impl Debug for ResourceIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ResourceIndex")
            .field("format", &self.format)
            .field("container", &self.container)
            .field("size", &self.data.len())
            .field("hash_algorithm", &self.hash_algorithm)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl ResourceIndex {
    pub(crate) fn builder(
        format: ContainerFormat,
        container: &str,
        data: Bytes,
        hash_algorithm: HashAlgorithm,
    ) -> IndexBuilder {
        IndexBuilder {
            format,
            container: container.into(),
            data,
            hash_algorithm,
            entries: Vec::new(),
        }
    }

    /// Format of the container this index was read from
    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    /// Identifier of the container this index was read from
    pub fn container(&self) -> &str {
        &self.container
    }

    /// The algorithm the container declares for hashing names
    pub fn name_hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    /// All resources, in parse order
    pub fn resources(&self) -> &[ResourceEntry] {
        &self.entries
    }

    /// Number of resources in the container
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the container holds no resources
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get a resource entry by its sequence index
    pub fn entry(&self, index: usize) -> Result<&ResourceEntry, IndexError> {
        self.entries.get(index).ok_or(IndexError {
            index,
            count: self.entries.len(),
        })
    }

    /// Size in bytes of the resource at `index`
    pub fn resource_size(&self, index: usize) -> Result<u64, IndexError> {
        self.entry(index).map(ResourceEntry::size)
    }

    /// A stream over exactly the bytes of the resource at `index`
    pub fn resource(&self, index: usize) -> Result<ResourceStream, IndexError> {
        let locator = self.entry(index)?.locator();
        // Ranges were checked against the data when the index was built
        let start = locator.offset as usize;
        let end = locator.end() as usize;
        Ok(ResourceStream::new(self.data.slice(start..end)))
    }

    /// Find a resource by the hash of its name
    ///
    /// Containers without a hash algorithm never find anything here.
    pub fn find_by_hash(&self, hash: u64) -> Option<usize> {
        match self.hash_algorithm {
            HashAlgorithm::None => None,
            _ => self.by_hash.get(&hash).copied(),
        }
    }

    /// Find a resource by name, ignoring case, and type
    pub fn find_by_name(&self, name: &str, resource_type: ResourceType) -> Option<usize> {
        self.by_name
            .get(&NameKey::new(name, resource_type))
            .copied()
    }

    /// Rebuild the index with some entries assigned a different type
    ///
    /// `correct` is asked for every entry, returning a type replaces the declared one.
    pub fn retype(self, mut correct: impl FnMut(&ResourceEntry) -> Option<ResourceType>) -> Self {
        let entries = self
            .entries
            .into_iter()
            .map(|entry| match correct(&entry) {
                Some(resource_type) => entry.with_type(resource_type),
                None => entry,
            })
            .collect::<Vec<_>>();

        IndexBuilder {
            format: self.format,
            container: self.container,
            data: self.data,
            hash_algorithm: self.hash_algorithm,
            entries,
        }
        .finish()
    }
}

pub(crate) struct IndexBuilder {
    format: ContainerFormat,
    container: Arc<str>,
    data: Bytes,
    hash_algorithm: HashAlgorithm,
    entries: Vec<ResourceEntry>,
}

impl IndexBuilder {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.entries.reserve(capacity);
        self
    }

    /// Add the next entry, checking its byte range against the container
    pub fn push(
        &mut self,
        name: String,
        resource_type: ResourceType,
        offset: u64,
        length: u64,
        name_hash: Option<u64>,
        compression: CompressionMethod,
    ) -> Result<(), FormatError> {
        let index = self.entries.len();
        let size = self.data.len() as u64;
        match offset.checked_add(length) {
            Some(end) if end <= size => {}
            _ => {
                return Err(FormatError::EntryOutOfBounds {
                    format: self.format,
                    index,
                    offset,
                    length,
                    size,
                })
            }
        }

        let name_hash = match self.hash_algorithm {
            HashAlgorithm::None => None,
            _ => name_hash,
        };

        let locator = Locator {
            container: self.container.clone(),
            offset,
            length,
        };
        self.entries.push(
            ResourceEntry::new(name, resource_type, locator, index)
                .with_name_hash(name_hash)
                .with_compression(compression),
        );
        Ok(())
    }

    pub fn finish(self) -> ResourceIndex {
        let mut by_name = IndexMap::with_capacity(self.entries.len());
        let mut by_hash = HashMap::new();
        for entry in &self.entries {
            by_name
                .entry(NameKey::new(entry.name(), entry.resource_type()))
                .or_insert(entry.index());
            if let Some(hash) = entry.name_hash() {
                by_hash.entry(hash).or_insert(entry.index());
            }
        }

        ResourceIndex {
            format: self.format,
            container: self.container,
            data: self.data,
            hash_algorithm: self.hash_algorithm,
            entries: self.entries,
            by_name,
            by_hash,
        }
    }
}
