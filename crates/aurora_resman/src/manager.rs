//! The layered resource manager.

use std::{collections::HashSet, num::NonZeroU64};

use aurora_archive::{ContainerFormat, ResourceIndex, ResourceStream, ResourceType};
use bon::Builder;
use bytes::Bytes;
use indexmap::IndexSet;
use parking_lot::RwLock;
use tracing::{info, instrument, trace, warn};

use crate::{
    corrections::CorrectionTable,
    error::{Error, Result},
    handle::{ChangeHandle, Priority},
    layer::{MountLayer, Resolved},
    source::MountSource,
};

/// Options for how the manager treats what is mounted
#[derive(Debug, Clone, Default, Builder)]
pub struct ResourceManagerOptions {
    /// Types replacing the declared type of single known-bad container entries
    ///
    /// Only for individual assets known to ship with a wrong type, keyed by container and
    /// entry name. Empty by default, no type is ever rewritten by a general rule.
    #[builder(default)]
    pub type_corrections: CorrectionTable<ResourceType>,
}

#[derive(Debug, Default)]
struct Stack {
    /// Ordered by priority, then mount sequence, both descending
    layers: Vec<MountLayer>,
    live: HashSet<ChangeHandle>,
    mounts: u64,
    sequence: u64,
}

impl Stack {
    fn next_handle(&mut self) -> ChangeHandle {
        let handle = ChangeHandle::new(NonZeroU64::MIN.saturating_add(self.mounts));
        self.mounts += 1;
        self.live.insert(handle);
        handle
    }

    fn push(&mut self, layer: MountLayer) {
        let key = (layer.priority, layer.sequence);
        let at = self.layers.partition_point(|l| (l.priority, l.sequence) > key);
        self.layers.insert(at, layer);
    }
}

/// Resolves resources by name and type across a stack of mounted containers
///
/// Every mount is tagged with a [`ChangeHandle`]. Unmounting that handle removes exactly what
/// the mount added, so resolution afterwards is what it was before the mount.
///
/// ```
/// use aurora_archive::ResourceType;
/// use aurora_resman::{LooseResource, Priority, ResourceManager};
///
/// let resman = ResourceManager::new();
/// let base = resman.mount(
///     vec![LooseResource::new("greeting", ResourceType::Txt, "hello")],
///     Priority::BASE,
/// );
/// let module = resman.mount(
///     vec![LooseResource::new("greeting", ResourceType::Txt, "howdy")],
///     Priority::MODULE,
/// );
/// assert_eq!(resman.get_resource_size("greeting", ResourceType::Txt), Some(5));
///
/// resman.unmount(module).unwrap();
/// assert_eq!(resman.resolve("greeting", ResourceType::Txt).unwrap().handle(), base);
/// ```
#[derive(Debug, Default)]
pub struct ResourceManager {
    options: ResourceManagerOptions,
    stack: RwLock<Stack>,
}

impl ResourceManager {
    /// An empty manager with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty manager
    pub fn with_options(options: ResourceManagerOptions) -> Self {
        Self {
            options,
            stack: RwLock::default(),
        }
    }

    /// The options the manager was created with
    pub fn options(&self) -> &ResourceManagerOptions {
        &self.options
    }

    fn correct(&self, index: ResourceIndex) -> ResourceIndex {
        let table = &self.options.type_corrections;
        if table.is_empty() {
            return index;
        }

        let container = index.container().to_owned();
        index.retype(|entry| {
            let corrected = *table.lookup(&container, entry.name())?;
            if corrected == entry.resource_type() {
                return None;
            }
            warn!(
                container = %container,
                name = entry.name(),
                declared = %entry.resource_type(),
                corrected = %corrected,
                "correcting type of known-bad resource"
            );
            Some(corrected)
        })
    }

    /// Add a source to the stack at `priority`
    ///
    /// Names colliding with resources already mounted are fine, the higher priority (or the
    /// later mount at equal priority) shadows the other.
    pub fn mount(
        &self,
        source: impl Into<MountSource>,
        priority: impl Into<Priority>,
    ) -> ChangeHandle {
        let priority = priority.into();

        let mut contents = Vec::new();
        source
            .into()
            .into_layers(&mut |index: ResourceIndex| self.correct(index), &mut contents);

        let mut stack = self.stack.write();
        let handle = stack.next_handle();
        let added = contents.len();
        for contents in contents {
            stack.sequence += 1;
            let layer = MountLayer {
                contents,
                priority,
                handle,
                sequence: stack.sequence,
            };
            info!(
                %handle,
                %priority,
                origin = layer.origin(),
                resources = layer.len(),
                "mounting layer"
            );
            stack.push(layer);
        }

        info!(
            %handle,
            %priority,
            added,
            layers = stack.layers.len(),
            "mounted"
        );
        handle
    }

    /// Detect the format of some container bytes, parse them and mount the index
    ///
    /// Nothing is mounted when the container cannot be parsed.
    #[instrument(skip(self, data, priority), fields(size = data.len()), err)]
    pub fn mount_container(
        &self,
        container: &str,
        data: Bytes,
        priority: impl Into<Priority>,
    ) -> Result<ChangeHandle> {
        let format =
            ContainerFormat::detect(&data).ok_or_else(|| Error::UnrecognizedContainer {
                container: container.to_owned(),
            })?;
        let index = format.parse_named(container, data)?;
        Ok(self.mount(index, priority))
    }

    /// Remove everything the mount that returned `handle` added
    ///
    /// Unknown handles, including ones already unmounted, leave the stack untouched.
    pub fn unmount(&self, handle: ChangeHandle) -> Result<()> {
        let mut stack = self.stack.write();
        if !stack.live.remove(&handle) {
            warn!(%handle, "unmounting unknown change handle");
            return Err(Error::UnknownChangeHandle(handle));
        }

        let before = stack.layers.len();
        stack.layers.retain(|l| l.handle != handle);
        info!(
            %handle,
            removed = before - stack.layers.len(),
            layers = stack.layers.len(),
            "unmounted"
        );
        Ok(())
    }

    /// Unmount everything
    pub fn clear(&self) {
        let mut stack = self.stack.write();
        let handles = stack.live.len();
        stack.layers.clear();
        stack.live.clear();
        info!(handles, "cleared all mounts");
    }

    /// Find the visible resource with a name, ignoring case, and type
    pub fn resolve(&self, name: &str, resource_type: ResourceType) -> Option<Resolved> {
        let stack = self.stack.read();
        let found = stack
            .layers
            .iter()
            .find_map(|layer| layer.find(name, resource_type));
        if found.is_none() {
            trace!(name, %resource_type, "no such resource");
        }
        found
    }

    /// A stream over the visible resource with a name and type
    pub fn get_resource(&self, name: &str, resource_type: ResourceType) -> Option<ResourceStream> {
        self.resolve(name, resource_type).map(|r| r.open())
    }

    /// Size of the visible resource with a name and type
    pub fn get_resource_size(&self, name: &str, resource_type: ResourceType) -> Option<u64> {
        self.resolve(name, resource_type).map(|r| r.size())
    }

    /// Whether a resource with a name and type is visible
    pub fn has_resource(&self, name: &str, resource_type: ResourceType) -> bool {
        self.resolve(name, resource_type).is_some()
    }

    /// Names of all visible resources of a type, lower-cased, in resolution order
    pub fn available(&self, resource_type: ResourceType) -> Vec<String> {
        let stack = self.stack.read();
        let mut names = IndexSet::new();
        for layer in &stack.layers {
            for name in layer.names(resource_type) {
                names.insert(name.to_ascii_lowercase());
            }
        }
        names.into_iter().collect()
    }

    /// Number of layers on the stack
    pub fn layer_count(&self) -> usize {
        self.stack.read().layers.len()
    }
}
