//! What a single mount call can add to the manager.

use std::sync::Arc;

use aurora_archive::ResourceIndex;

use crate::{
    layer::LayerContents,
    loose::{LooseResource, LooseSet},
};

/// The contents of one mount call
///
/// A bundle mounts several sources under one change handle. Within a bundle, later sources
/// shadow earlier ones of the same priority.
#[derive(Debug)]
pub enum MountSource {
    /// A parsed container
    Index(ResourceIndex),

    /// Resources supplied without a container
    Loose(Vec<LooseResource>),

    /// Several sources mounted together
    Bundle(Vec<MountSource>),
}

impl MountSource {
    /// Bundle several sources into one mount
    pub fn bundle<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<MountSource>,
    {
        MountSource::Bundle(sources.into_iter().map(Into::into).collect())
    }

    /// Flatten into the contents of the layers to create, in mount order
    pub(crate) fn into_layers(
        self,
        correct: &mut impl FnMut(ResourceIndex) -> ResourceIndex,
        out: &mut Vec<LayerContents>,
    ) {
        match self {
            MountSource::Index(index) => out.push(LayerContents::Index(Arc::new(correct(index)))),
            MountSource::Loose(resources) => out.push(LayerContents::Loose(Arc::new(
                resources.into_iter().collect::<LooseSet>(),
            ))),
            MountSource::Bundle(sources) => {
                for source in sources {
                    source.into_layers(correct, out);
                }
            }
        }
    }
}

impl From<ResourceIndex> for MountSource {
    fn from(index: ResourceIndex) -> Self {
        MountSource::Index(index)
    }
}

impl From<Vec<LooseResource>> for MountSource {
    fn from(resources: Vec<LooseResource>) -> Self {
        MountSource::Loose(resources)
    }
}

impl From<LooseResource> for MountSource {
    fn from(resource: LooseResource) -> Self {
        MountSource::Loose(vec![resource])
    }
}
