//! Format independent types describing the resources inside a container.

use std::{fmt, sync::Arc};

use crc::{Crc, CRC_32_BZIP2};

use crate::compression::CompressionMethod;

/// The kind of content a resource holds
///
/// Containers declare types in different ways (numeric tags, filename extensions),
/// every reader maps them onto this closed set. Anything a reader does not recognise
/// becomes [`ResourceType::Unknown`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    /// A type that could not be recognised
    Unknown,
    /// Windows bitmap image
    Bmp,
    /// Targa image
    Tga,
    /// DirectDraw surface image
    Dds,
    /// Portable network graphics image
    Png,
    /// Texture information
    Txi,
    /// Packed layer texture
    Plt,
    /// Wave audio
    Wav,
    /// Ogg vorbis audio
    Ogg,
    /// Plain text
    Txt,
    /// Ini style configuration
    Ini,
    /// 3D model
    Mdl,
    /// Script source
    Nss,
    /// Compiled script
    Ncs,
    /// Two dimensional array
    TwoDa,
    /// Talk table
    Tlk,
    /// Module information
    Ifo,
    /// Area description
    Are,
    /// Instanced area contents
    Git,
    /// Character
    Bic,
    /// Conversation
    Dlg,
    /// Item blueprint
    Uti,
    /// Creature blueprint
    Utc,
    /// Generic field file
    Gff,
    /// GUI layout
    Gui,
    /// Interchange file format chunk tree
    Iff,
    /// String table
    Stf,
}

/// Table of every known type with its numeric tag (if it has one) and its extension
const TYPES: &[(ResourceType, Option<u16>, &str)] = &[
    (ResourceType::Bmp, Some(1), "bmp"),
    (ResourceType::Tga, Some(3), "tga"),
    (ResourceType::Wav, Some(4), "wav"),
    (ResourceType::Plt, Some(6), "plt"),
    (ResourceType::Ini, Some(7), "ini"),
    (ResourceType::Txt, Some(10), "txt"),
    (ResourceType::Mdl, Some(2002), "mdl"),
    (ResourceType::Nss, Some(2009), "nss"),
    (ResourceType::Ncs, Some(2010), "ncs"),
    (ResourceType::Are, Some(2012), "are"),
    (ResourceType::Ifo, Some(2014), "ifo"),
    (ResourceType::Bic, Some(2015), "bic"),
    (ResourceType::TwoDa, Some(2017), "2da"),
    (ResourceType::Tlk, Some(2018), "tlk"),
    (ResourceType::Txi, Some(2022), "txi"),
    (ResourceType::Git, Some(2023), "git"),
    (ResourceType::Uti, Some(2025), "uti"),
    (ResourceType::Utc, Some(2027), "utc"),
    (ResourceType::Dlg, Some(2029), "dlg"),
    (ResourceType::Dds, Some(2033), "dds"),
    (ResourceType::Gff, Some(2037), "gff"),
    (ResourceType::Gui, Some(2047), "gui"),
    (ResourceType::Png, None, "png"),
    (ResourceType::Ogg, None, "ogg"),
    (ResourceType::Iff, None, "iff"),
    (ResourceType::Stf, None, "stf"),
];

impl ResourceType {
    /// Map a numeric type tag, as stored by ERF containers
    pub fn from_id(id: u16) -> Self {
        TYPES
            .iter()
            .find(|(_, tag, _)| *tag == Some(id))
            .map_or(ResourceType::Unknown, |(t, _, _)| *t)
    }

    /// Map a filename extension (without the dot), ignoring case
    pub fn from_extension(extension: &str) -> Self {
        TYPES
            .iter()
            .find(|(_, _, ext)| ext.eq_ignore_ascii_case(extension))
            .map_or(ResourceType::Unknown, |(t, _, _)| *t)
    }

    /// The numeric tag of this type, if it has one
    pub fn id(&self) -> Option<u16> {
        TYPES.iter().find(|(t, _, _)| t == self).and_then(|(_, id, _)| *id)
    }

    /// The canonical filename extension of this type
    pub fn extension(&self) -> Option<&'static str> {
        TYPES.iter().find(|(t, _, _)| t == self).map(|(_, _, ext)| *ext)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension().unwrap_or("unknown"))
    }
}

/// Split a stored filename into its lower-cased stem and the type of its extension
///
/// Only the last extension counts, `foo.tar.gz` is the stem `foo.tar` of an unknown type.
pub(crate) fn split_file_name(file_name: &str) -> (String, ResourceType) {
    let lower = file_name.to_ascii_lowercase();
    match lower.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            (stem.to_owned(), ResourceType::from_extension(ext))
        }
        _ => (lower, ResourceType::Unknown),
    }
}

/// Decode a name field, dropping everything from the first NUL onwards
pub(crate) fn decode_name(raw: &[u8]) -> String {
    let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

const CRC_BZIP2: Crc<u32> = Crc::<u32>::new(&CRC_32_BZIP2);

/// The algorithm a container uses to hash the names of its entries
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// Names are not hashed, hash lookups never find anything
    #[default]
    None,

    /// [`crc::CRC_32_BZIP2`] over the full stored filename
    Crc32Bzip2,
}

impl HashAlgorithm {
    /// Hash a full stored filename the way a container using this algorithm would
    pub fn hash(&self, file_name: &str) -> Option<u64> {
        match self {
            HashAlgorithm::None => None,
            HashAlgorithm::Crc32Bzip2 => Some(CRC_BZIP2.checksum(file_name.as_bytes()) as u64),
        }
    }
}

/// Where the bytes of a resource live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    /// Identifier of the container holding the bytes
    pub container: Arc<str>,
    /// Offset from the start of the container
    pub offset: u64,
    /// Number of bytes
    pub length: u64,
}

impl Locator {
    /// One past the last byte of the resource
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// A named, typed and byte-range addressable resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    name: Box<str>,
    resource_type: ResourceType,
    locator: Locator,
    name_hash: Option<u64>,
    index: usize,
    compression: CompressionMethod,
}

impl ResourceEntry {
    /// Create an uncompressed entry without a name hash
    pub fn new(
        name: impl Into<Box<str>>,
        resource_type: ResourceType,
        locator: Locator,
        index: usize,
    ) -> Self {
        Self {
            name: name.into(),
            resource_type,
            locator,
            name_hash: None,
            index,
            compression: CompressionMethod::None,
        }
    }

    pub(crate) fn with_name_hash(mut self, hash: Option<u64>) -> Self {
        self.name_hash = hash;
        self
    }

    pub(crate) fn with_compression(mut self, compression: CompressionMethod) -> Self {
        self.compression = compression;
        self
    }

    pub(crate) fn with_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = resource_type;
        self
    }

    /// Name of the resource, without any extension
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of content
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Location of the bytes
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Hash of the name, present only when the container declares a hash algorithm
    pub fn name_hash(&self) -> Option<u64> {
        self.name_hash
    }

    /// Position of the entry in parse order
    pub fn index(&self) -> usize {
        self.index
    }

    /// Size of the resource in bytes
    pub fn size(&self) -> u64 {
        self.locator.length
    }

    /// How the container stored the bytes. The bytes are handed out as stored.
    pub fn compression(&self) -> CompressionMethod {
        self.compression
    }

    /// Whether this entry answers to `name` and `resource_type`
    pub fn matches(&self, name: &str, resource_type: ResourceType) -> bool {
        self.resource_type == resource_type && self.name.eq_ignore_ascii_case(name)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{decode_name, split_file_name, HashAlgorithm, ResourceType};

    #[test]
    fn type_from_extension_ignores_case() {
        assert_eq!(ResourceType::from_extension("TXT"), ResourceType::Txt);
        assert_eq!(ResourceType::from_extension("2da"), ResourceType::TwoDa);
        assert_eq!(ResourceType::from_extension("xyz"), ResourceType::Unknown);
    }

    #[test]
    fn type_from_id() {
        assert_eq!(ResourceType::from_id(10), ResourceType::Txt);
        assert_eq!(ResourceType::from_id(2047), ResourceType::Gui);
        assert_eq!(ResourceType::from_id(0xFFFF), ResourceType::Unknown);
        assert_eq!(ResourceType::Png.id(), None);
        assert_eq!(ResourceType::Mdl.id(), Some(2002));
    }

    #[test]
    fn split_names() {
        assert_eq!(
            split_file_name("Ozymandias.txt"),
            ("ozymandias".to_owned(), ResourceType::Txt)
        );
        assert_eq!(
            split_file_name("texture/Wall.DDS"),
            ("texture/wall".to_owned(), ResourceType::Dds)
        );
        assert_eq!(
            split_file_name("README"),
            ("readme".to_owned(), ResourceType::Unknown)
        );
        assert_eq!(
            split_file_name(".hidden"),
            (".hidden".to_owned(), ResourceType::Unknown)
        );
    }

    #[test]
    fn names_stop_at_first_nul() {
        assert_eq!(decode_name(b"fnt_dialog\0\0junk\0\0"), "fnt_dialog");
        assert_eq!(decode_name(b"exactly16bytes!!"), "exactly16bytes!!");
    }

    #[test]
    fn no_hash_algorithm_never_hashes() {
        assert_eq!(HashAlgorithm::None.hash("hello.txt"), None);
        assert_eq!(
            HashAlgorithm::Crc32Bzip2.hash("hello.txt"),
            HashAlgorithm::Crc32Bzip2.hash("hello.txt")
        );
        assert!(HashAlgorithm::Crc32Bzip2.hash("hello.txt").is_some());
    }
}
