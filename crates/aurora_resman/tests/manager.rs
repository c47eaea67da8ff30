use std::io::Read;

use aurora_archive::{
    error::{Error as ArchiveError, FormatError},
    ContainerReader, ErfReader, NdsReader, ResourceType,
};
use aurora_resman::{
    error::Error, CorrectionTable, LooseResource, MountSource, Priority, ResourceManager,
    ResourceManagerOptions,
};
use bytes::Bytes;
use pretty_assertions::assert_eq;
use tracing::info;
use tracing_test::traced_test;

const POEM: &str = "I met a traveller from an antique land";

/// A ROM image with a single `Ozymandias.txt`
fn rom() -> Bytes {
    let mut rom = Vec::new();
    rom.extend_from_slice(b"xoreos test\0xor!x!");
    rom.resize(0x40, 0);
    let data_start = 0x50 + 8 + 1 + 14 + 8;
    for value in [0x50u32, 8 + 1 + 14, 0x50 + 8 + 1 + 14, 8] {
        rom.extend_from_slice(&value.to_le_bytes());
    }
    rom.resize(0x58, 0);
    rom.push(14);
    rom.extend_from_slice(b"Ozymandias.txt");
    rom.extend_from_slice(&(data_start as u32).to_le_bytes());
    rom.extend_from_slice(&((data_start + POEM.len()) as u32).to_le_bytes());
    rom.extend_from_slice(POEM.as_bytes());
    Bytes::from(rom)
}

/// An ERF V1.0 file with the given resrefs, type ids and data
fn erf(file_type: &[u8; 4], files: &[(&str, u16, &str)]) -> Bytes {
    let count = files.len() as u32;
    let key_offset = 160u32;
    let resource_offset = key_offset + 24 * count;
    let mut data_offset = resource_offset + 8 * count;

    let mut out = Vec::new();
    out.extend_from_slice(file_type);
    out.extend_from_slice(b"V1.0");
    for value in [0, 0, count, key_offset, key_offset, resource_offset, 0, 0, 0] {
        out.extend_from_slice(&u32::to_le_bytes(value));
    }
    out.resize(160, 0);

    for (i, (resref, type_id, _)) in files.iter().enumerate() {
        let mut name = [0u8; 16];
        name[..resref.len()].copy_from_slice(resref.as_bytes());
        out.extend_from_slice(&name);
        out.extend_from_slice(&(i as u32).to_le_bytes());
        out.extend_from_slice(&type_id.to_le_bytes());
        out.extend_from_slice(&[0, 0]);
    }
    for (_, _, data) in files {
        out.extend_from_slice(&data_offset.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        data_offset += data.len() as u32;
    }
    for (_, _, data) in files {
        out.extend_from_slice(data.as_bytes());
    }
    Bytes::from(out)
}

fn read(resman: &ResourceManager, name: &str, resource_type: ResourceType) -> Option<String> {
    let mut stream = resman.get_resource(name, resource_type)?;
    let mut out = String::new();
    stream.read_to_string(&mut out).ok()?;
    Some(out)
}

/// Everything observable about how a name resolves
fn snapshot(resman: &ResourceManager, name: &str, resource_type: ResourceType) -> Option<String> {
    resman.resolve(name, resource_type).map(|r| {
        format!(
            "{} {:?} {} {} {:?}",
            r.name(),
            r.resource_type(),
            r.handle(),
            r.priority(),
            r.locator()
        )
    })
}

#[traced_test]
#[test]
fn module_shadows_base_until_unmounted() -> miette::Result<()> {
    let resman = ResourceManager::new();
    let nds = NdsReader.parse_named("base.nds", rom())?;
    let base = resman.mount(nds, Priority::BASE);

    let queries = [
        ("ozymandias", ResourceType::Txt),
        ("module", ResourceType::Ifo),
        ("OZYMANDIAS", ResourceType::Txt),
        ("ozymandias", ResourceType::Bmp),
    ];
    let before = queries
        .iter()
        .map(|(name, t)| snapshot(&resman, name, *t))
        .collect::<Vec<_>>();

    assert_eq!(read(&resman, "ozymandias", ResourceType::Txt).as_deref(), Some(POEM));
    assert_eq!(
        resman.get_resource_size("ozymandias", ResourceType::Txt),
        Some(POEM.len() as u64)
    );

    let module = resman.mount_container(
        "module.mod",
        erf(b"MOD ", &[("Ozymandias", 10, "parody"), ("module", 2014, "IFO V3.2")]),
        Priority::MODULE,
    )?;
    info!("mounted module as {}", module);

    let resolved = resman.resolve("ozymandias", ResourceType::Txt).unwrap();
    assert_eq!(resolved.handle(), module);
    assert_eq!(&*resolved.locator().unwrap().container, "module.mod");
    assert_eq!(read(&resman, "ozymandias", ResourceType::Txt).as_deref(), Some("parody"));
    assert!(resman.has_resource("Module", ResourceType::Ifo));
    assert_eq!(resman.layer_count(), 2);

    resman.unmount(module)?;
    let after = queries
        .iter()
        .map(|(name, t)| snapshot(&resman, name, *t))
        .collect::<Vec<_>>();
    assert_eq!(before, after);
    assert_eq!(
        resman.resolve("ozymandias", ResourceType::Txt).unwrap().handle(),
        base
    );

    assert!(matches!(
        resman.unmount(module),
        Err(Error::UnknownChangeHandle(_))
    ));
    assert_eq!(resman.layer_count(), 1);
    Ok(())
}

#[traced_test]
#[test]
fn failed_mounts_leave_the_stack_untouched() {
    let resman = ResourceManager::new();
    resman.mount(
        LooseResource::new("a", ResourceType::Txt, "a"),
        Priority::BASE,
    );

    assert!(matches!(
        resman.mount_container("garbage.bin", Bytes::from_static(b"garbage"), Priority::HAK),
        Err(Error::UnrecognizedContainer { .. })
    ));

    let mut broken = erf(b"HAK ", &[("a", 10, "abc")]).to_vec();
    broken[188..192].copy_from_slice(&64u32.to_le_bytes());
    assert!(matches!(
        resman.mount_container("broken.hak", Bytes::from(broken), Priority::HAK),
        Err(Error::Archive(ArchiveError::Format(
            FormatError::EntryOutOfBounds { .. }
        )))
    ));

    // NDS images have no signature to detect
    assert!(matches!(
        resman.mount_container("base.nds", rom(), Priority::BASE),
        Err(Error::UnrecognizedContainer { .. })
    ));

    assert_eq!(resman.layer_count(), 1);
    assert_eq!(read(&resman, "a", ResourceType::Txt).as_deref(), Some("a"));
}

#[traced_test]
#[test]
fn module_bundle_with_loose_overrides() -> miette::Result<()> {
    let resman = ResourceManager::new();
    let module = ErfReader.parse_named(
        "module.mod",
        erf(b"MOD ", &[("dialog", 10, "from module"), ("areas", 10, "a")]),
    )?;

    let handle = resman.mount(
        MountSource::bundle([
            MountSource::from(module),
            MountSource::Loose(vec![LooseResource::generated(
                "dialog",
                ResourceType::Txt,
                || Bytes::from_static(b"generated"),
            )]),
        ]),
        Priority::MODULE,
    );
    assert_eq!(resman.layer_count(), 2);

    let dialog = resman.resolve("dialog", ResourceType::Txt).unwrap();
    assert_eq!(dialog.handle(), handle);
    assert!(dialog.locator().is_none());
    assert_eq!(read(&resman, "dialog", ResourceType::Txt).as_deref(), Some("generated"));
    assert_eq!(read(&resman, "areas", ResourceType::Txt).as_deref(), Some("a"));
    assert_eq!(resman.available(ResourceType::Txt), vec!["dialog", "areas"]);

    resman.unmount(handle)?;
    assert_eq!(resman.layer_count(), 0);
    assert_eq!(resman.resolve("dialog", ResourceType::Txt).map(|r| r.size()), None);
    Ok(())
}

#[traced_test]
#[test]
fn streams_survive_unmount() -> miette::Result<()> {
    let resman = ResourceManager::new();
    let handle = resman.mount(NdsReader.parse(rom())?, Priority::BASE);

    let mut stream = resman.get_resource("ozymandias", ResourceType::Txt).unwrap();
    resman.unmount(handle)?;
    assert!(resman.get_resource("ozymandias", ResourceType::Txt).is_none());

    let mut poem = String::new();
    stream.read_to_string(&mut poem).unwrap();
    assert_eq!(poem, POEM);
    Ok(())
}

#[traced_test]
#[test]
fn known_bad_types_are_corrected() -> miette::Result<()> {
    let mut corrections = CorrectionTable::new();
    corrections.insert("Patch.HAK", "fnt_dialog", ResourceType::Txi);

    let resman = ResourceManager::with_options(
        ResourceManagerOptions::builder()
            .type_corrections(corrections)
            .build(),
    );
    let files = [("fnt_dialog", 9999, "fontheight 0.16"), ("fnt_other", 9999, "x")];

    resman.mount_container("patch.hak", erf(b"HAK ", &files), Priority::HAK)?;
    resman.mount_container("other.hak", erf(b"HAK ", &files), Priority::BASE)?;

    let corrected = resman.resolve("fnt_dialog", ResourceType::Txi).unwrap();
    assert_eq!(&*corrected.locator().unwrap().container, "patch.hak");
    assert!(resman.has_resource("fnt_dialog", ResourceType::Unknown));
    assert!(resman.has_resource("fnt_other", ResourceType::Unknown));
    assert!(!resman.has_resource("fnt_other", ResourceType::Txi));

    // Only the listed container is corrected
    let declared = resman.resolve("fnt_dialog", ResourceType::Unknown).unwrap();
    assert_eq!(declared.entry().unwrap().name(), "fnt_dialog");
    assert_eq!(&*declared.locator().unwrap().container, "other.hak");
    Ok(())
}

#[traced_test]
#[test]
fn concurrent_reads_during_mounts() {
    let resman = ResourceManager::new();
    resman.mount(
        LooseResource::new("stable", ResourceType::Txt, "stable"),
        Priority::BASE,
    );

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..100 {
                    assert_eq!(
                        read(&resman, "stable", ResourceType::Txt).as_deref(),
                        Some("stable")
                    );
                }
            });
        }

        scope.spawn(|| {
            for i in 0..100 {
                let handle = resman.mount(
                    LooseResource::new("churn", ResourceType::Txt, format!("{i}")),
                    Priority::MODULE,
                );
                resman.unmount(handle).unwrap();
            }
        });
    });

    assert_eq!(resman.layer_count(), 1);
    assert!(!resman.has_resource("churn", ResourceType::Txt));
}
