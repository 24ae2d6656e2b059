//! A client sends a location over the wire, the daemon routes it to a mount.

use std::sync::{Arc, RwLock};
use std::thread;

use mountspec::message::MessageWriter;
use mountspec::{MountLocation, MountSpec, MountTable, SpecRef};

mod support;

fn mounted_table() -> Arc<RwLock<MountTable>> {
    let mut table = MountTable::new();
    table.mount(&SpecRef::new(support::smb_share("routing", "/")));
    table.mount(&SpecRef::new(support::smb_share("routing", "/photos")));
    Arc::new(RwLock::new(table))
}

#[test]
fn location_reaches_its_mount() {
    let table = mounted_table();
    let location =
        MountLocation::new(support::smb_share("routing", "/"), "photos/2024/../2023/beach.jpg");
    assert_eq!(location.path(), "/photos/2023/beach.jpg");

    let mut writer = MessageWriter::new();
    location.to_wire(&mut writer);

    let request = MountSpec::from_wire(&mut writer.iter()).expect("decode request");
    let table = table.read().expect("table lock");
    let mount = table.lookup_spec(&request).expect("mount for request");
    assert_eq!(mount.mount_prefix(), "/photos");
    assert!(mount.is_canonical());
}

#[test]
fn concurrent_lookups() {
    let table = mounted_table();
    let handles: Vec<_> = ["/", "/music/a.flac", "/photos", "/photos/x.png", "/photosets"]
        .into_iter()
        .map(|path| {
            let table = table.clone();
            thread::spawn(move || {
                let query = support::smb_share("routing", "/");
                let table = table.read().expect("table lock");
                let mount = table.lookup(&query, path)?;
                Some(mount.mount_prefix().to_string())
            })
        })
        .collect();

    let prefixes: Vec<_> =
        handles.into_iter().map(|handle| handle.join().expect("thread panicked")).collect();
    assert_eq!(
        prefixes,
        [
            Some("/".to_string()),
            Some("/".to_string()),
            Some("/photos".to_string()),
            Some("/photos".to_string()),
            Some("/".to_string()),
        ]
    );
}

#[test]
fn unknown_parameters_are_not_routed() {
    let table = mounted_table();
    let table = table.read().expect("table lock");
    assert!(table.lookup(&support::ftp("example.com"), "/").is_none());
}
