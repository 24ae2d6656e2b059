#![allow(dead_code)]

use mountspec::MountSpec;

/// `type=ftp,host=<host>,user=alice` rooted at `/`.
pub fn ftp(host: &str) -> MountSpec {
    let mut spec = MountSpec::new(Some("ftp"));
    spec.set("host", host);
    spec.set("user", "alice");
    spec
}

/// SMB share spec with a non-root prefix.
pub fn smb_share(share: &str, prefix: &str) -> MountSpec {
    let mut spec = MountSpec::new(Some("smb-share"));
    spec.set("server", "nas.local");
    spec.set("share", share);
    spec.set_mount_prefix(prefix);
    spec
}

/// A spec whose parameters need escaping in the text form.
pub fn awkward() -> MountSpec {
    let mut spec = MountSpec::new(Some("dav+sd"));
    spec.set("host", "Büro Drucker._webdav._tcp.local");
    spec.set("user", "dom\\user%1");
    spec.set("ssl", "true");
    spec.set_mount_prefix("/Team Files/2024 #1");
    spec
}

/// A representative set of specs covering empty, plain and awkward cases.
pub fn samples() -> Vec<MountSpec> {
    vec![
        MountSpec::new(None),
        MountSpec::new(Some("trash")),
        ftp("example.com"),
        smb_share("music", "/music"),
        awkward(),
    ]
}
