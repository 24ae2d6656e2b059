use anyhow::Context;

use mountspec::daemon_args::DaemonArgs;
use mountspec::message::MessageWriter;
use mountspec::{MountLocation, MountSpec, MountTable};

/// Default mount type when no `type=` argument is given
const DEFAULT_TYPE: &str = "ftp";

/// Entry point for the spec inspection tool
///
/// Parses daemon-style arguments into a mount spec, prints its text and
/// message encodings, decodes both again and routes the spec through a
/// mount table the way a daemon would.
fn main() -> anyhow::Result<()> {
    let args = match DaemonArgs::parse(std::env::args().skip(1), Some(DEFAULT_TYPE)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!(
                "{}\n\
                 \n\
                 Usage: spectool [--debug] [key=value ...]\n\
                 \x20      spectool [--debug] --spawner <bus-id> <object-path>",
                e
            );
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .init();

    if let Some(spawner) = &args.spawner {
        println!("spawned by {} at {}", spawner.bus_id, spawner.object_path);
        return Ok(());
    }
    let spec = args.mount_spec.context("no mount spec given")?;

    let text = spec.to_text();
    println!("text:      {}", text);
    let from_text: MountSpec = text.parse().context("decoding text form")?;
    anyhow::ensure!(from_text == spec, "text form did not round-trip");

    let mut writer = MessageWriter::new();
    spec.to_wire(&mut writer, None);
    println!("message:   {}", hex(writer.as_bytes()));
    let from_wire = MountSpec::from_wire(&mut writer.iter()).context("decoding message")?;
    anyhow::ensure!(from_wire == spec, "message form did not round-trip");
    println!("hash:      {:#010x}", spec.spec_hash());

    let mut table = MountTable::new();
    let mounted = table.mount(&spec.clone().into_canonical());
    let location = MountLocation::with_spec(&mounted, "docs/../readme.txt");
    let routed = table
        .lookup(&spec, location.path())
        .context("location not served by its own mount")?;
    println!("location:  {} on {}", location.path(), routed.spec());
    println!("canonical: shared by {} references", routed.ref_count());

    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}
