//! Daemon bootstrap configuration.
//!
//! A backend daemon is started either by a spawner process, which hands over
//! its bus identity so the daemon can report back, or directly from the
//! command line with the mount parameters:
//!
//! ```text
//! daemon [--debug] --spawner <bus-id> <object-path>
//! daemon [--debug] key=value key=value ...
//! ```
//!
//! Debug logging is enabled by `--debug` or by setting `MOUNTSPEC_DEBUG`.

use tracing::Level;

use crate::error::SpecError;
use crate::spec::MountSpec;

/// Environment variable enabling debug logging.
pub const DEBUG_ENV: &str = "MOUNTSPEC_DEBUG";

const DEBUG_FLAG: &str = "--debug";
const SPAWNER_FLAG: &str = "--spawner";
const SPAWNER_USAGE: &str = "--spawner dbus-id object_path";

/// Identity of the process that spawned the daemon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spawner {
    pub bus_id: String,
    pub object_path: String,
}

/// Parsed daemon command line.
#[derive(Clone, Debug, Default)]
pub struct DaemonArgs {
    /// Print debug output
    pub debug: bool,
    /// Set when started by a spawner
    pub spawner: Option<Spawner>,
    /// Spec to mount right after startup
    pub mount_spec: Option<MountSpec>,
}

impl DaemonArgs {
    /// Parses the arguments following the program name.
    ///
    /// `default_type` is the mount type served by this daemon, if it serves
    /// only one.
    pub fn parse<I, S>(args: I, default_type: Option<&str>) -> Result<Self, SpecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::parse_with_env(args, default_type, std::env::var_os(DEBUG_ENV).is_some())
    }

    /// Same as [`DaemonArgs::parse`] with the debug environment already read.
    pub fn parse_with_env<I, S>(
        args: I,
        default_type: Option<&str>,
        debug_env: bool,
    ) -> Result<Self, SpecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<S> = args.into_iter().collect();
        let mut args: &[S] = &args;
        let mut parsed = DaemonArgs { debug: debug_env, ..Default::default() };

        if let Some((first, rest)) = args.split_first() {
            if first.as_ref() == DEBUG_FLAG {
                parsed.debug = true;
                args = rest;
            }
        }

        match args.split_first() {
            Some((first, rest)) if first.as_ref() == SPAWNER_FLAG => {
                let [bus_id, object_path, ..] = rest else {
                    return Err(SpecError::Usage(SPAWNER_USAGE.to_string()));
                };
                parsed.spawner = Some(Spawner {
                    bus_id: bus_id.as_ref().to_string(),
                    object_path: object_path.as_ref().to_string(),
                });
            }
            _ if !args.is_empty() || default_type.is_some() => {
                parsed.mount_spec = Some(MountSpec::from_args(args, default_type)?);
            }
            _ => {}
        }

        Ok(parsed)
    }

    /// Maximum log level matching the debug setting.
    pub fn log_level(&self) -> Level {
        if self.debug {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }
}
