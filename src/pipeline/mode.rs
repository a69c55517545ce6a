use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Where the detection stage of a run is attempted first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Local,
    Remote,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Local => f.write_str("local"),
            Mode::Remote => f.write_str("remote"),
        }
    }
}

/// Picks the processing mode for one run.
///
/// The probe runs on every call, toggle or not, because on-device capability
/// can disappear between runs.
pub fn select_mode<P>(user_toggle: bool, capability_probe: P) -> Mode
where
    P: FnOnce() -> bool,
{
    let capable = capability_probe();
    let mode = if user_toggle && capable {
        Mode::Local
    } else {
        Mode::Remote
    };

    if user_toggle && !capable {
        debug!("Local processing requested but on-device capability unavailable, using remote");
    }

    mode
}
