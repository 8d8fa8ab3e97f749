//! Volume-presence poller and capacity labelling.
//!
//! A periodic task (~1 s) checks the target mount, derives a human capacity
//! label rounded to the nearest power-of-two unit, refreshes the network
//! summary, and publishes everything under the shared lock. The render path
//! never probes the filesystem itself.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use crate::app::model::{AppModel, NetworkStatus, VolumeStatus};
use crate::core::config::PathsConfig;
use crate::platform::{disk, net::NetworkDetector};

const KIB: u64 = 1024;
const MIB: u64 = KIB * 1024;
const GIB: u64 = MIB * 1024;
const TIB: u64 = GIB * 1024;

/// Round to the nearest power of two; zero maps to one.
#[must_use]
pub fn round_to_power_of_two(value: u64) -> u64 {
    if value == 0 {
        return 1;
    }
    let power = (value as f64).log2().round() as u32;
    1u64 << power
}

/// Marketing-style capacity label: "512mb", "4GB", "16GB", "2TB".
#[must_use]
pub fn capacity_label(total_bytes: u64) -> String {
    if total_bytes < GIB {
        format!("{}mb", round_to_power_of_two(total_bytes / MIB))
    } else if total_bytes < TIB {
        format!("{}GB", round_to_power_of_two(total_bytes / GIB))
    } else {
        format!("{}TB", round_to_power_of_two(total_bytes / TIB))
    }
}

/// Exact free-space label for the idle and recording screens.
#[must_use]
pub fn storage_label(free_bytes: u64) -> String {
    if free_bytes < MIB {
        format!("{}KB", free_bytes / KIB)
    } else if free_bytes < GIB {
        format!("{}MB", free_bytes / MIB)
    } else {
        format!("{}GB", free_bytes / GIB)
    }
}

/// One poll pass: probe the mount, the free bytes at the active recording
/// target, and the link state, then publish.
pub fn poll_once(model: &Mutex<AppModel>, paths: &PathsConfig, detector: &NetworkDetector) {
    let mounted = disk::is_mounted(&paths.volume_mount);
    let capacity = if mounted {
        disk::total_bytes(&paths.volume_mount)
            .map(capacity_label)
            .unwrap_or_default()
    } else {
        String::new()
    };

    let free_target: &Path = if mounted {
        &paths.volume_mount
    } else {
        &paths.record_dir
    };
    let free_bytes = disk::free_bytes(free_target).unwrap_or(0);

    let (connected, summary) = detector.status();
    let details = detector.details();

    let mut m = model.lock();
    m.volume = VolumeStatus {
        mounted,
        capacity_label: capacity,
        free_bytes,
    };
    m.network = NetworkStatus {
        connected,
        summary,
        details,
    };
}

/// Spawn the poller thread. Exits when `shutdown` is set.
pub fn spawn_status_poller(
    model: Arc<Mutex<AppModel>>,
    paths: PathsConfig,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name("wvd-status".to_string())
        .spawn(move || {
            let detector = NetworkDetector::new(paths.network_interface.clone());
            while !shutdown.load(Ordering::Relaxed) {
                poll_once(&model, &paths, &detector);
                thread::sleep(interval);
            }
        })
        .expect("spawning the status poller thread cannot fail")
}
