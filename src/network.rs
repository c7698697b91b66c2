//! Network availability.
//!
//! Link establishment is someone else's job (NetworkManager, systemd-networkd,
//! wpa_supplicant). The controller only asks whether there is a link worth
//! trying, so remote calls fail fast instead of waiting out a timeout.

use std::path::PathBuf;

pub trait NetworkStatus {
    fn is_up(&self) -> bool;
}

/// Reports the network as up when any non-loopback interface under
/// `/sys/class/net` has `operstate` of `up`.
pub struct SysfsNetwork {
    root: PathBuf,
}

impl SysfsNetwork {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/sys/class/net"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }
}

impl Default for SysfsNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkStatus for SysfsNetwork {
    fn is_up(&self) -> bool {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return false;
        };

        entries.flatten().any(|entry| {
            if entry.file_name() == "lo" {
                return false;
            }
            std::fs::read_to_string(entry.path().join("operstate"))
                .map(|state| state.trim() == "up")
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn add_interface(root: &std::path::Path, name: &str, state: &str) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("operstate"), format!("{state}\n")).unwrap();
    }

    #[test]
    fn test_up_interface_means_online() {
        let dir = tempdir().unwrap();
        add_interface(dir.path(), "lo", "unknown");
        add_interface(dir.path(), "eth0", "down");
        add_interface(dir.path(), "wlan0", "up");

        assert!(SysfsNetwork::with_root(dir.path().to_path_buf()).is_up());
    }

    #[test]
    fn test_loopback_alone_is_offline() {
        let dir = tempdir().unwrap();
        add_interface(dir.path(), "lo", "up");
        add_interface(dir.path(), "eth0", "down");

        assert!(!SysfsNetwork::with_root(dir.path().to_path_buf()).is_up());
    }

    #[test]
    fn test_missing_root_is_offline() {
        let network = SysfsNetwork::with_root(PathBuf::from("/nonexistent/raillamp/net"));
        assert!(!network.is_up());
    }
}
