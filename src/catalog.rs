//! The immutable service catalog.
//!
//! The catalog seeds the registry on startup and is the only source of a
//! service's public endpoint. Registry rows may drift from it after being
//! edited, the catalog never does.

use crate::{CheckMode, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A service as declared in the catalog.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub display_name: String,
    #[serde(default, alias = "url")]
    pub endpoint: Option<String>,
    #[serde(default, alias = "public_url")]
    pub public_endpoint: Option<String>,
    #[serde(alias = "check_type")]
    pub mode: CheckMode,
    #[serde(default, alias = "docker_container")]
    pub container: Option<String>,
    #[serde(default, alias = "icon_emoji")]
    pub icon: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl CatalogEntry {
    /// Checks that the probes required by `mode` have something to probe.
    pub fn validate(&self) -> Result<()> {
        let missing = match self.mode {
            CheckMode::Network if self.endpoint.is_none() => {
                Some("network mode requires an endpoint")
            }
            CheckMode::Process if self.container.is_none() => {
                Some("process mode requires a container")
            }
            CheckMode::Both if self.endpoint.is_none() || self.container.is_none() => {
                Some("both mode requires an endpoint and a container")
            }
            _ => None,
        };

        match missing {
            Some(reason) => Err(Error::InvalidService {
                name: self.name.clone(),
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Builds a catalog, rejecting invalid entries and duplicate names.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self> {
        for (i, entry) in entries.iter().enumerate() {
            entry.validate()?;
            if entries[..i].iter().any(|e| e.name == entry.name) {
                return Err(Error::InvalidService {
                    name: entry.name.clone(),
                    reason: "duplicate name".to_string(),
                });
            }
        }
        Ok(Self { entries })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| Error::CatalogIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// The catalog shipped with the dashboard.
    #[must_use]
    pub fn bundled() -> Self {
        Self {
            entries: bundled_entries(),
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Looks up the externally reachable endpoint for `name`.
    #[must_use]
    pub fn public_endpoint(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.public_endpoint.as_deref())
    }
}

fn entry(
    name: &str,
    display_name: &str,
    endpoint: Option<&str>,
    public_endpoint: Option<&str>,
    mode: CheckMode,
    container: Option<&str>,
    icon: &str,
) -> CatalogEntry {
    CatalogEntry {
        name: name.to_string(),
        display_name: display_name.to_string(),
        endpoint: endpoint.map(str::to_string),
        public_endpoint: public_endpoint.map(str::to_string),
        mode,
        container: container.map(str::to_string),
        icon: Some(icon.to_string()),
        enabled: true,
    }
}

fn bundled_entries() -> Vec<CatalogEntry> {
    use CheckMode::{Both, Network, Process};

    vec![
        entry(
            "n8n",
            "n8n Workflows",
            Some("https://ashaman-1.tail125d67.ts.net:5678"),
            Some("https://ashaman-1.tail125d67.ts.net:5678"),
            Both,
            Some("n8n"),
            "⚡",
        ),
        entry(
            "jellyfin",
            "Jellyfin Media",
            Some("http://ashaman-1.tail125d67.ts.net:8096"),
            Some("http://ashaman-1.tail125d67.ts.net:8096"),
            Network,
            Some("jellyfin"),
            "🎬",
        ),
        entry(
            "qbittorrent",
            "qBittorrent",
            Some("http://100.73.108.55:8080"),
            Some("http://100.73.108.55:8080"),
            Network,
            Some("qbittorrent"),
            "🌊",
        ),
        entry(
            "open-webui",
            "Open WebUI",
            Some("http://host.docker.internal:3000"),
            Some("http://100.110.245.37:3000"),
            Network,
            Some("open-webui"),
            "🧠",
        ),
        entry(
            "discord-relay",
            "Discord Relay",
            None,
            None,
            Process,
            Some("claude-relay"),
            "🤖",
        ),
        entry(
            "cloudflared",
            "Cloudflare Tunnel",
            None,
            None,
            Process,
            Some("cloudflared-tunnel"),
            "☁️",
        ),
        entry(
            "scan-runner",
            "Scan Runner",
            None,
            None,
            Process,
            Some("scan-runner"),
            "📦",
        ),
        entry(
            "uptime-kuma",
            "Uptime Kuma",
            Some("http://host.docker.internal:3001"),
            Some("http://100.110.245.37:3001"),
            Network,
            Some("uptime-kuma"),
            "📊",
        ),
        entry(
            "home-assistant",
            "Home Assistant",
            Some("http://192.168.1.70:8123"),
            Some("http://192.168.1.70:8123"),
            Network,
            None,
            "🏠",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalog_is_valid() {
        let bundled = Catalog::bundled();
        let rebuilt = Catalog::new(bundled.entries().to_vec()).unwrap();
        assert_eq!(rebuilt.entries().len(), 9);
    }

    #[test]
    fn public_endpoint_differs_from_probed_endpoint() {
        let catalog = Catalog::bundled();
        assert_eq!(
            catalog.public_endpoint("open-webui"),
            Some("http://100.110.245.37:3000")
        );
        assert_eq!(catalog.public_endpoint("cloudflared"), None);
        assert_eq!(catalog.public_endpoint("missing"), None);
    }

    #[test]
    fn both_mode_without_container_is_rejected() {
        let json = r#"[{
            "name": "web",
            "display_name": "Web",
            "url": "http://localhost:80",
            "check_type": "both"
        }]"#;
        match Catalog::from_json(json) {
            Err(Error::InvalidService { name, .. }) => assert_eq!(name, "web"),
            other => panic!("expected InvalidService, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let json = r#"[
            {"name": "a", "display_name": "A", "mode": "process", "container": "a"},
            {"name": "a", "display_name": "A2", "mode": "process", "container": "b"}
        ]"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(Error::InvalidService { .. })
        ));
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let json = r#"[{
            "name": "relay",
            "display_name": "Relay",
            "check_type": "docker",
            "docker_container": "relay",
            "icon_emoji": "🤖"
        }]"#;
        let catalog = Catalog::from_json(json).unwrap();
        let entry = &catalog.entries()[0];
        assert_eq!(entry.mode, CheckMode::Process);
        assert_eq!(entry.container.as_deref(), Some("relay"));
        assert!(entry.enabled);
    }
}
