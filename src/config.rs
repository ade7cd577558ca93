use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::time::Duration;

use crate::media::MediaConstraints;
use crate::peer::{IceServer, PeerConfig};

const DEFAULT_STUN_SERVER: &str = "stun:stun.l.google.com:19302";
const DEFAULT_ANSWER_DELAY_MS: u64 = 1_000;
const DEFAULT_SIGNALING_ADDR: &str = "127.0.0.1:7400";

/// INI-like configuration: `[Section]` headers, `key = value` lines, `#` comments.
/// Keys before the first section are globals.
#[derive(Debug, Default)]
pub struct Config {
    pub globals: HashMap<String, String>,
    pub sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    /// Returns a message when the file cannot be read.
    pub fn load(path: &str) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Error reading file {path}: {e}"))?;
        Ok(Self::parse(&content))
    }

    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut cfg = Self::empty();
        let mut current_section: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current_section = Some(name.trim().to_string());
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_string();
                let value = value.trim().trim_matches('"').to_string();
                match &current_section {
                    None => {
                        cfg.globals.insert(key, value);
                    }
                    Some(sec) => {
                        cfg.sections.entry(sec.clone()).or_default().insert(key, value);
                    }
                }
            }
        }
        cfg
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|sec| sec.get(key))
            .map(String::as_str)
    }

    #[must_use]
    pub fn get_non_empty(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn get_global(&self, key: &str) -> Option<&str> {
        self.globals.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn get_non_empty_or_default<'a>(
        &'a self,
        section: &str,
        key: &str,
        default: &'a str,
    ) -> &'a str {
        self.get_non_empty(section, key)
            .or_else(|| self.get_global(key).filter(|s| !s.is_empty()))
            .unwrap_or(default)
    }

    /// Parses `true/false/yes/no/1/0`; anything else yields `default`.
    #[must_use]
    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        match self.get_non_empty(section, key).map(str::to_ascii_lowercase).as_deref() {
            Some("true" | "yes" | "1" | "on") => true,
            Some("false" | "no" | "0" | "off") => false,
            _ => default,
        }
    }

    #[must_use]
    pub fn get_u64(&self, section: &str, key: &str, default: u64) -> u64 {
        self.get_non_empty(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Comma separated list; empty entries are skipped.
    #[must_use]
    pub fn get_list(&self, section: &str, key: &str) -> Vec<String> {
        self.get(section, key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// How the client reaches the remote peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalingMode {
    /// In-process peer that answers every offer after `answer_delay`.
    Loopback { answer_delay: Duration },
    /// Newline-delimited JSON over TCP.
    Tcp { address: String },
}

impl fmt::Display for SignalingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalingMode::Loopback { answer_delay } => {
                write!(f, "loopback (answer after {} ms)", answer_delay.as_millis())
            }
            SignalingMode::Tcp { address } => write!(f, "tcp://{address}"),
        }
    }
}

/// Typed view over the sections the call stack reads.
#[derive(Debug, Clone)]
pub struct CallConfig {
    pub peer: PeerConfig,
    pub media: MediaConstraints,
    pub signaling: SignalingMode,
}

impl CallConfig {
    #[must_use]
    pub fn from_config(cfg: &Config) -> Self {
        let mut ice_servers: Vec<IceServer> = cfg
            .get_list("Ice", "stun_servers")
            .into_iter()
            .map(IceServer::new)
            .collect();
        if cfg.get("Ice", "stun_servers").is_none() {
            ice_servers.push(IceServer::new(DEFAULT_STUN_SERVER));
        }
        ice_servers.extend(cfg.get_list("Ice", "turn_servers").into_iter().map(IceServer::new));

        let media = MediaConstraints {
            audio: cfg.get_bool("Media", "audio", true),
            video: cfg.get_bool("Media", "video", true),
            camera_device: usize::try_from(cfg.get_u64("Media", "camera_device", 0)).unwrap_or(0),
        };

        let signaling = match cfg.get_non_empty_or_default("Signaling", "mode", "loopback") {
            "tcp" => SignalingMode::Tcp {
                address: cfg
                    .get_non_empty_or_default("Signaling", "address", DEFAULT_SIGNALING_ADDR)
                    .to_owned(),
            },
            _ => SignalingMode::Loopback {
                answer_delay: Duration::from_millis(cfg.get_u64(
                    "Signaling",
                    "answer_delay_ms",
                    DEFAULT_ANSWER_DELAY_MS,
                )),
            },
        };

        Self {
            peer: PeerConfig { ice_servers },
            media,
            signaling,
        }
    }
}

impl Default for CallConfig {
    fn default() -> Self {
        Self::from_config(&Config::empty())
    }
}
