use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Type preferences, RFC 8445 §5.1.2.2.
const HOST_TYPE_PREF: u32 = 126;
const PEER_REFLEXIVE_TYPE_PREF: u32 = 110;
const SERVER_REFLEXIVE_TYPE_PREF: u32 = 100;
const RELAYED_TYPE_PREF: u32 = 0;

const TYPE_PREF_SHIFT: u32 = 24;
const LOCAL_PREF_SHIFT: u32 = 8;
const COMPONENT_OFFSET: u32 = 256;

/// Connectivity candidate as exchanged over signaling.
///
/// Serialises as `{"candidate": "...", "sdpMid": "0", "sdpMLineIndex": 0}`.
/// A bare JSON string is accepted too and taken as the candidate line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CandidateWire")]
pub struct CandidateRecord {
    pub candidate: String,
    #[serde(rename = "sdpMid", skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(rename = "sdpMLineIndex", skip_serializing_if = "Option::is_none")]
    pub sdp_mline_index: Option<u16>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CandidateWire {
    Line(String),
    Full {
        candidate: String,
        #[serde(rename = "sdpMid", default)]
        sdp_mid: Option<String>,
        #[serde(rename = "sdpMLineIndex", default)]
        sdp_mline_index: Option<u16>,
    },
}

impl From<CandidateWire> for CandidateRecord {
    fn from(wire: CandidateWire) -> Self {
        match wire {
            CandidateWire::Line(candidate) => Self::new(candidate),
            CandidateWire::Full {
                candidate,
                sdp_mid,
                sdp_mline_index,
            } => Self {
                candidate,
                sdp_mid,
                sdp_mline_index,
            },
        }
    }
}

impl CandidateRecord {
    #[must_use]
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_mline_index: None,
        }
    }

    #[must_use]
    pub fn with_mid(mut self, mid: impl Into<String>, mline_index: u16) -> Self {
        self.sdp_mid = Some(mid.into());
        self.sdp_mline_index = Some(mline_index);
        self
    }

    /// Parses the candidate line, if it follows the `candidate:` grammar.
    ///
    /// # Errors
    /// See [`CandidateParseError`].
    pub fn parse_line(&self) -> Result<CandidateLine, CandidateParseError> {
        self.candidate.parse()
    }
}

impl fmt::Display for CandidateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.candidate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateType {
    Host,
    ServerReflexive,
    PeerReflexive,
    Relayed,
}

impl CandidateType {
    #[must_use]
    pub const fn as_sdp(self) -> &'static str {
        match self {
            CandidateType::Host => "host",
            CandidateType::ServerReflexive => "srflx",
            CandidateType::PeerReflexive => "prflx",
            CandidateType::Relayed => "relay",
        }
    }

    const fn type_preference(self) -> u32 {
        match self {
            CandidateType::Host => HOST_TYPE_PREF,
            CandidateType::ServerReflexive => SERVER_REFLEXIVE_TYPE_PREF,
            CandidateType::PeerReflexive => PEER_REFLEXIVE_TYPE_PREF,
            CandidateType::Relayed => RELAYED_TYPE_PREF,
        }
    }
}

impl FromStr for CandidateType {
    type Err = CandidateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "host" => Ok(CandidateType::Host),
            "srflx" => Ok(CandidateType::ServerReflexive),
            "prflx" => Ok(CandidateType::PeerReflexive),
            "relay" => Ok(CandidateType::Relayed),
            other => Err(CandidateParseError::UnknownType(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateParseError {
    MissingParts,
    InvalidComponent,
    InvalidPriority,
    InvalidAddress,
    MissingTyp,
    UnknownType(String),
    InvalidRelated,
}

impl fmt::Display for CandidateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CandidateParseError::*;
        match self {
            MissingParts => write!(f, "candidate line has fewer than 8 fields"),
            InvalidComponent => write!(f, "invalid component id"),
            InvalidPriority => write!(f, "invalid priority"),
            InvalidAddress => write!(f, "invalid connection address or port"),
            MissingTyp => write!(f, "missing 'typ' token"),
            UnknownType(t) => write!(f, "unknown candidate type: {t}"),
            InvalidRelated => write!(f, "invalid raddr/rport"),
        }
    }
}

impl std::error::Error for CandidateParseError {}

/// Structured `candidate:` attribute (RFC 8839 §5.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLine {
    pub foundation: String,
    pub component: u8,
    pub transport: String,
    pub priority: u32,
    pub address: SocketAddr,
    pub cand_type: CandidateType,
    pub related_address: Option<SocketAddr>,
}

impl CandidateLine {
    /// Host candidate with foundation and priority derived from the address.
    #[must_use]
    pub fn host(address: SocketAddr, component: u8) -> Self {
        Self {
            foundation: foundation_for(CandidateType::Host, "udp", address.ip()),
            component,
            transport: "udp".to_owned(),
            priority: priority_for(CandidateType::Host, u16::MAX, component),
            address,
            cand_type: CandidateType::Host,
            related_address: None,
        }
    }

    #[must_use]
    pub fn to_record(&self, mid: &str, mline_index: u16) -> CandidateRecord {
        CandidateRecord::new(self.to_string()).with_mid(mid, mline_index)
    }
}

impl fmt::Display for CandidateLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "candidate:{} {} {} {} {} {} typ {}",
            self.foundation,
            self.component,
            self.transport,
            self.priority,
            self.address.ip(),
            self.address.port(),
            self.cand_type.as_sdp(),
        )?;
        if let Some(rel) = self.related_address {
            write!(f, " raddr {} rport {}", rel.ip(), rel.port())?;
        }
        Ok(())
    }
}

impl FromStr for CandidateLine {
    type Err = CandidateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use CandidateParseError::*;

        let s = s.trim();
        let s = s.strip_prefix("a=").unwrap_or(s);
        let s = s.strip_prefix("candidate:").unwrap_or(s);
        let parts: Vec<&str> = s.split_whitespace().collect();

        let [foundation, component, transport, priority, ip, port, typ, cand_type, rest @ ..] =
            parts.as_slice()
        else {
            return Err(MissingParts);
        };

        let component: u8 = component.parse().map_err(|_| InvalidComponent)?;
        let priority: u32 = priority.parse().map_err(|_| InvalidPriority)?;
        let ip: IpAddr = ip.parse().map_err(|_| InvalidAddress)?;
        let port: u16 = port.parse().map_err(|_| InvalidAddress)?;
        if *typ != "typ" {
            return Err(MissingTyp);
        }
        let cand_type: CandidateType = cand_type.parse()?;

        let mut raddr: Option<IpAddr> = None;
        let mut rport: Option<u16> = None;
        for pair in rest.chunks(2) {
            match pair {
                ["raddr", v] => raddr = Some(v.parse().map_err(|_| InvalidRelated)?),
                ["rport", v] => rport = Some(v.parse().map_err(|_| InvalidRelated)?),
                // generation, ufrag, network-id and friends are ignored
                _ => {}
            }
        }
        let related_address = match (raddr, rport) {
            (Some(ip), Some(port)) => Some(SocketAddr::new(ip, port)),
            (None, None) => None,
            _ => return Err(InvalidRelated),
        };

        Ok(Self {
            foundation: (*foundation).to_owned(),
            component,
            transport: transport.to_ascii_lowercase(),
            priority,
            address: SocketAddr::new(ip, port),
            cand_type,
            related_address,
        })
    }
}

/// RFC 8445 §5.1.1.3: any stable identifier for (type, transport, base ip).
fn foundation_for(cand_type: CandidateType, transport: &str, base_ip: IpAddr) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    (cand_type.as_sdp(), transport, base_ip).hash(&mut hasher);
    format!("{:x}", hasher.finish() & 0xffff_ffff)
}

/// RFC 8445 §5.1.2.1.
const fn priority_for(cand_type: CandidateType, local_pref: u16, component: u8) -> u32 {
    (cand_type.type_preference() << TYPE_PREF_SHIFT)
        | ((local_pref as u32) << LOCAL_PREF_SHIFT)
        | (COMPONENT_OFFSET - component as u32)
}
