use std::fmt::Write as _;

use rand::{Rng, RngCore, rngs::OsRng};

use crate::{media::TrackKind, peer::SdpKind};

const DISCARD_PORT: u16 = 9;
const MEDIA_PROTO: &str = "UDP/TLS/RTP/SAVPF";
const CONN_ADDR: &str = "0.0.0.0";
const SESSION_NAME: &str = "rustycall";
const OPUS_PT: u8 = 111;
const VP8_PT: u8 = 96;

/// ICE username fragment and password (RFC 8445 §5.3: ufrag >= 4 chars, pwd >= 22).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IceCredentials {
    pub ufrag: String,
    pub pwd: String,
}

impl IceCredentials {
    #[must_use]
    pub fn generate() -> Self {
        Self {
            ufrag: gen_token(8),
            pwd: gen_token(24),
        }
    }
}

fn gen_token(len: usize) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    (0..len)
        .map(|_| char::from(ALPHABET[OsRng.gen_range(0..ALPHABET.len())]))
        .collect()
}

/// Renders a BUNDLE'd description with one m-section per track kind, in the
/// order given. With no tracks a receive-only video section is emitted so the
/// remote side can still send.
#[must_use]
pub fn build_session_description(
    kind: SdpKind,
    tracks: &[TrackKind],
    creds: &IceCredentials,
) -> String {
    let session_id = OsRng.next_u64() >> 1;
    let (sections, direction): (Vec<TrackKind>, &str) = if tracks.is_empty() {
        (vec![TrackKind::Video], "recvonly")
    } else {
        (tracks.to_vec(), "sendrecv")
    };

    let mut sdp = String::new();
    let _ = writeln!(sdp, "v=0");
    let _ = writeln!(sdp, "o=- {session_id} 2 IN IP4 127.0.0.1");
    let _ = writeln!(sdp, "s={SESSION_NAME}");
    let _ = writeln!(sdp, "t=0 0");
    let mids: Vec<String> = (0..sections.len()).map(|i| i.to_string()).collect();
    let _ = writeln!(sdp, "a=group:BUNDLE {}", mids.join(" "));

    for (mid, track) in mids.iter().zip(&sections) {
        let (media, pt, rtpmap) = match track {
            TrackKind::Audio => ("audio", OPUS_PT, "opus/48000/2"),
            TrackKind::Video => ("video", VP8_PT, "VP8/90000"),
        };
        let _ = writeln!(sdp, "m={media} {DISCARD_PORT} {MEDIA_PROTO} {pt}");
        let _ = writeln!(sdp, "c=IN IP4 {CONN_ADDR}");
        let _ = writeln!(sdp, "a=mid:{mid}");
        let _ = writeln!(sdp, "a=ice-ufrag:{}", creds.ufrag);
        let _ = writeln!(sdp, "a=ice-pwd:{}", creds.pwd);
        let setup = match kind {
            SdpKind::Offer => "actpass",
            SdpKind::Answer => "active",
        };
        let _ = writeln!(sdp, "a=setup:{setup}");
        let _ = writeln!(sdp, "a={direction}");
        let _ = writeln!(sdp, "a=rtcp-mux");
        let _ = writeln!(sdp, "a=rtpmap:{pt} {rtpmap}");
    }
    sdp
}

/// Count of `m=` sections, used to sanity-check descriptions.
#[must_use]
pub fn media_section_count(sdp: &str) -> usize {
    sdp.lines().filter(|l| l.starts_with("m=")).count()
}
