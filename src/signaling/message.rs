use serde::{Deserialize, Serialize};

use crate::{ice::CandidateRecord, signaling::SignalingError};

/// Envelope exchanged verbatim over the signaling channel.
///
/// ```json
/// {"type":"offer","sdp":"v=0..."}
/// {"type":"answer","sdp":"v=0..."}
/// {"type":"candidate","candidate":{"candidate":"candidate:1 1 udp ...","sdpMid":"0","sdpMLineIndex":0}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SignalingMessage {
    Offer { sdp: String },
    Answer { sdp: String },
    Candidate { candidate: CandidateRecord },
}

impl SignalingMessage {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self::Offer { sdp: sdp.into() }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self::Answer { sdp: sdp.into() }
    }

    #[must_use]
    pub fn candidate(candidate: CandidateRecord) -> Self {
        Self::Candidate { candidate }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::Candidate { .. } => "candidate",
        }
    }

    /// # Errors
    /// [`SignalingError::Encode`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, SignalingError> {
        serde_json::to_string(self).map_err(SignalingError::Encode)
    }

    /// # Errors
    /// [`SignalingError::Decode`] for malformed JSON or an unknown `type`.
    pub fn from_json(text: &str) -> Result<Self, SignalingError> {
        serde_json::from_str(text).map_err(SignalingError::Decode)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn offer_envelope_shape() {
        let json = SignalingMessage::offer("O1").to_json().expect("encode");
        assert_eq!(json, r#"{"type":"offer","sdp":"O1"}"#);
    }

    #[test]
    fn decodes_candidate_in_both_forms() {
        let short = SignalingMessage::from_json(r#"{"type":"candidate","candidate":"c1"}"#)
            .expect("bare candidate string");
        assert_eq!(short, SignalingMessage::candidate(CandidateRecord::new("c1")));

        let long = SignalingMessage::from_json(
            r#"{"type":"candidate","candidate":{"candidate":"c2","sdpMid":"0","sdpMLineIndex":0}}"#,
        )
        .expect("object candidate");
        assert_eq!(
            long,
            SignalingMessage::candidate(CandidateRecord::new("c2").with_mid("0", 0))
        );
        assert_eq!(long.kind(), "candidate");
    }

    #[test]
    fn rejects_unknown_type_and_missing_fields() {
        assert!(matches!(
            SignalingMessage::from_json(r#"{"type":"bye"}"#),
            Err(SignalingError::Decode(_))
        ));
        assert!(matches!(
            SignalingMessage::from_json(r#"{"type":"answer"}"#),
            Err(SignalingError::Decode(_))
        ));
    }
}
