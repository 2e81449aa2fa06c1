//! Out-of-band events delivered from the host to input providers.
//!
//! On the wire an event is a four-character tag, a target device id and an
//! opaque payload. The tag decides how the payload is decoded; unknown tags
//! are rejected, never guessed at.
//!
//! ## Tags and payloads
//! | Event | Tag | Payload |
//! |---|---|---|
//! | [`InputEvent::Recenter`] | `XRC0` | empty |
//! | [`InputEvent::SimpleRumble`] | `XRR0` | `f32` amplitude `[0, 1]`, `f32` duration (s), both little-endian |
//!
//! Tags are packed big-endian the way a C multi-character literal is, so
//! `'XRC0'` is `0x5852_4330`.

use serde::{Deserialize, Serialize};

use crate::error::{Result, XrError};

const fn fourcc(tag: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*tag)
}

/// Known event tags.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputEventType {
    Recenter = fourcc(b"XRC0"),
    SimpleRumble = fourcc(b"XRR0"),
}

impl InputEventType {
    pub fn from_tag(tag: u32) -> Option<Self> {
        if tag == InputEventType::Recenter as u32 {
            Some(InputEventType::Recenter)
        } else if tag == InputEventType::SimpleRumble as u32 {
            Some(InputEventType::SimpleRumble)
        } else {
            None
        }
    }

    #[inline]
    pub fn tag(self) -> u32 {
        self as u32
    }
}

/// Decoded event.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Reset the tracking origin to the current pose.
    Recenter,
    /// Fire a single haptic pulse.
    SimpleRumble {
        /// Normalized strength in `[0, 1]`.
        amplitude: f32,
        /// Pulse length in seconds.
        duration: f32,
    },
}

const RUMBLE_PAYLOAD_LEN: usize = 8;

impl InputEvent {
    pub fn event_type(&self) -> InputEventType {
        match self {
            InputEvent::Recenter => InputEventType::Recenter,
            InputEvent::SimpleRumble { .. } => InputEventType::SimpleRumble,
        }
    }

    /// Decode a tagged payload.
    ///
    /// Unknown tags fail with [`XrError::UnknownEventTag`]; a payload that does
    /// not fit its tag fails with [`XrError::MalformedPayload`].
    pub fn decode(tag: u32, payload: &[u8]) -> Result<Self> {
        match InputEventType::from_tag(tag).ok_or(XrError::UnknownEventTag(tag))? {
            InputEventType::Recenter => {
                if !payload.is_empty() {
                    return Err(XrError::MalformedPayload {
                        event: "recenter",
                        reason: "expected an empty payload",
                    });
                }
                Ok(InputEvent::Recenter)
            }
            InputEventType::SimpleRumble => {
                let bytes: &[u8; RUMBLE_PAYLOAD_LEN] =
                    payload.try_into().map_err(|_| XrError::MalformedPayload {
                        event: "rumble",
                        reason: "expected 8 bytes",
                    })?;
                let [a0, a1, a2, a3, d0, d1, d2, d3] = *bytes;
                let amplitude = f32::from_le_bytes([a0, a1, a2, a3]);
                let duration = f32::from_le_bytes([d0, d1, d2, d3]);
                if !(0.0..=1.0).contains(&amplitude) {
                    return Err(XrError::MalformedPayload {
                        event: "rumble",
                        reason: "amplitude outside [0, 1]",
                    });
                }
                if !duration.is_finite() || duration < 0.0 {
                    return Err(XrError::MalformedPayload {
                        event: "rumble",
                        reason: "duration must be finite and non-negative",
                    });
                }
                Ok(InputEvent::SimpleRumble {
                    amplitude,
                    duration,
                })
            }
        }
    }

    /// Encode into `(tag, payload)` as accepted by [`decode`](Self::decode).
    pub fn encode(&self) -> (u32, Vec<u8>) {
        match *self {
            InputEvent::Recenter => (InputEventType::Recenter.tag(), Vec::new()),
            InputEvent::SimpleRumble {
                amplitude,
                duration,
            } => {
                let mut payload = Vec::with_capacity(RUMBLE_PAYLOAD_LEN);
                payload.extend_from_slice(&amplitude.to_le_bytes());
                payload.extend_from_slice(&duration.to_le_bytes());
                (InputEventType::SimpleRumble.tag(), payload)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Status;

    #[test]
    fn tags_match_multichar_literals() {
        assert_eq!(InputEventType::Recenter.tag(), 0x5852_4330);
        assert_eq!(InputEventType::SimpleRumble.tag(), 0x5852_5230);
        assert_eq!(InputEventType::from_tag(0x5852_5230), Some(InputEventType::SimpleRumble));
        assert_eq!(InputEventType::from_tag(0), None);
    }

    #[test]
    fn unknown_tag_is_failure() {
        let err = InputEvent::decode(fourcc(b"XRZ9"), &[]);
        assert!(matches!(err, Err(XrError::UnknownEventTag(_))));
        assert_eq!(err.map_err(|e| e.status()).err(), Some(Status::Failure));
    }

    #[test]
    fn rumble_payload_is_validated() {
        let tag = InputEventType::SimpleRumble.tag();
        assert!(InputEvent::decode(tag, &[0; 7]).is_err());

        let mut payload = Vec::new();
        payload.extend_from_slice(&1.5f32.to_le_bytes());
        payload.extend_from_slice(&0.1f32.to_le_bytes());
        assert!(InputEvent::decode(tag, &payload).is_err());

        let ok = InputEvent::SimpleRumble {
            amplitude: 0.25,
            duration: 0.5,
        };
        let (tag, payload) = ok.encode();
        assert_eq!(payload.len(), 8);
        assert_eq!(InputEvent::decode(tag, &payload).ok(), Some(ok));
    }

    #[test]
    fn recenter_rejects_payload() {
        let tag = InputEventType::Recenter.tag();
        assert_eq!(InputEvent::decode(tag, &[]).ok(), Some(InputEvent::Recenter));
        let err = InputEvent::decode(tag, &[1]).map_err(|e| e.status()).err();
        assert_eq!(err, Some(Status::InvalidArguments));
    }
}
