//! Hybrid logical clock
//!
//! Orders field-level edits across independent writers. A clock value
//! combines milliseconds since a fixed epoch, a logical counter that
//! disambiguates same-millisecond events, and a fixed-width writer id.
//!
//! The encoded form is 16 uppercase characters: 10 hex digits of time,
//! 3 hex digits of counter, 3 characters of node id. Zero-padding makes
//! lexicographic comparison of the encoded form agree with causal order.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Clock epoch: 2020-01-01T00:00:00Z, in Unix milliseconds.
///
/// A 40-bit millisecond field relative to this epoch is valid until 2054.
pub const EPOCH_UNIX_MS: i64 = 1_577_836_800_000;

/// Maximum encodable time (10 hex digits).
const MAX_TIME_MS: u64 = 0xFF_FFFF_FFFF;

/// Maximum encodable counter (3 hex digits).
const MAX_COUNTER: u16 = 0xFFF;

/// Node id character set (sorts consistently with the encoded form).
const NODE_CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Fixed-width writer identifier (3 characters, `[0-9A-Z]`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId([u8; 3]);

impl NodeId {
    /// Placeholder writer id for rows mid-hydration
    pub(crate) const ZERO: NodeId = NodeId(*b"000");

    /// Parse a node id, enforcing width and character set
    pub fn parse(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(|b| NODE_CHARSET.contains(b)) {
            return Err(Error::Validation(format!(
                "node id must be 3 characters of [0-9A-Z], got {:?}",
                s
            )));
        }
        Ok(Self([bytes[0], bytes[1], bytes[2]]))
    }

    /// Generate a random node id
    pub fn generate() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; 3];
        for b in &mut bytes {
            *b = NODE_CHARSET[rng.gen_range(0..NODE_CHARSET.len())];
        }
        Self(bytes)
    }

    /// Get as string slice
    pub fn as_str(&self) -> &str {
        // Constructed only from NODE_CHARSET, always valid ASCII
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Hybrid logical clock value
///
/// Total order is (time, counter, node); the derived `Ord` matches
/// lexicographic order of the encoded string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HybridLogicalClock {
    /// Milliseconds since [`EPOCH_UNIX_MS`]
    time_ms: u64,
    /// Logical counter within one millisecond
    counter: u16,
    /// Writer id, preserved across advances and merges
    node: NodeId,
}

impl HybridLogicalClock {
    /// Initial clock for a writer: current wall time, counter zero
    pub fn init(node: NodeId) -> Self {
        Self {
            time_ms: now_ms(),
            counter: 0,
            node,
        }
    }

    /// Construct from raw parts, truncating to the encodable widths
    pub fn from_parts(time_ms: u64, counter: u16, node: NodeId) -> Self {
        Self {
            time_ms: time_ms.min(MAX_TIME_MS),
            counter: counter.min(MAX_COUNTER),
            node,
        }
    }

    /// Next clock for a new local event; strictly greater than `self`
    /// everywhere below the encoding ceiling, where it saturates
    pub fn advance(&self) -> Self {
        let now = now_ms();
        if now > self.time_ms {
            Self {
                time_ms: now,
                counter: 0,
                node: self.node,
            }
        } else {
            let (time_ms, counter) = bump(self.time_ms, self.counter);
            Self {
                time_ms,
                counter,
                node: self.node,
            }
        }
    }

    /// Clock for an event caused by receiving `remote`; strictly greater
    /// than both inputs. The node id is preserved from `self`.
    pub fn merge(&self, remote: &Self) -> Self {
        let now = now_ms();
        let time_ms = self.time_ms.max(remote.time_ms).max(now);

        let (time_ms, counter) = if time_ms == self.time_ms && time_ms == remote.time_ms {
            bump(time_ms, self.counter.max(remote.counter))
        } else if time_ms == self.time_ms {
            bump(time_ms, self.counter)
        } else if time_ms == remote.time_ms {
            bump(time_ms, remote.counter)
        } else {
            // Wall clock raced ahead of both inputs
            (time_ms, 0)
        };

        Self {
            time_ms,
            counter,
            node: self.node,
        }
    }

    /// Milliseconds since the clock epoch
    pub fn time_ms(&self) -> u64 {
        self.time_ms
    }

    /// Logical counter
    pub fn counter(&self) -> u16 {
        self.counter
    }

    /// Writer id
    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// Increment a counter, rolling into the next millisecond when the
/// 3-hex-digit width is exhausted. At the encoding ceiling the clock
/// saturates instead of widening past 10 hex digits of time, so every
/// produced value round-trips through the 16-character form.
fn bump(time_ms: u64, counter: u16) -> (u64, u16) {
    if counter < MAX_COUNTER {
        (time_ms, counter + 1)
    } else if time_ms < MAX_TIME_MS {
        (time_ms + 1, 0)
    } else {
        (MAX_TIME_MS, MAX_COUNTER)
    }
}

/// Current wall time in epoch milliseconds, clamped to the encodable range
fn now_ms() -> u64 {
    let unix_ms = chrono::Utc::now().timestamp_millis();
    let relative = unix_ms.saturating_sub(EPOCH_UNIX_MS).max(0) as u64;
    relative.min(MAX_TIME_MS)
}

impl fmt::Display for HybridLogicalClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:010X}{:03X}{}", self.time_ms, self.counter, self.node)
    }
}

impl FromStr for HybridLogicalClock {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 16 || !s.is_ascii() {
            return Err(Error::Validation(format!(
                "clock must be 16 ASCII characters, got {:?}",
                s
            )));
        }
        let time_ms = u64::from_str_radix(&s[..10], 16)
            .map_err(|_| Error::Validation(format!("bad clock time in {:?}", s)))?;
        let counter = u16::from_str_radix(&s[10..13], 16)
            .map_err(|_| Error::Validation(format!("bad clock counter in {:?}", s)))?;
        let node = NodeId::parse(&s[13..16])?;
        Ok(Self {
            time_ms,
            counter,
            node,
        })
    }
}

impl Serialize for HybridLogicalClock {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HybridLogicalClock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
