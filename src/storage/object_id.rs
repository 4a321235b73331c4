use std::fmt::{Display, Formatter, Write as _};
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Process-wide random component, drawn once like a document-database object id.
static PROCESS_NONCE: Lazy<[u8; 5]> = Lazy::new(|| {
    let mut buf = [0u8; 5];
    fill_random(&mut buf, "process nonce");
    buf
});

static COUNTER: Lazy<AtomicU32> = Lazy::new(|| {
    let mut buf = [0u8; 4];
    fill_random(&mut buf, "counter seed");
    AtomicU32::new(u32::from_be_bytes(buf))
});

/// Ids stay unique within the process without entropy, but not across processes.
fn fill_random(buf: &mut [u8], what: &str) {
    if let Err(e) = getrandom::getrandom(buf) {
        warn!(target: "taskboard::storage", error = %e, "no entropy for object id {}; falling back to a time-derived value", what);
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default().to_be_bytes();
        for (b, n) in buf.iter_mut().zip(nanos.iter().rev()) { *b = *n; }
    }
}

/// 12-byte document identifier rendered as 24 lowercase hex characters:
/// 4 bytes of unix seconds, 5 bytes of process nonce and a 3 byte counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid object id: {0:?}")]
pub struct InvalidObjectId(pub String);

impl ObjectId {
    pub fn new() -> Self {
        let secs = chrono::Utc::now().timestamp().max(0) as u32;
        let count = COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;
        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_NONCE);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        let mut s = String::with_capacity(24);
        for b in &bytes { let _ = write!(&mut s, "{:02x}", b); }
        ObjectId(s)
    }

    /// Accepts exactly 24 hex characters (any case); anything else is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some(ObjectId(s.to_ascii_lowercase()))
        } else {
            None
        }
    }

    pub fn is_valid(s: &str) -> bool { Self::parse(s).is_some() }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl Default for ObjectId {
    fn default() -> Self { Self::new() }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}

impl FromStr for ObjectId {
    type Err = InvalidObjectId;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| InvalidObjectId(s.to_string()))
    }
}

impl TryFrom<String> for ObjectId {
    type Error = InvalidObjectId;
    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self { id.0 }
}
