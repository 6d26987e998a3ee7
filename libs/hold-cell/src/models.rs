use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a slot for locking purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub provider_id: Uuid,
    pub location_id: Uuid,
    pub start_ts: DateTime<Utc>,
}

impl SlotKey {
    pub fn new(provider_id: Uuid, location_id: Uuid, start_ts: DateTime<Utc>) -> Self {
        Self {
            provider_id,
            location_id,
            start_ts,
        }
    }

    /// Cache key: `hold:{provider}:{location}:{start_unix}`.
    pub fn cache_key(&self) -> String {
        format!(
            "hold:{}:{}:{}",
            self.provider_id,
            self.location_id,
            self.start_ts.timestamp()
        )
    }
}

/// Opaque, URL-safe hold token.
///
/// Encodes the slot key plus a random nonce so a lookup by token is a single
/// cache read, and a stale or forged token never matches a live hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HoldId(String);

impl HoldId {
    pub fn mint(key: &SlotKey) -> Self {
        let raw = format!(
            "{}.{}.{}.{}",
            key.provider_id,
            key.location_id,
            key.start_ts.timestamp(),
            Uuid::new_v4().simple()
        );
        Self(URL_SAFE_NO_PAD.encode(raw))
    }

    /// The slot this token claims to hold; `None` if it is not one of ours.
    pub fn slot_key(&self) -> Option<SlotKey> {
        let bytes = URL_SAFE_NO_PAD.decode(self.0.as_bytes()).ok()?;
        let raw = String::from_utf8(bytes).ok()?;

        let mut parts = raw.split('.');
        let provider_id = Uuid::parse_str(parts.next()?).ok()?;
        let location_id = Uuid::parse_str(parts.next()?).ok()?;
        let start_unix: i64 = parts.next()?.parse().ok()?;
        let nonce = parts.next()?;
        if nonce.is_empty() || parts.next().is_some() {
            return None;
        }

        let start_ts = DateTime::from_timestamp(start_unix, 0)?;
        Some(SlotKey::new(provider_id, location_id, start_ts))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for HoldId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for HoldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hold {
    pub hold_id: HoldId,
    pub provider_id: Uuid,
    pub location_id: Uuid,
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
    pub requester_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub ttl_seconds: u64,
}

impl Hold {
    pub fn expires_at(&self) -> DateTime<Utc> {
        let ttl = i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX);
        self.created_at + Duration::seconds(ttl)
    }
}

/// What a caller asks to hold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HoldRequest {
    pub provider_id: Uuid,
    pub location_id: Uuid,
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
}

impl HoldRequest {
    pub fn slot_key(&self) -> SlotKey {
        SlotKey::new(self.provider_id, self.location_id, self.start_ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use chrono::TimeZone;

    fn key() -> SlotKey {
        SlotKey::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Utc.with_ymd_and_hms(2030, 1, 7, 9, 0, 0).unwrap(),
        )
    }

    #[test]
    fn token_decodes_to_its_slot_and_is_unique() {
        let key = key();
        let first = HoldId::mint(&key);
        let second = HoldId::mint(&key);

        assert_ne!(first, second);
        assert_eq!(first.slot_key(), Some(key));
        assert!(first.as_str().chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn garbage_tokens_decode_to_none() {
        assert_eq!(HoldId::from("not a token".to_string()).slot_key(), None);
        assert_eq!(HoldId::from(URL_SAFE_NO_PAD.encode("a.b.c.d")).slot_key(), None);

        let k = key();
        let no_nonce = format!("{}.{}.{}", k.provider_id, k.location_id, k.start_ts.timestamp());
        assert_eq!(HoldId::from(URL_SAFE_NO_PAD.encode(no_nonce)).slot_key(), None);
    }

    #[test]
    fn cache_key_uses_unix_seconds() {
        let k = key();
        assert!(k.cache_key().ends_with(&format!(":{}", k.start_ts.timestamp())));
        assert!(k.cache_key().starts_with("hold:"));
    }
}
