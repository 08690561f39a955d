//! 64-bit time-ordered ids.
//!
//! Layout: 42 bits of milliseconds since [`Snowflake::EPOCH`], 10 bits of
//! worker id, 12 bits of per-millisecond sequence. Ids sort by creation
//! time, which lets list endpoints page on the primary key alone.
//!
//! Ids are generated in the service layer, never by the database, so a
//! whole write plan (finalization, roster sync) can be assembled with its
//! ids before the enclosing transaction opens.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const TIMESTAMP_SHIFT: u8 = 22;
const WORKER_SHIFT: u8 = 12;
const WORKER_MAX: u16 = 1 << 10;
const SEQUENCE_MASK: i64 = (1 << WORKER_SHIFT) - 1;

/// Opaque 64-bit id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Snowflake(i64);

impl Snowflake {
    /// 2025-01-01 00:00:00 UTC, in milliseconds
    pub const EPOCH: i64 = 1_735_689_600_000;

    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    /// An all-zero id marks an entity that was never persisted
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Milliseconds since the Unix epoch at which this id was minted
    #[inline]
    pub const fn timestamp_millis(&self) -> i64 {
        (self.0 >> TIMESTAMP_SHIFT) + Self::EPOCH
    }

    pub fn parse(s: &str) -> Result<Self, SnowflakeParseError> {
        s.parse::<i64>()
            .map(Self)
            .map_err(|_| SnowflakeParseError::InvalidFormat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SnowflakeParseError {
    #[error("invalid snowflake format")]
    InvalidFormat,
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Snowflake {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<Snowflake> for i64 {
    fn from(id: Snowflake) -> Self {
        id.0
    }
}

impl std::str::FromStr for Snowflake {
    type Err = SnowflakeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Snowflake::parse(s)
    }
}

// JSON carries ids as strings; i64 overflows JavaScript's number type.
impl Serialize for Snowflake {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw<'a> {
            Number(i64),
            Text(#[serde(borrow)] Cow<'a, str>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self(n)),
            Raw::Text(s) => Self::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}

/// Lock-free id generator
///
/// The whole generator state (timestamp and sequence) lives in one atomic
/// word, advanced by compare-and-swap, so concurrent callers never hand out
/// the same id. Capacity is 4096 ids per worker per millisecond; past that
/// the caller spins into the next millisecond.
pub struct SnowflakeGenerator {
    worker_id: u16,
    // (millis since EPOCH) << WORKER_SHIFT | sequence
    state: AtomicI64,
}

impl SnowflakeGenerator {
    /// # Panics
    /// Panics if `worker_id` does not fit the 10-bit worker field.
    pub fn new(worker_id: u16) -> Self {
        assert!(worker_id < WORKER_MAX, "worker id out of range");
        Self {
            worker_id,
            state: AtomicI64::new(0),
        }
    }

    pub fn generate(&self) -> Snowflake {
        loop {
            let observed = self.state.load(Ordering::Acquire);
            let last_millis = observed >> WORKER_SHIFT;
            let now = Self::now_millis().max(last_millis);

            let next = if now == last_millis {
                let sequence = (observed & SEQUENCE_MASK) + 1;
                if sequence > SEQUENCE_MASK {
                    // Sequence exhausted for this millisecond
                    std::hint::spin_loop();
                    continue;
                }
                (now << WORKER_SHIFT) | sequence
            } else {
                now << WORKER_SHIFT
            };

            if self
                .state
                .compare_exchange_weak(observed, next, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                let millis = next >> WORKER_SHIFT;
                let sequence = next & SEQUENCE_MASK;
                return Snowflake::new(
                    (millis << TIMESTAMP_SHIFT)
                        | (i64::from(self.worker_id) << WORKER_SHIFT)
                        | sequence,
                );
            }
        }
    }

    pub fn worker_id(&self) -> u16 {
        self.worker_id
    }

    fn now_millis() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as i64 - Snowflake::EPOCH)
    }
}

impl Default for SnowflakeGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}
