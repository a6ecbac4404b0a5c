use crate::{CredGraphError, Result};
use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Node type marker used by the identity plugin for participant nodes.
pub const IDENTITY_NODE_TYPE: &str = "IDENTITY";

/// Plugin label attached to flow rows whose prefix no plugin owns.
pub const PLUGIN_NOT_FOUND: &str = "Not Found";

/// Separator between address parts in serialized node and edge addresses.
pub const ADDRESS_SEPARATOR: char = '\0';

/// Number of decimal digits carried by grain amounts.
pub const GRAIN_DECIMALS: u32 = 18;

const ONE_GRAIN: i128 = 10i128.pow(GRAIN_DECIMALS);

/// Epoch milliseconds as they appear in the exports.
pub type TimestampMs = i64;

/// Signed 18-decimal fixed-point grain amount.
///
/// Exports encode amounts as decimal integer strings scaled by 10^18
/// (`"2500000000000000000"` is 2.5 grain). The raw integer is kept exact;
/// [`GrainAmount::to_f64`] converts the integer and fractional parts
/// separately so small fractions survive large balances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GrainAmount(i128);

impl GrainAmount {
    pub const ZERO: GrainAmount = GrainAmount(0);

    pub fn from_raw(raw: i128) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> i128 {
        self.0
    }

    pub fn to_f64(self) -> f64 {
        let whole = self.0 / ONE_GRAIN;
        let frac = self.0 % ONE_GRAIN;
        whole as f64 + frac as f64 / ONE_GRAIN as f64
    }
}

impl FromStr for GrainAmount {
    type Err = CredGraphError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix(|c: char| c == '-' || c == '+').unwrap_or(trimmed);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CredGraphError::InvalidAmount(s.to_string()));
        }
        trimmed
            .parse::<i128>()
            .map(GrainAmount)
            .map_err(|_| CredGraphError::InvalidAmount(s.to_string()))
    }
}

impl fmt::Display for GrainAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for GrainAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GrainAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct AmountVisitor;

        impl<'de> Visitor<'de> for AmountVisitor {
            type Value = GrainAmount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an 18-decimal fixed-point integer string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<GrainAmount, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<GrainAmount, E> {
                Ok(GrainAmount(v as i128))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<GrainAmount, E> {
                Ok(GrainAmount(v as i128))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Converts export epoch milliseconds to a UTC timestamp.
pub fn datetime_from_millis(ms: TimestampMs) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| CredGraphError::Schema(format!("timestamp out of range: {}ms", ms)))
}
