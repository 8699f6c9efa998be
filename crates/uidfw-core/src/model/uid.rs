//! Validated application identity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FirewallError;

/// Numeric identity of the application whose traffic is classified.
///
/// Negative values are rejected at the boundary, so a `Uid` always fits the
/// non-negative half of `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Uid(u32);

impl Uid {
    /// Largest UID representable on the wire.
    pub const MAX: Uid = Uid(i32::MAX as u32);

    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Wire value. Always non-negative.
    pub fn as_raw(self) -> i32 {
        self.0 as i32
    }
}

impl TryFrom<i32> for Uid {
    type Error = FirewallError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        if raw < 0 {
            return Err(FirewallError::InvalidUid(raw as i64));
        }
        Ok(Uid(raw as u32))
    }
}

impl TryFrom<i64> for Uid {
    type Error = FirewallError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        if !(0..=i32::MAX as i64).contains(&raw) {
            return Err(FirewallError::InvalidUid(raw));
        }
        Ok(Uid(raw as u32))
    }
}

impl From<Uid> for i64 {
    fn from(uid: Uid) -> Self {
        uid.0 as i64
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
