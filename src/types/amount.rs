use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub, Neg};
use std::fmt;

/// Monetary amount in minor currency units (signed).
///
/// Repaid amounts are derived by subtraction and may legitimately go
/// negative when a caller sets a remaining amount above the initial one;
/// the sign is preserved rather than clamped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(i64);

impl Amount {
    pub fn from_i64(value: i64) -> Self {
        Amount(value)
    }

    pub fn to_i64(&self) -> i64 {
        self.0
    }

    pub fn zero() -> Self {
        Amount(0)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Add for Amount {
    type Output = Amount;
    fn add(self, other: Amount) -> Amount {
        Amount(self.0 + other.0)
    }
}

impl Sub for Amount {
    type Output = Amount;
    fn sub(self, other: Amount) -> Amount {
        Amount(self.0 - other.0)
    }
}

impl Neg for Amount {
    type Output = Amount;
    fn neg(self) -> Amount {
        Amount(-self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
