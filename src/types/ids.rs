//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of different ID kinds (e.g., using an
//! OrderId where an OwnerId is expected) and make call sites self-documenting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The entity whose balance an order affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub u64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OwnerId {
    fn from(n: u64) -> Self {
        OwnerId(n)
    }
}

/// A unique order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(n: u64) -> Self {
        OrderId(n)
    }
}
