//! The order value submitted for processing.

use serde::{Deserialize, Serialize};

use super::{OrderId, OwnerId};

/// One unit of work: apply `amount` to `owner`'s balance.
///
/// Orders are immutable values carrying no identity beyond their fields; they
/// are not retained after application. `amount` is in the smallest currency
/// unit and may be negative — sign and range validation is the caller's
/// concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier for the order.
    pub id: OrderId,
    /// Owner whose balance the order affects.
    pub owner: OwnerId,
    /// Amount to add, in the smallest currency unit.
    pub amount: i64,
}

impl Order {
    pub fn new(id: impl Into<OrderId>, owner: impl Into<OwnerId>, amount: i64) -> Self {
        Order {
            id: id.into(),
            owner: owner.into(),
            amount,
        }
    }
}
