//! Normalized participant pair.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::domain::foundation::{UserId, ValidationError};

/// The two users of a conversation, stored in byte order.
///
/// # Invariants
///
/// - `low < high`, so `{a, b}` and `{b, a}` produce the same pair
/// - the two ids are never equal
///
/// The normalized form is what the storage layer puts a unique constraint on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<UserId>", into = "Vec<UserId>")]
pub struct ParticipantPair {
    low: UserId,
    high: UserId,
}

impl ParticipantPair {
    /// Builds the pair from two users in either order.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` if both ids are the same user
    pub fn new(a: UserId, b: UserId) -> Result<Self, ValidationError> {
        match a.cmp(&b) {
            Ordering::Less => Ok(Self { low: a, high: b }),
            Ordering::Greater => Ok(Self { low: b, high: a }),
            Ordering::Equal => Err(ValidationError::invalid_format(
                "participants",
                "a conversation needs two different users",
            )),
        }
    }

    pub fn low(&self) -> &UserId {
        &self.low
    }

    pub fn high(&self) -> &UserId {
        &self.high
    }

    pub fn contains(&self, user: &UserId) -> bool {
        &self.low == user || &self.high == user
    }

    /// Returns the participant that is not `user`, or `None` if `user`
    /// is not part of the pair.
    pub fn other(&self, user: &UserId) -> Option<&UserId> {
        if &self.low == user {
            Some(&self.high)
        } else if &self.high == user {
            Some(&self.low)
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserId> {
        [&self.low, &self.high].into_iter()
    }
}

impl TryFrom<Vec<UserId>> for ParticipantPair {
    type Error = ValidationError;

    fn try_from(ids: Vec<UserId>) -> Result<Self, Self::Error> {
        let [a, b]: [UserId; 2] = ids.try_into().map_err(|ids: Vec<UserId>| {
            ValidationError::invalid_format(
                "participants",
                format!("expected 2 participants, got {}", ids.len()),
            )
        })?;
        Self::new(a, b)
    }
}

impl From<ParticipantPair> for Vec<UserId> {
    fn from(pair: ParticipantPair) -> Self {
        vec![pair.low, pair.high]
    }
}
