//! Conversation aggregate.

use crate::domain::foundation::{ConversationId, Timestamp, UserId, ValidationError};

use super::ParticipantPair;

/// A persistent two-party chat thread.
///
/// `updated_at` tracks the most recent activity and drives list ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    id: ConversationId,
    participants: ParticipantPair,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Conversation {
    /// Starts a new conversation between two users.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` if `a` and `b` are the same user
    pub fn start(a: UserId, b: UserId) -> Result<Self, ValidationError> {
        let now = Timestamp::now();
        Ok(Self {
            id: ConversationId::new(),
            participants: ParticipantPair::new(a, b)?,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstitutes a conversation from persistence.
    pub fn reconstitute(
        id: ConversationId,
        participants: ParticipantPair,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            participants,
            created_at,
            updated_at,
        }
    }

    // === Accessors ===

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn participants(&self) -> &ParticipantPair {
        &self.participants
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn includes(&self, user: &UserId) -> bool {
        self.participants.contains(user)
    }

    /// The other participant from `user`'s point of view.
    pub fn counterpart_of(&self, user: &UserId) -> Option<&UserId> {
        self.participants.other(user)
    }

    /// Records activity. `updated_at` never moves backwards.
    pub fn touch(&mut self, at: Timestamp) {
        if at.is_after(&self.updated_at) {
            self.updated_at = at;
        }
    }
}
