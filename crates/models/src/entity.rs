use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity and timestamps shared by every stored entity.
///
/// The id is assigned once (caller-supplied or generated) and never changes.
/// `created_at` is set at construction; `updated_at` strictly increases on
/// every successful mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityMeta {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntityMeta {
    pub fn new(id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self { id: id.unwrap_or_else(Uuid::new_v4), created_at: now, updated_at: now }
    }

    /// Refresh `updated_at`. Guaranteed to move forward even if the clock
    /// resolution returns an identical instant for back-to-back mutations.
    pub fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::nanoseconds(1)
        };
    }
}

/// Behavior the generic repository needs from every entity kind.
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;
    fn touch(&mut self);
}
