use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Maximum length of the optional location field
pub const LOCATION_MAX_LEN: usize = 100;

/// A user-submitted endorsement, owned by exactly one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Testimonial {
    pub id: Uuid,
    pub author_id: Uuid,
    /// Author's first name when set, otherwise username. Read-only projection.
    pub author_name: String,
    pub location: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Testimonial {
    pub fn is_authored_by(&self, account_id: Uuid) -> bool {
        self.author_id == account_id
    }
}

impl std::fmt::Display for Testimonial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "testimonial by {} ({})",
            self.author_name,
            self.location.as_deref().unwrap_or("No Location")
        )
    }
}

/// Insert payload. The author comes from the session, never from the form.
#[derive(Debug, Clone)]
pub struct NewTestimonial {
    pub author_id: Uuid,
    pub location: Option<String>,
    pub body: String,
}

/// Mutable fields of an existing testimonial
#[derive(Debug, Clone)]
pub struct TestimonialChanges {
    pub location: Option<String>,
    pub body: String,
}
