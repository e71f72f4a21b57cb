/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Operations a principal can attempt against testimonials.
/// Used by the authorization policy and by the request handlers that consult it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
    Dashboard, // Portal statistics page
}

/// Ordering of testimonial listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    /// Store default: oldest first
    #[default]
    Created,
    /// Newest first
    NewestFirst,
}
