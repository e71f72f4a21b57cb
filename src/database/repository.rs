use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Account, NewAccount, NewTestimonial, Testimonial, TestimonialChanges};
use crate::types::ListOrder;

/// Durable testimonial storage. The handlers only ever need these six calls.
#[async_trait]
pub trait TestimonialStore: Send + Sync {
    async fn all(&self, order: ListOrder) -> Result<Vec<Testimonial>, DatabaseError>;

    async fn get(&self, id: Uuid) -> Result<Option<Testimonial>, DatabaseError>;

    async fn insert(&self, new: NewTestimonial) -> Result<Testimonial, DatabaseError>;

    /// Overwrites the mutable fields and refreshes `updated_at`.
    /// Returns `None` when the row no longer exists.
    async fn update(
        &self,
        id: Uuid,
        changes: TestimonialChanges,
    ) -> Result<Option<Testimonial>, DatabaseError>;

    /// Returns whether a row was removed
    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError>;

    async fn count(&self) -> Result<i64, DatabaseError>;
}

/// Identity store: accounts, credentials and roles
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, DatabaseError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, DatabaseError>;

    /// Fails with `DatabaseError::Conflict` when the username is taken
    async fn create(&self, new: NewAccount) -> Result<Account, DatabaseError>;

    /// Removes the account and every testimonial it authored
    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError>;

    async fn list(&self) -> Result<Vec<Account>, DatabaseError>;
}
