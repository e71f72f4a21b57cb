use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Account, NewAccount, NewTestimonial, Testimonial, TestimonialChanges};
use crate::database::repository::{AccountStore, TestimonialStore};
use crate::types::ListOrder;

/// In-process store used when no DATABASE_URL is configured, and by tests.
/// Vectors keep insertion order, which is the default listing order.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    accounts: Vec<Account>,
    testimonials: Vec<Testimonial>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn author_name(&self, author_id: Uuid) -> Option<String> {
        self.accounts
            .iter()
            .find(|a| a.id == author_id)
            .map(|a| a.display_name().to_string())
    }
}

#[async_trait]
impl TestimonialStore for MemoryStore {
    async fn all(&self, order: ListOrder) -> Result<Vec<Testimonial>, DatabaseError> {
        let inner = self.inner.read().await;
        let mut rows = inner.testimonials.clone();
        if order == ListOrder::NewestFirst {
            // Stable sort so equal timestamps stay newest-inserted first
            rows.reverse();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Testimonial>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.testimonials.iter().find(|t| t.id == id).cloned())
    }

    async fn insert(&self, new: NewTestimonial) -> Result<Testimonial, DatabaseError> {
        let mut inner = self.inner.write().await;
        let author_name = inner.author_name(new.author_id).ok_or_else(|| {
            DatabaseError::Conflict(format!("author {} does not exist", new.author_id))
        })?;

        let now = Utc::now();
        let record = Testimonial {
            id: Uuid::new_v4(),
            author_id: new.author_id,
            author_name,
            location: new.location,
            body: new.body,
            created_at: now,
            updated_at: now,
        };
        inner.testimonials.push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: TestimonialChanges,
    ) -> Result<Option<Testimonial>, DatabaseError> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.testimonials.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };

        record.body = changes.body;
        record.location = changes.location;
        record.updated_at = Utc::now().max(record.created_at);
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut inner = self.inner.write().await;
        let before = inner.testimonials.len();
        inner.testimonials.retain(|t| t.id != id);
        Ok(inner.testimonials.len() < before)
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.testimonials.len() as i64)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.iter().find(|a| a.username == username).cloned())
    }

    async fn create(&self, new: NewAccount) -> Result<Account, DatabaseError> {
        let mut inner = self.inner.write().await;
        if inner.accounts.iter().any(|a| a.username == new.username) {
            return Err(DatabaseError::Conflict(format!(
                "username '{}' is already taken",
                new.username
            )));
        }

        let account = Account {
            id: Uuid::new_v4(),
            username: new.username,
            first_name: new.first_name,
            password_hash: new.password_hash,
            is_staff: new.is_staff,
            is_superuser: new.is_superuser,
            is_active: true,
            created_at: Utc::now(),
        };
        inner.accounts.push(account.clone());
        Ok(account)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut inner = self.inner.write().await;
        let before = inner.accounts.len();
        inner.accounts.retain(|a| a.id != id);
        if inner.accounts.len() == before {
            return Ok(false);
        }
        inner.testimonials.retain(|t| t.author_id != id);
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<Account>, DatabaseError> {
        let inner = self.inner.read().await;
        let mut accounts = inner.accounts.clone();
        accounts.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(accounts)
    }
}
