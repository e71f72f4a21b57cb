use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Account, NewAccount, NewTestimonial, Testimonial, TestimonialChanges};
use crate::database::repository::{AccountStore, TestimonialStore};
use crate::types::ListOrder;

/// Columns shared by every testimonial query; `t` is the testimonial row.
const TESTIMONIAL_COLUMNS: &str = r#"
    t.id,
    t.author_id,
    COALESCE(NULLIF(a.first_name, ''), a.username) AS author_name,
    t.location,
    t.body,
    t.created_at,
    t.updated_at
"#;

const ACCOUNT_COLUMNS: &str =
    "id, username, first_name, password_hash, is_staff, is_superuser, is_active, created_at";

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn order_clause(order: ListOrder) -> &'static str {
        match order {
            ListOrder::Created => "ORDER BY t.created_at ASC, t.id ASC",
            ListOrder::NewestFirst => "ORDER BY t.created_at DESC, t.id DESC",
        }
    }
}

#[async_trait]
impl TestimonialStore for PgStore {
    async fn all(&self, order: ListOrder) -> Result<Vec<Testimonial>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM testimonials t JOIN accounts a ON a.id = t.author_id {}",
            TESTIMONIAL_COLUMNS,
            Self::order_clause(order)
        );
        let rows = sqlx::query_as::<_, Testimonial>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Testimonial>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM testimonials t JOIN accounts a ON a.id = t.author_id WHERE t.id = $1",
            TESTIMONIAL_COLUMNS
        );
        let row = sqlx::query_as::<_, Testimonial>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert(&self, new: NewTestimonial) -> Result<Testimonial, DatabaseError> {
        let sql = format!(
            r#"
            WITH t AS (
                INSERT INTO testimonials (id, author_id, location, body)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT {} FROM t JOIN accounts a ON a.id = t.author_id
            "#,
            TESTIMONIAL_COLUMNS
        );
        let result = sqlx::query_as::<_, Testimonial>(&sql)
            .bind(Uuid::new_v4())
            .bind(new.author_id)
            .bind(new.location)
            .bind(new.body)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => Err(
                DatabaseError::Conflict(format!("author {} does not exist", new.author_id)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(
        &self,
        id: Uuid,
        changes: TestimonialChanges,
    ) -> Result<Option<Testimonial>, DatabaseError> {
        // GREATEST keeps updated_at >= created_at even if clocks disagree
        let sql = format!(
            r#"
            WITH t AS (
                UPDATE testimonials
                SET body = $2, location = $3, updated_at = GREATEST(now(), created_at)
                WHERE id = $1
                RETURNING *
            )
            SELECT {} FROM t JOIN accounts a ON a.id = t.author_id
            "#,
            TESTIMONIAL_COLUMNS
        );
        let row = sqlx::query_as::<_, Testimonial>(&sql)
            .bind(id)
            .bind(changes.body)
            .bind(changes.location)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM testimonials WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM testimonials")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, DatabaseError> {
        let sql = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);
        let row = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, DatabaseError> {
        let sql = format!("SELECT {} FROM accounts WHERE username = $1", ACCOUNT_COLUMNS);
        let row = sqlx::query_as::<_, Account>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create(&self, new: NewAccount) -> Result<Account, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO accounts (id, username, first_name, password_hash, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        );
        let result = sqlx::query_as::<_, Account>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.username)
            .bind(&new.first_name)
            .bind(&new.password_hash)
            .bind(new.is_staff)
            .bind(new.is_superuser)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(account) => Ok(account),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                DatabaseError::Conflict(format!("username '{}' is already taken", new.username)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        // testimonials.author_id is ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<Account>, DatabaseError> {
        let sql = format!("SELECT {} FROM accounts ORDER BY username", ACCOUNT_COLUMNS);
        let rows = sqlx::query_as::<_, Account>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
