//! Subscriber repository for HNTLDR.

use chrono::Utc;
use uuid::Uuid;

use super::types::{normalize_email, SubscribeOutcome, Subscriber, SubscriberStatus};
use crate::datetime::{parse_stored_timestamp, to_db_timestamp};
use crate::db::DbPool;
use crate::{HntldrError, Result};

/// Row type for a subscriber.
#[derive(Debug, Clone, sqlx::FromRow)]
struct SubscriberRow {
    id: String,
    email: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<SubscriberRow> for Subscriber {
    type Error = HntldrError;

    fn try_from(row: SubscriberRow) -> Result<Self> {
        Ok(Subscriber {
            status: row
                .status
                .parse::<SubscriberStatus>()
                .map_err(|e| HntldrError::Database(e.to_string()))?,
            created_at: parse_stored_timestamp("created_at", &row.created_at)?,
            updated_at: parse_stored_timestamp("updated_at", &row.updated_at)?,
            id: row.id,
            email: row.email,
        })
    }
}

/// Repository for newsletter subscribers.
pub struct SubscriberRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> SubscriberRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Subscribe an email address.
    ///
    /// Creates the subscriber, reactivates an inactive one, or leaves an
    /// active one untouched, in one upsert statement. The upsert returns a
    /// row only when it inserted or reactivated; the generated ID coming back
    /// marks a new row.
    pub async fn subscribe(&self, email: &str) -> Result<(Subscriber, SubscribeOutcome)> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(HntldrError::Validation("email is required".to_string()));
        }

        let new_id = Uuid::new_v4().to_string();
        let changed = sqlx::query_as::<_, SubscriberRow>(
            r#"
            INSERT INTO subscribers (id, email, status, created_at, updated_at)
            VALUES ($1, $2, 'active', $3, $3)
            ON CONFLICT(email) DO UPDATE SET
                status = 'active',
                updated_at = excluded.updated_at
            WHERE subscribers.status = 'inactive'
            RETURNING id, email, status, created_at, updated_at
            "#,
        )
        .bind(&new_id)
        .bind(&email)
        .bind(to_db_timestamp(&Utc::now()))
        .fetch_optional(self.pool)
        .await?;

        match changed {
            Some(row) => {
                let outcome = if row.id == new_id {
                    SubscribeOutcome::Created
                } else {
                    SubscribeOutcome::Reactivated
                };
                Ok((Subscriber::try_from(row)?, outcome))
            }
            None => {
                let subscriber = self
                    .get_by_email(&email)
                    .await?
                    .ok_or_else(|| HntldrError::NotFound("subscriber".to_string()))?;
                Ok((subscriber, SubscribeOutcome::AlreadyActive))
            }
        }
    }

    /// Mark a subscriber inactive.
    ///
    /// Returns `None` when the ID is unknown. Unsubscribing twice is harmless.
    pub async fn unsubscribe(&self, id: &str) -> Result<Option<Subscriber>> {
        let result = sqlx::query(
            "UPDATE subscribers SET status = 'inactive', updated_at = $1 WHERE id = $2",
        )
        .bind(to_db_timestamp(&Utc::now()))
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Get a subscriber by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Subscriber>> {
        let row = sqlx::query_as::<_, SubscriberRow>(
            "SELECT id, email, status, created_at, updated_at FROM subscribers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Subscriber::try_from).transpose()
    }

    /// Get a subscriber by email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        let row = sqlx::query_as::<_, SubscriberRow>(
            "SELECT id, email, status, created_at, updated_at FROM subscribers WHERE email = $1",
        )
        .bind(normalize_email(email))
        .fetch_optional(self.pool)
        .await?;

        row.map(Subscriber::try_from).transpose()
    }

    /// All active subscribers, oldest first.
    pub async fn list_active(&self) -> Result<Vec<Subscriber>> {
        let rows = sqlx::query_as::<_, SubscriberRow>(
            r#"
            SELECT id, email, status, created_at, updated_at
            FROM subscribers
            WHERE status = 'active'
            ORDER BY created_at ASC, email ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Subscriber::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test]
    async fn test_subscribe_new() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = SubscriberRepository::new(db.pool());

        let (subscriber, outcome) = repo.subscribe(" New@Example.com ").await.unwrap();
        assert_eq!(outcome, SubscribeOutcome::Created);
        assert_eq!(subscriber.email, "new@example.com");
        assert!(subscriber.is_active());
        assert!(Uuid::parse_str(&subscriber.id).is_ok());
    }

    #[tokio::test]
    async fn test_subscribe_twice_is_already_active() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = SubscriberRepository::new(db.pool());

        let (first, _) = repo.subscribe("a@example.com").await.unwrap();
        let (second, outcome) = repo.subscribe("A@example.com").await.unwrap();
        assert_eq!(outcome, SubscribeOutcome::AlreadyActive);
        assert_eq!(first.id, second.id);
        assert_eq!(first.updated_at, second.updated_at);
    }

    #[tokio::test]
    async fn test_resubscribe_after_unsubscribe_reactivates() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = SubscriberRepository::new(db.pool());

        let (subscriber, _) = repo.subscribe("a@example.com").await.unwrap();
        repo.unsubscribe(&subscriber.id).await.unwrap();

        let (again, outcome) = repo.subscribe("a@example.com").await.unwrap();
        assert_eq!(outcome, SubscribeOutcome::Reactivated);
        assert_eq!(again.id, subscriber.id);
        assert!(again.is_active());
    }

    #[tokio::test]
    async fn test_subscribe_rejects_blank() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = SubscriberRepository::new(db.pool());
        assert!(matches!(
            repo.subscribe("   ").await,
            Err(HntldrError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unsubscribe_unknown() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = SubscriberRepository::new(db.pool());
        assert!(repo
            .unsubscribe(&Uuid::new_v4().to_string())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = SubscriberRepository::new(db.pool());
        let (subscriber, _) = repo.subscribe("a@example.com").await.unwrap();

        let first = repo.unsubscribe(&subscriber.id).await.unwrap().unwrap();
        let second = repo.unsubscribe(&subscriber.id).await.unwrap().unwrap();
        assert_eq!(first.status, SubscriberStatus::Inactive);
        assert_eq!(second.status, SubscriberStatus::Inactive);
        assert_eq!(second.email, "a@example.com");
    }

    #[tokio::test]
    async fn test_list_active_excludes_inactive() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = SubscriberRepository::new(db.pool());
        repo.subscribe("a@example.com").await.unwrap();
        let (b, _) = repo.subscribe("b@example.com").await.unwrap();
        repo.subscribe("c@example.com").await.unwrap();
        repo.unsubscribe(&b.id).await.unwrap();

        let emails: Vec<String> = repo
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.email)
            .collect();
        assert_eq!(emails.len(), 2);
        assert!(!emails.contains(&"b@example.com".to_string()));
    }
}
