use chrono::{DateTime, Utc};
use grid_wars_domain::{
    ServiceError, ServiceResult,
    account::{Account, AccountId, AccountRepository},
};
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use crate::{db_err, is_unique_violation, parse_timestamp, parse_uuid};

pub struct SqliteAccountRepository {
    pool: Pool<Sqlite>,
}

impl SqliteAccountRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn account_from_row(row: &SqliteRow) -> ServiceResult<Account> {
        let id: String = row.try_get("id").map_err(db_err)?;
        let created_at: String = row.try_get("created_at").map_err(db_err)?;
        let updated_at: String = row.try_get("updated_at").map_err(db_err)?;
        Ok(Account {
            id: parse_uuid(&id)?,
            username: row.try_get("username").map_err(db_err)?,
            email: row.try_get("email").map_err(db_err)?,
            password_hash: row.try_get("password_hash").map_err(db_err)?,
            profile_image: row.try_get("profile_image").map_err(db_err)?,
            wins: row.try_get("wins").map_err(db_err)?,
            losses: row.try_get("losses").map_err(db_err)?,
            draws: row.try_get("draws").map_err(db_err)?,
            total_games: row.try_get("total_games").map_err(db_err)?,
            level: row.try_get("level").map_err(db_err)?,
            streak_days: row.try_get("streak_days").map_err(db_err)?,
            is_active: row.try_get("is_active").map_err(db_err)?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}

#[async_trait::async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<Account>> {
        let row = sqlx::query("SELECT * FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(Self::account_from_row).transpose()
    }

    async fn find_active_by_id(&self, id: AccountId) -> ServiceResult<Option<Account>> {
        let row = sqlx::query("SELECT * FROM accounts WHERE id = ? AND is_active = 1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(Self::account_from_row).transpose()
    }

    async fn insert(&self, account: &Account) -> ServiceResult<()> {
        sqlx::query(
            "INSERT INTO accounts (id, username, email, password_hash, profile_image, \
             wins, losses, draws, total_games, level, streak_days, is_active, \
             created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(account.id.to_string())
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.profile_image)
        .bind(account.wins)
        .bind(account.losses)
        .bind(account.draws)
        .bind(account.total_games)
        .bind(account.level)
        .bind(account.streak_days)
        .bind(account.is_active)
        .bind(account.created_at.to_rfc3339())
        .bind(account.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict("Email already registered".into())
            } else {
                db_err(e)
            }
        })?;
        Ok(())
    }

    async fn update_username(
        &self,
        id: AccountId,
        username: &str,
        updated_at: DateTime<Utc>,
    ) -> ServiceResult<()> {
        sqlx::query("UPDATE accounts SET username = ?, updated_at = ? WHERE id = ?")
            .bind(username)
            .bind(updated_at.to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn update_password(
        &self,
        id: AccountId,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> ServiceResult<()> {
        sqlx::query("UPDATE accounts SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(updated_at.to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn update_profile_image(
        &self,
        id: AccountId,
        url: &str,
        updated_at: DateTime<Utc>,
    ) -> ServiceResult<()> {
        sqlx::query("UPDATE accounts SET profile_image = ?, updated_at = ? WHERE id = ?")
            .bind(url)
            .bind(updated_at.to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{create_db_pool, init_schema, temp_db_url};

    use super::*;

    async fn make_repository() -> SqliteAccountRepository {
        let pool = create_db_pool(&temp_db_url()).await.unwrap();
        init_schema(&pool).await.unwrap();
        SqliteAccountRepository::new(pool)
    }

    fn account(email: &str, username: &str) -> Account {
        Account::new(email.to_string(), username.to_string(), "hash".to_string())
    }

    #[tokio::test]
    async fn test_insert_and_find_roundtrip() {
        let repository = make_repository().await;
        let account = account("a@x.com", "alice");
        repository.insert(&account).await.unwrap();

        let by_email = repository.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, account.id);
        assert_eq!(by_email.username, "alice");
        assert_eq!(by_email.password_hash, "hash");
        assert_eq!(by_email.level, 1);
        assert!(by_email.is_active);

        let by_id = repository
            .find_active_by_id(account.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id.email, "a@x.com");

        assert!(repository.find_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_email_constraint_maps_to_conflict() {
        let repository = make_repository().await;
        repository.insert(&account("a@x.com", "alice")).await.unwrap();

        let err = repository
            .insert(&account("a@x.com", "bob"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_concurrent_registration_exactly_one_success() {
        let repository = Arc::new(make_repository().await);

        let mut handles = Vec::new();
        for i in 0..2 {
            let repository = repository.clone();
            handles.push(tokio::spawn(async move {
                repository
                    .insert(&account("race@x.com", &format!("user{}", i)))
                    .await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn test_inactive_accounts_hidden_from_id_lookup_but_not_email() {
        let repository = make_repository().await;
        let mut account = account("a@x.com", "alice");
        account.is_active = false;
        repository.insert(&account).await.unwrap();

        assert!(repository
            .find_active_by_id(account.id)
            .await
            .unwrap()
            .is_none());
        assert!(repository.find_by_email("a@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_updates_persist_and_bump_updated_at() {
        let repository = make_repository().await;
        let account = account("a@x.com", "alice");
        repository.insert(&account).await.unwrap();

        let later = Utc::now() + chrono::Duration::seconds(5);
        repository
            .update_username(account.id, "alice2", later)
            .await
            .unwrap();
        repository
            .update_password(account.id, "newhash", later)
            .await
            .unwrap();
        repository
            .update_profile_image(account.id, "https://img.example.com/a.png", later)
            .await
            .unwrap();

        let stored = repository
            .find_active_by_id(account.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.username, "alice2");
        assert_eq!(stored.password_hash, "newhash");
        assert_eq!(
            stored.profile_image.as_deref(),
            Some("https://img.example.com/a.png")
        );
        assert!(stored.updated_at > account.updated_at);
    }
}
