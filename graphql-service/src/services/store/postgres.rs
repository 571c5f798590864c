//! PostgreSQL-backed [`AccountStore`].

use super::AccountStore;
use crate::models::{
    AuthToken, AuthenticationProvider, NewAccount, PasswordReset, PasswordResetStatus, Profile,
    ProviderType, RoleType, User,
};
use crate::services::error::ServiceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_unique_violation(err: sqlx::Error) -> ServiceError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ServiceError::EmailAlreadyExists
        }
        _ => ServiceError::from(err),
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn health_check(&self) -> Result<(), ServiceError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                ServiceError::Database(anyhow::anyhow!("Database health check failed: {}", e))
            })?;
        Ok(())
    }

    async fn find_email_provider(
        &self,
        email: &str,
    ) -> Result<Option<AuthenticationProvider>, ServiceError> {
        let provider = sqlx::query_as::<_, AuthenticationProvider>(
            "SELECT * FROM authentication_providers WHERE provider_type = $1 AND provider_username = $2",
        )
        .bind(ProviderType::Email.as_str())
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(provider)
    }

    async fn create_account(&self, account: NewAccount) -> Result<User, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username) VALUES ($1) RETURNING *",
        )
        .bind(&account.email)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO authentication_providers
                (user_id, provider_type, provider_username, provider_password, email, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id)
        .bind(ProviderType::Email.as_str())
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.email)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .execute(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, first_name, last_name, phone_number)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user.id)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.phone_number)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            SELECT $1, id FROM roles WHERE role_type = $2
            "#,
        )
        .bind(user.id)
        .bind(RoleType::User.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(user)
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self, limit: i64) -> Result<Vec<User>, ServiceError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn providers_for_users(
        &self,
        user_ids: &[i64],
    ) -> Result<Vec<AuthenticationProvider>, ServiceError> {
        let providers = sqlx::query_as::<_, AuthenticationProvider>(
            "SELECT * FROM authentication_providers WHERE user_id = ANY($1) ORDER BY id",
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(providers)
    }

    async fn profiles_for_users(&self, user_ids: &[i64]) -> Result<Vec<Profile>, ServiceError> {
        let profiles =
            sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = ANY($1)")
                .bind(user_ids)
                .fetch_all(&self.pool)
                .await?;
        Ok(profiles)
    }

    async fn roles_for_users(
        &self,
        user_ids: &[i64],
    ) -> Result<Vec<(i64, RoleType)>, ServiceError> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            r#"
            SELECT ur.user_id, r.role_type FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = ANY($1)
            ORDER BY ur.user_id, r.id
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(user_id, code)| match code.parse::<RoleType>() {
                Ok(role) => Some((user_id, role)),
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "Skipping unknown role");
                    None
                }
            })
            .collect())
    }

    async fn grant_role(&self, user_id: i64, role: RoleType) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            SELECT $1, id FROM roles WHERE role_type = $2
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_auth_token(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<AuthToken, ServiceError> {
        let row = sqlx::query_as::<_, AuthToken>(
            "INSERT INTO auth_tokens (user_id, token, expires_at) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_auth_token(&self, token: &str) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_password_reset(
        &self,
        authentication_provider_id: i64,
        token: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordReset, ServiceError> {
        let reset = sqlx::query_as::<_, PasswordReset>(
            r#"
            INSERT INTO password_resets
                (authentication_provider_id, status, password_reset_token, expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(authentication_provider_id)
        .bind(PasswordResetStatus::Sent.as_str())
        .bind(token)
        .bind(expires_at)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(reset)
    }

    async fn verify_password_reset(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>, ServiceError> {
        let reset = sqlx::query_as::<_, PasswordReset>(
            r#"
            UPDATE password_resets
            SET status = $1, updated_at = $4
            WHERE password_reset_token = $2 AND status = $3 AND expires_at > $4
            RETURNING *
            "#,
        )
        .bind(PasswordResetStatus::Verified.as_str())
        .bind(token)
        .bind(PasswordResetStatus::Sent.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(reset)
    }

    async fn complete_password_reset(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<Option<(PasswordReset, AuthenticationProvider)>, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let reset = sqlx::query_as::<_, PasswordReset>(
            r#"
            UPDATE password_resets
            SET status = $1, updated_at = now()
            WHERE password_reset_token = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(PasswordResetStatus::Completed.as_str())
        .bind(token)
        .bind(PasswordResetStatus::Verified.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(reset) = reset else {
            tx.rollback().await?;
            return Ok(None);
        };

        let provider = sqlx::query_as::<_, AuthenticationProvider>(
            r#"
            UPDATE authentication_providers
            SET provider_password = $1, updated_at = now()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(password_hash)
        .bind(reset.authentication_provider_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some((reset, provider)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db;
    use chrono::Duration;

    async fn store() -> PgStore {
        let config = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/graphql_service_test".to_string()),
            max_connections: 2,
            min_connections: 1,
        };
        let pool = db::create_pool(&config).await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        PgStore::new(pool)
    }

    #[tokio::test]
    #[ignore] // Requires running PostgreSQL
    async fn reset_rows_advance_once_per_state() {
        let store = store().await;
        let email = format!("pg-{}@example.com", uuid::Uuid::new_v4());

        store
            .create_account(NewAccount {
                email: email.clone(),
                password_hash: "$argon2id$placeholder".to_string(),
                first_name: "Pat".to_string(),
                last_name: "Doe".to_string(),
                phone_number: "0123456789".to_string(),
            })
            .await
            .unwrap();
        let provider = store.find_email_provider(&email).await.unwrap().unwrap();

        let now = Utc::now();
        let token = uuid::Uuid::new_v4().simple().to_string();
        store
            .insert_password_reset(provider.id, &token, now, now + Duration::hours(24))
            .await
            .unwrap();

        assert!(store.verify_password_reset(&token, now).await.unwrap().is_some());
        assert!(store.verify_password_reset(&token, now).await.unwrap().is_none());

        assert!(store
            .complete_password_reset(&token, "$argon2id$new")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .complete_password_reset(&token, "$argon2id$again")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    #[ignore] // Requires running PostgreSQL
    async fn duplicate_email_is_rejected() {
        let store = store().await;
        let email = format!("dup-{}@example.com", uuid::Uuid::new_v4());
        let account = NewAccount {
            email,
            password_hash: "$argon2id$placeholder".to_string(),
            first_name: "Pat".to_string(),
            last_name: "Doe".to_string(),
            phone_number: "0123456789".to_string(),
        };

        store.create_account(account.clone()).await.unwrap();
        assert!(matches!(
            store.create_account(account).await,
            Err(ServiceError::EmailAlreadyExists)
        ));
    }
}
