use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::db::models::{Account, Favorite, SubscriptionStatus};
use crate::error::{AppError, DatabaseError};

#[derive(Clone)]
pub struct DbOperations {
    pool: Arc<PgPool>,
}

impl DbOperations {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| AppError::DatabaseError(DatabaseError::ConnectionError(e.to_string())))?;

        Ok(Self { pool: Arc::new(pool) })
    }

    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref()
    }

    pub async fn run_migrations(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await
            .map_err(|e| AppError::DatabaseError(DatabaseError::QueryError(e.to_string())))?;
        Ok(())
    }

    pub async fn begin_transaction(&self) -> Result<Transaction<'_, Postgres>, AppError> {
        Ok(self.pool.as_ref().begin().await?)
    }

    pub async fn get_account_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(account)
    }

    /// Returns the local account row for a verified session, creating it
    /// from the session claims on first sight. Accounts are owned by the
    /// auth backend; this copy only carries the billing/premium state.
    pub async fn ensure_account(&self, id: Uuid, email: &str) -> Result<Account, AppError> {
        if let Some(account) = self.get_account_by_id(id).await? {
            return Ok(account);
        }

        let account = Account::new(id, email.to_string(), None);
        let inserted = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, email, display_name, is_premium, subscription_status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.display_name)
        .bind(account.is_premium)
        .bind(&account.subscription_status)
        .bind(account.created_at)
        .bind(account.updated_at)
        .fetch_optional(self.pool.as_ref())
        .await?;

        match inserted {
            Some(account) => Ok(account),
            // Lost a race with a concurrent first request; the row exists now.
            None => self
                .get_account_by_id(id)
                .await?
                .ok_or(AppError::DatabaseError(DatabaseError::NotFound)),
        }
    }

    pub async fn list_favorites(&self, account_id: Uuid) -> Result<Vec<Favorite>, AppError> {
        let favorites = sqlx::query_as::<_, Favorite>(
            "SELECT * FROM favorites WHERE account_id = $1 ORDER BY created_at DESC",
        )
        .bind(account_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(favorites)
    }

    /// Inserts a favorite, enforcing the per-account cap atomically.
    ///
    /// The account row is locked for the duration of the transaction, so
    /// two concurrent adds for the same account serialize and cannot both
    /// pass the cap check. `cap` of `None` means unlimited (premium).
    pub async fn add_favorite(
        &self,
        account_id: Uuid,
        city_name: &str,
        cap: Option<i64>,
    ) -> Result<Favorite, AppError> {
        let mut transaction = self.begin_transaction().await?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM accounts WHERE id = $1 FOR UPDATE")
                .bind(account_id)
                .fetch_optional(&mut *transaction)
                .await?;

        if locked.is_none() {
            transaction.rollback().await?;
            return Err(AppError::DatabaseError(DatabaseError::NotFound));
        }

        if let Some(cap) = cap {
            let count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE account_id = $1")
                    .bind(account_id)
                    .fetch_one(&mut *transaction)
                    .await?;

            if count >= cap {
                transaction.rollback().await?;
                return Err(AppError::FavoriteLimitReached(cap));
            }
        }

        let favorite = Favorite::new(account_id, city_name.to_string());
        let result = sqlx::query_as::<_, Favorite>(
            r#"
            INSERT INTO favorites (id, account_id, city_name, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(favorite.id)
        .bind(favorite.account_id)
        .bind(&favorite.city_name)
        .bind(favorite.created_at)
        .fetch_one(&mut *transaction)
        .await;

        match result {
            Ok(favorite) => {
                transaction.commit().await?;
                Ok(favorite)
            }
            Err(e) => {
                transaction.rollback().await?;
                Err(e.into())
            }
        }
    }

    /// Deletes a favorite owned by the given account. Returns whether a
    /// row was actually removed.
    pub async fn delete_favorite(&self, id: Uuid, account_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM favorites WHERE id = $1 AND account_id = $2")
            .bind(id)
            .bind(account_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn set_billing_customer(
        &self,
        account_id: Uuid,
        customer_id: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE accounts SET billing_customer_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(account_id)
        .bind(customer_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    /// checkout.session.completed: grant premium and record the billing ids.
    /// Returns the number of rows touched; 0 means the account id in the
    /// event metadata is unknown and the event is a no-op.
    pub async fn activate_premium(
        &self,
        account_id: Uuid,
        customer_id: Option<&str>,
        subscription_id: Option<&str>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET is_premium = TRUE,
                subscription_status = $2,
                billing_customer_id = $3,
                billing_subscription_id = $4,
                premium_activated_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(account_id)
        .bind(SubscriptionStatus::Active.as_str())
        .bind(customer_id)
        .bind(subscription_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    /// customer.subscription.updated: store the delivered status as-is and
    /// recompute the premium flag from it.
    pub async fn update_subscription(
        &self,
        customer_id: &str,
        status: &str,
        is_premium: bool,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET subscription_status = $2,
                is_premium = $3,
                updated_at = NOW()
            WHERE billing_customer_id = $1
            "#,
        )
        .bind(customer_id)
        .bind(status)
        .bind(is_premium)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    /// customer.subscription.deleted: revoke premium. Unknown customer ids
    /// touch no rows, which the dispatcher treats as a successful no-op.
    pub async fn cancel_subscription(&self, customer_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET is_premium = FALSE,
                subscription_status = $2,
                premium_activated_at = NULL,
                updated_at = NOW()
            WHERE billing_customer_id = $1
            "#,
        )
        .bind(customer_id)
        .bind(SubscriptionStatus::Canceled.as_str())
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }
}
