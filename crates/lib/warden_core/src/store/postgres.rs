//! PostgreSQL identity store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use super::{IdentityStore, StoreError};
use crate::models::auth::{Identity, NewIdentity, Role};

/// Raw `users` row: (id, email, password, name, role, created_at).
type UserRow = (i64, String, String, String, String, DateTime<Utc>);

const SELECT_USER: &str = "SELECT id, email, password, name, role, created_at FROM users";

/// Upper bound on waiting for a pooled connection; lookups fail with
/// `StoreError::Unavailable` after this.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Identity store over the `users` table.
#[derive(Clone, Debug)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(DEFAULT_ACQUIRE_TIMEOUT)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Run the embedded migrations from `warden_core/migrations/`.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("running database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn into_identity(row: UserRow) -> Result<Identity, StoreError> {
    let (id, email, password_hash, display_name, role, created_at) = row;
    let role = role
        .parse::<Role>()
        .map_err(|e| StoreError::Corrupt(format!("user {id}: {e}")))?;
    Ok(Identity {
        id,
        email,
        password_hash,
        display_name,
        role,
        created_at,
    })
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(into_identity).transpose()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(into_identity).transpose()
    }

    async fn create(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (email, password, name, role) VALUES ($1, $2, $3, $4) \
             RETURNING id, email, password, name, role, created_at",
        )
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(&identity.display_name)
        .bind(identity.role.as_str())
        .fetch_one(&self.pool)
        .await?;
        into_identity(row)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(role: &str) -> UserRow {
        (
            3,
            "a@b.com".into(),
            "$2b$04$hash".into(),
            "A".into(),
            role.into(),
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        )
    }

    #[test]
    fn row_maps_to_identity() {
        let identity = into_identity(row("admin")).unwrap();
        assert_eq!(3, identity.id);
        assert_eq!("A", identity.display_name);
        assert_eq!(Role::Admin, identity.role);
    }

    #[test]
    fn unknown_role_is_corrupt() {
        assert!(matches!(
            into_identity(row("superuser")),
            Err(StoreError::Corrupt(_))
        ));
    }

    /// Needs a live database: `WARDEN_TEST_DATABASE_URL=postgres://... cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn create_twice_is_duplicate_email() {
        let url = std::env::var("WARDEN_TEST_DATABASE_URL").expect("WARDEN_TEST_DATABASE_URL");
        let store = PgIdentityStore::connect(&url, 2).await.expect("connect");
        store.migrate().await.expect("migrate");

        let email = format!("dup-{}@example.com", Utc::now().timestamp_nanos_opt().unwrap());
        let new_identity = || NewIdentity {
            email: email.clone(),
            password_hash: "$2b$04$hash".into(),
            display_name: "Dup".into(),
            role: Role::User,
        };

        let created = store.create(new_identity()).await.expect("first create");
        assert_eq!(email, created.email);
        assert!(matches!(
            store.create(new_identity()).await,
            Err(StoreError::DuplicateEmail)
        ));

        let found = store.find_by_email(&email).await.expect("lookup");
        assert_eq!(Some(created.id), found.map(|i| i.id));
        sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(&email)
            .execute(store.pool())
            .await
            .expect("cleanup");
    }
}
