//! Session repository for refresh token management.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entities::sessions;

/// Data for a new session.
///
/// The ID is chosen by the caller because it is embedded in the tokens
/// before the row exists.
#[derive(Debug, Clone)]
pub struct NewSession<'a> {
    /// Session ID (the `sid` claim).
    pub id: Uuid,
    /// Owner.
    pub user_id: Uuid,
    /// Tenant of the owner.
    pub tenant_id: Uuid,
    /// Plain refresh token; only its digest is stored.
    pub refresh_token: &'a str,
    /// Expiry of the refresh token.
    pub expires_at: chrono::DateTime<chrono::Utc>,
    /// Client user agent.
    pub user_agent: Option<&'a str>,
    /// Client IP address.
    pub ip_address: Option<&'a str>,
}

/// Session repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    db: Arc<DatabaseConnection>,
}

impl SessionRepository {
    /// Creates a new session repository.
    #[must_use]
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }

    /// Hashes a refresh token for storage.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn active_model(new: &NewSession<'_>) -> sessions::ActiveModel {
        let now = chrono::Utc::now().into();
        sessions::ActiveModel {
            id: Set(new.id),
            user_id: Set(new.user_id),
            tenant_id: Set(new.tenant_id),
            refresh_token_hash: Set(Self::hash_token(new.refresh_token)),
            user_agent: Set(new.user_agent.map(String::from)),
            ip_address: Set(new.ip_address.map(String::from)),
            expires_at: Set(new.expires_at.into()),
            revoked_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    /// Creates a new session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, new: NewSession<'_>) -> Result<sessions::Model, DbErr> {
        Self::active_model(&new).insert(self.db.as_ref()).await
    }

    /// Finds a live (not revoked, not expired) session by refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<sessions::Model>, DbErr> {
        let token_hash = Self::hash_token(refresh_token);

        sessions::Entity::find()
            .filter(sessions::Column::RefreshTokenHash.eq(token_hash))
            .filter(sessions::Column::RevokedAt.is_null())
            .filter(sessions::Column::ExpiresAt.gt(chrono::Utc::now()))
            .one(self.db.as_ref())
            .await
    }

    /// Revokes a session by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke(&self, id: Uuid) -> Result<(), DbErr> {
        let now = chrono::Utc::now().into();

        sessions::ActiveModel {
            id: Set(id),
            revoked_at: Set(Some(now)),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(self.db.as_ref())
        .await?;

        Ok(())
    }

    /// Revokes a session by refresh token.
    ///
    /// Returns `false` when no live session matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke_by_token(&self, refresh_token: &str) -> Result<bool, DbErr> {
        let session = self.find_by_token(refresh_token).await?;

        if let Some(s) = session {
            self.revoke(s.id).await?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Revokes `old_id` and creates its replacement in one transaction.
    ///
    /// The revoke only matches a live session, so of two concurrent
    /// rotations of the same session exactly one wins. Returns `None` when
    /// the old session was already revoked or expired; nothing is inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if either statement fails.
    pub async fn rotate(
        &self,
        old_id: Uuid,
        new: NewSession<'_>,
    ) -> Result<Option<sessions::Model>, DbErr> {
        let now = chrono::Utc::now();
        let txn = self.db.begin().await?;

        let revoked = sessions::Entity::update_many()
            .col_expr(
                sessions::Column::RevokedAt,
                sea_orm::sea_query::Expr::value(now),
            )
            .col_expr(
                sessions::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(now),
            )
            .filter(sessions::Column::Id.eq(old_id))
            .filter(sessions::Column::RevokedAt.is_null())
            .filter(sessions::Column::ExpiresAt.gt(now))
            .exec(&txn)
            .await?;

        if revoked.rows_affected != 1 {
            txn.rollback().await?;
            return Ok(None);
        }

        let session = Self::active_model(&new).insert(&txn).await?;
        txn.commit().await?;

        Ok(Some(session))
    }

    /// Counts live sessions for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_active_sessions(&self, user_id: Uuid) -> Result<u64, DbErr> {
        sessions::Entity::find()
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::RevokedAt.is_null())
            .filter(sessions::Column::ExpiresAt.gt(chrono::Utc::now()))
            .count(self.db.as_ref())
            .await
    }

    /// Deletes expired sessions (for maintenance).
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn cleanup_expired(&self) -> Result<u64, DbErr> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::ExpiresAt.lt(chrono::Utc::now()))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }
}

/// Revokes every live session of a user on any connection or transaction.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub async fn revoke_all_for_user<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<u64, DbErr> {
    let result = sessions::Entity::update_many()
        .col_expr(
            sessions::Column::RevokedAt,
            sea_orm::sea_query::Expr::value(now),
        )
        .col_expr(
            sessions::Column::UpdatedAt,
            sea_orm::sea_query::Expr::value(now),
        )
        .filter(sessions::Column::UserId.eq(user_id))
        .filter(sessions::Column::RevokedAt.is_null())
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn session(user_id: Uuid, token: &str) -> sessions::Model {
        let now = chrono::Utc::now();
        sessions::Model {
            id: Uuid::new_v4(),
            user_id,
            tenant_id: Uuid::new_v4(),
            refresh_token_hash: SessionRepository::hash_token(token),
            user_agent: None,
            ip_address: None,
            expires_at: (now + chrono::Duration::days(7)).into(),
            revoked_at: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn test_hash_token_is_sha256_hex() {
        let hash = SessionRepository::hash_token("token");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, SessionRepository::hash_token("token"));
        assert_ne!(hash, SessionRepository::hash_token("other"));
    }

    #[test]
    fn test_is_live() {
        let now = chrono::Utc::now();
        let mut s = session(Uuid::new_v4(), "t");
        assert!(s.is_live(now));

        s.revoked_at = Some(now.into());
        assert!(!s.is_live(now));

        let mut expired = session(Uuid::new_v4(), "t");
        expired.expires_at = (now - chrono::Duration::seconds(1)).into();
        assert!(!expired.is_live(now));
    }

    #[tokio::test]
    async fn test_revoke_by_unknown_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<sessions::Model>::new()])
            .into_connection();
        let repo = SessionRepository::new(db);

        assert!(!repo.revoke_by_token("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_rotate_returns_new_session() {
        let user_id = Uuid::new_v4();
        let replacement = session(user_id, "new-token");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![replacement.clone()]])
            .into_connection();
        let repo = SessionRepository::new(db);

        let result = repo
            .rotate(
                Uuid::new_v4(),
                NewSession {
                    id: replacement.id,
                    user_id,
                    tenant_id: replacement.tenant_id,
                    refresh_token: "new-token",
                    expires_at: chrono::Utc::now() + chrono::Duration::days(7),
                    user_agent: None,
                    ip_address: None,
                },
            )
            .await
            .unwrap()
            .expect("live session rotates");

        assert_eq!(result.id, replacement.id);
        assert_eq!(
            result.refresh_token_hash,
            SessionRepository::hash_token("new-token")
        );
    }

    #[tokio::test]
    async fn test_rotate_stale_session_issues_nothing() {
        let user_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let db = Arc::new(db);
        let repo = SessionRepository::new(Arc::clone(&db));

        let result = repo
            .rotate(
                Uuid::new_v4(),
                NewSession {
                    id: Uuid::new_v4(),
                    user_id,
                    tenant_id: Uuid::new_v4(),
                    refresh_token: "second-use",
                    expires_at: chrono::Utc::now() + chrono::Duration::days(7),
                    user_agent: None,
                    ip_address: None,
                },
            )
            .await
            .unwrap();
        assert!(result.is_none());

        drop(repo);
        let db = Arc::try_unwrap(db).expect("repository released the connection");
        let log = format!("{:?}", db.into_transaction_log());
        assert!(!log.contains("INSERT"), "no replacement session may be inserted");
    }
}
