use crate::entities::{UserRole, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::external::VerifiedIdentity;
use crate::models::SyncUserRequest;
use crate::utils::is_placeholder_uid;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};

/// How [`UserService::reconcile`] arrived at the returned row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    FoundByUid,
    /// Found by email with no UID; the identity's UID was attached.
    LinkedByEmail,
    /// Found by email but already owned by a different UID; left untouched.
    FoundByEmail,
    Created,
}

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn find_by_uid(&self, uid: &str) -> AppResult<Option<users::Model>> {
        Ok(users::Entity::find()
            .filter(users::Column::FirebaseUid.eq(uid))
            .one(&self.pool)
            .await?)
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<users::Model>> {
        Ok(users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.pool)
            .await?)
    }

    /// Like [`find_by_uid`](Self::find_by_uid) but a missing row is a 404.
    pub async fn require_by_uid(&self, uid: &str) -> AppResult<users::Model> {
        self.find_by_uid(uid)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Maps a verified identity onto exactly one local user row, looking it
    /// up by UID first and by email second. Never creates a second row for
    /// an email that already exists.
    pub async fn reconcile(
        &self,
        identity: &VerifiedIdentity,
        default_role: UserRole,
    ) -> AppResult<(users::Model, Reconciled)> {
        if let Some(user) = self.find_by_uid(&identity.uid).await? {
            return Ok((user, Reconciled::FoundByUid));
        }

        if let Some(user) = self.find_by_email(&identity.email).await? {
            return match user.firebase_uid.clone() {
                None => {
                    let mut model = user.into_active_model();
                    model.firebase_uid = Set(Some(identity.uid.clone()));
                    model.updated_at = Set(Utc::now());
                    let user = model.update(&self.pool).await?;
                    log::info!("Linked UID to existing user {}", user.email);
                    Ok((user, Reconciled::LinkedByEmail))
                }
                Some(existing) => {
                    // TODO: placeholder UIDs from send-otp are never swapped for the real one
                    if is_placeholder_uid(&existing) {
                        log::warn!(
                            "User {} still carries placeholder UID {existing}; not linked to {}",
                            user.email,
                            identity.uid
                        );
                    } else {
                        log::warn!(
                            "User {} is owned by UID {existing}, request came from {}",
                            user.email,
                            identity.uid
                        );
                    }
                    Ok((user, Reconciled::FoundByEmail))
                }
            };
        }

        let now = Utc::now();
        let created = users::ActiveModel {
            firebase_uid: Set(Some(identity.uid.clone())),
            email: Set(identity.email.clone()),
            role: Set(default_role),
            is_verified: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await;

        match created {
            Ok(user) => {
                log::info!("Created {} user {}", user.role, user.email);
                Ok((user, Reconciled::Created))
            }
            Err(err) => {
                // lost a race with a concurrent insert for the same identity
                if let Some(user) = self.find_by_uid(&identity.uid).await? {
                    return Ok((user, Reconciled::FoundByUid));
                }
                if let Some(user) = self.find_by_email(&identity.email).await? {
                    return Ok((user, Reconciled::FoundByEmail));
                }
                Err(err.into())
            }
        }
    }

    /// `POST /auth/me`: reconcile the caller, then refresh contact details.
    /// The requested role only applies when the row is created here.
    pub async fn sync_user(
        &self,
        identity: &VerifiedIdentity,
        request: SyncUserRequest,
    ) -> AppResult<users::Model> {
        let role = request.role.unwrap_or(UserRole::User);
        let (user, how) = self.reconcile(identity, role).await?;

        let phone = request
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        let refresh_email = how == Reconciled::FoundByUid && user.email != identity.email;

        if phone.is_none() && !refresh_email {
            return Ok(user);
        }

        let email_taken = refresh_email
            && self
                .find_by_email(&identity.email)
                .await?
                .is_some_and(|other| other.id != user.id);
        if email_taken {
            log::warn!(
                "Not moving user {} to {}: address belongs to another account",
                user.id,
                identity.email
            );
        }

        let mut model = user.into_active_model();
        if refresh_email && !email_taken {
            model.email = Set(identity.email.clone());
        }
        if let Some(phone) = phone {
            model.phone = Set(Some(phone));
        }
        model.updated_at = Set(Utc::now());
        let user = model.update(&self.pool).await?;

        log::info!("User synced: {}", user.email);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use sea_orm::PaginatorTrait;

    async fn insert_user(pool: &DatabaseConnection, uid: Option<&str>, email: &str) -> users::Model {
        let now = Utc::now();
        users::ActiveModel {
            firebase_uid: Set(uid.map(str::to_string)),
            email: Set(email.to_string()),
            role: Set(UserRole::User),
            is_verified: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(pool)
        .await
        .unwrap()
    }

    async fn user_count(pool: &DatabaseConnection) -> u64 {
        users::Entity::find().count(pool).await.unwrap()
    }

    #[tokio::test]
    async fn test_reconcile_creates_with_default_role() {
        let pool = test_pool().await;
        let svc = UserService::new(pool.clone());

        let (user, how) = svc
            .reconcile(&VerifiedIdentity::new("uid-1", "a@x.com"), UserRole::Consultant)
            .await
            .unwrap();

        assert_eq!(how, Reconciled::Created);
        assert_eq!(user.firebase_uid.as_deref(), Some("uid-1"));
        assert_eq!(user.role, UserRole::Consultant);
        assert!(!user.is_verified);
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let pool = test_pool().await;
        let svc = UserService::new(pool.clone());
        let identity = VerifiedIdentity::new("uid-1", "a@x.com");

        let (first, _) = svc.reconcile(&identity, UserRole::User).await.unwrap();
        let (second, how) = svc.reconcile(&identity, UserRole::Consultant).await.unwrap();

        assert_eq!(how, Reconciled::FoundByUid);
        assert_eq!(first.id, second.id);
        assert_eq!(second.role, UserRole::User);
        assert_eq!(user_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_reconcile_links_uid_to_row_found_by_email() {
        let pool = test_pool().await;
        let svc = UserService::new(pool.clone());
        let existing = insert_user(&pool, None, "a@x.com").await;

        let (user, how) = svc
            .reconcile(&VerifiedIdentity::new("uid-9", "a@x.com"), UserRole::User)
            .await
            .unwrap();

        assert_eq!(how, Reconciled::LinkedByEmail);
        assert_eq!(user.id, existing.id);
        assert_eq!(user.firebase_uid.as_deref(), Some("uid-9"));
        assert_eq!(user_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_reconcile_keeps_placeholder_owned_row() {
        let pool = test_pool().await;
        let svc = UserService::new(pool.clone());
        let existing = insert_user(&pool, Some("temp_1700000000000"), "a@x.com").await;

        let (user, how) = svc
            .reconcile(&VerifiedIdentity::new("uid-9", "a@x.com"), UserRole::User)
            .await
            .unwrap();

        assert_eq!(how, Reconciled::FoundByEmail);
        assert_eq!(user.id, existing.id);
        assert_eq!(user.firebase_uid.as_deref(), Some("temp_1700000000000"));
        assert_eq!(user_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_sync_user_sets_phone_and_refreshes_email() {
        let pool = test_pool().await;
        let svc = UserService::new(pool.clone());
        insert_user(&pool, Some("uid-1"), "old@x.com").await;

        let user = svc
            .sync_user(
                &VerifiedIdentity::new("uid-1", "new@x.com"),
                SyncUserRequest {
                    role: Some(UserRole::Consultant),
                    phone: Some("+15550100".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(user.email, "new@x.com");
        assert_eq!(user.phone.as_deref(), Some("+15550100"));
        // role is only applied on creation
        assert_eq!(user.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_sync_user_empty_phone_keeps_stored_phone() {
        let pool = test_pool().await;
        let svc = UserService::new(pool.clone());
        let identity = VerifiedIdentity::new("uid-1", "a@x.com");

        svc.sync_user(
            &identity,
            SyncUserRequest {
                role: None,
                phone: Some("+15550100".to_string()),
            },
        )
        .await
        .unwrap();
        let user = svc
            .sync_user(
                &identity,
                SyncUserRequest {
                    role: None,
                    phone: Some(String::new()),
                },
            )
            .await
            .unwrap();

        assert_eq!(user.phone.as_deref(), Some("+15550100"));
    }

    #[tokio::test]
    async fn test_sync_user_does_not_steal_taken_email() {
        let pool = test_pool().await;
        let svc = UserService::new(pool.clone());
        insert_user(&pool, Some("uid-1"), "one@x.com").await;
        insert_user(&pool, Some("uid-2"), "two@x.com").await;

        let user = svc
            .sync_user(
                &VerifiedIdentity::new("uid-1", "two@x.com"),
                SyncUserRequest::default(),
            )
            .await
            .unwrap();

        assert_eq!(user.email, "one@x.com");
        assert_eq!(user_count(&pool).await, 2);
    }
}
