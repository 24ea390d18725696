use crate::entities::{UserRole, consultant_entity as consultants, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::external::{ObjectStore, VerifiedIdentity};
use crate::models::*;
use crate::services::UserService;
use crate::utils::{parse_consultant_type, parse_hourly_price};
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;

/// Image bytes received from a multipart upload.
#[derive(Debug)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

#[derive(Clone)]
pub struct ConsultantService {
    pool: DatabaseConnection,
    user_service: UserService,
    object_store: Arc<dyn ObjectStore>,
}

impl ConsultantService {
    pub fn new(
        pool: DatabaseConnection,
        user_service: UserService,
        object_store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            pool,
            user_service,
            object_store,
        }
    }

    /// Creates the caller's profile, or replaces every column of an existing
    /// one. A single upsert on the unique `user_id`, inside a transaction.
    pub async fn register(
        &self,
        identity: &VerifiedIdentity,
        request: RegisterConsultantRequest,
    ) -> AppResult<ConsultantResponse> {
        let domain = request
            .domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        let price = parse_hourly_price(request.hourly_price.as_ref())?;
        let (Some(domain), Some(price)) = (domain, price) else {
            return Err(AppError::ValidationError(
                "Domain and hourly_price are required".to_string(),
            ));
        };
        let consultant_type = parse_consultant_type(request.consultant_type.as_deref())?
            .unwrap_or_default();

        let (user, _) = self
            .user_service
            .reconcile(identity, UserRole::Consultant)
            .await?;

        let now = Utc::now();
        let profile = consultants::ActiveModel {
            user_id: Set(user.id),
            consultant_type: Set(consultant_type),
            domain: Set(domain),
            bio: Set(non_empty(request.bio)),
            languages: Set(non_empty(request.languages)),
            hourly_price: Set(price),
            profile_pic: Set(None),
            is_verified: Set(false),
            rating: Set(0.0),
            total_reviews: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let txn = self.pool.begin().await?;
        consultants::Entity::insert(profile)
            .on_conflict(
                OnConflict::column(consultants::Column::UserId)
                    .update_columns([
                        consultants::Column::ConsultantType,
                        consultants::Column::Domain,
                        consultants::Column::Bio,
                        consultants::Column::Languages,
                        consultants::Column::HourlyPrice,
                        consultants::Column::ProfilePic,
                        consultants::Column::IsVerified,
                        consultants::Column::Rating,
                        consultants::Column::TotalReviews,
                        consultants::Column::CreatedAt,
                        consultants::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
        let consultant = consultants::Entity::find()
            .filter(consultants::Column::UserId.eq(user.id))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::InternalError("consultant upsert vanished".to_string()))?;
        txn.commit().await?;

        log::info!("Consultant profile registered for {}", user.email);
        Ok(ConsultantResponse::from(consultant).with_owner(user.email))
    }

    async fn own_profile(
        &self,
        identity: &VerifiedIdentity,
    ) -> AppResult<(users::Model, consultants::Model)> {
        let user = self.user_service.require_by_uid(&identity.uid).await?;
        let consultant = consultants::Entity::find()
            .filter(consultants::Column::UserId.eq(user.id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Consultant profile not found".to_string()))?;
        Ok((user, consultant))
    }

    pub async fn get_profile(&self, identity: &VerifiedIdentity) -> AppResult<ConsultantResponse> {
        let (user, consultant) = self.own_profile(identity).await?;
        Ok(ConsultantResponse::from(consultant).with_owner(user.email))
    }

    /// Partial merge onto the stored profile.
    ///
    /// - `type`, `domain`: absent or empty keeps the stored value.
    /// - `bio`, `languages`: only an absent key keeps the stored value; `null`
    ///   or `""` clears it.
    /// - `hourly_price`: absent or falsy keeps the stored value.
    pub async fn update_profile(
        &self,
        identity: &VerifiedIdentity,
        request: UpdateConsultantRequest,
    ) -> AppResult<ConsultantResponse> {
        let consultant_type = parse_consultant_type(request.consultant_type.as_deref())?;
        let price = parse_hourly_price(request.hourly_price.as_ref())?;
        let (user, consultant) = self.own_profile(identity).await?;

        let mut model = consultant.into_active_model();
        if let Some(t) = consultant_type {
            model.consultant_type = Set(t);
        }
        if let Some(domain) = request
            .domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            model.domain = Set(domain.to_string());
        }
        if let Some(bio) = request.bio {
            model.bio = Set(non_empty(bio));
        }
        if let Some(languages) = request.languages {
            model.languages = Set(non_empty(languages));
        }
        if let Some(price) = price {
            model.hourly_price = Set(price);
        }
        model.updated_at = Set(Utc::now());
        let consultant = model.update(&self.pool).await?;

        log::info!("Consultant profile updated for {}", user.email);
        Ok(ConsultantResponse::from(consultant).with_owner(user.email))
    }

    /// Uploads the picture and points the caller's profile at it. The profile
    /// is resolved first so nothing is uploaded for a caller without one.
    pub async fn upload_profile_pic(
        &self,
        identity: &VerifiedIdentity,
        upload: ImageUpload,
    ) -> AppResult<ProfilePicResponse> {
        let (user, consultant) = self.own_profile(identity).await?;

        let url = self
            .object_store
            .upload_image(upload.bytes, &upload.filename, &upload.content_type)
            .await
            .map_err(|e| {
                log::error!("Profile picture upload for {} failed: {e:#}", user.email);
                AppError::ExternalApiError("Failed to upload profile picture".to_string())
            })?;

        let mut model = consultant.into_active_model();
        model.profile_pic = Set(Some(url.clone()));
        model.updated_at = Set(Utc::now());
        let consultant = model.update(&self.pool).await?;

        log::info!("Profile picture uploaded for {}", user.email);
        Ok(ProfilePicResponse {
            profile_pic: url,
            consultant: ConsultantResponse::from(consultant).with_owner(user.email),
        })
    }

    /// Admin-verified consultants, optionally filtered by a case-insensitive
    /// substring of their domain.
    pub async fn list_directory(&self, query: &DirectoryQuery) -> AppResult<Vec<ConsultantResponse>> {
        let mut select =
            consultants::Entity::find().filter(consultants::Column::IsVerified.eq(true));

        if let Some(domain) = query
            .domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            let pattern = format!("%{}%", escape_like(&domain.to_lowercase()));
            select = select.filter(
                Expr::expr(Func::lower(Expr::col((
                    consultants::Entity,
                    consultants::Column::Domain,
                ))))
                .like(LikeExpr::new(pattern).escape('\\')),
            );
        }

        let rows = select
            .order_by_asc(consultants::Column::Id)
            .find_also_related(users::Entity)
            .all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(with_owner).collect())
    }

    pub async fn get_consultant(&self, id: i64) -> AppResult<ConsultantResponse> {
        consultants::Entity::find_by_id(id)
            .find_also_related(users::Entity)
            .one(&self.pool)
            .await?
            .map(with_owner)
            .ok_or_else(|| AppError::NotFound("Consultant not found".to_string()))
    }

    pub async fn set_verified(&self, id: i64, verified: bool) -> AppResult<ConsultantResponse> {
        let consultant = consultants::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Consultant not found".to_string()))?;

        let mut model = consultant.into_active_model();
        model.is_verified = Set(verified);
        model.updated_at = Set(Utc::now());
        let consultant = model.update(&self.pool).await?;

        log::info!("Consultant {id} verified={verified}");
        Ok(ConsultantResponse::from(consultant))
    }
}

fn with_owner((consultant, owner): (consultants::Model, Option<users::Model>)) -> ConsultantResponse {
    let response = ConsultantResponse::from(consultant);
    match owner {
        Some(user) => response.with_owner(user.email),
        None => response,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
