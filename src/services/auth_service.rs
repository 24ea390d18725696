use crate::entities::{UserRole, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::external::{Mailer, OTP_EMAIL_SUBJECT, otp_email_html};
use crate::utils::{generate_otp_code, placeholder_uid, validate_email};
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use std::sync::Arc;

pub const OTP_VALID_MINUTES: i64 = 10;

/// Email one-time-password issuance and verification.
#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    mailer: Arc<dyn Mailer>,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, mailer: Arc<dyn Mailer>) -> Self {
        Self { pool, mailer }
    }

    pub async fn send_otp(&self, email: Option<&str>) -> AppResult<String> {
        self.send_otp_at(email, Utc::now()).await
    }

    /// Stores a fresh code on the user row (creating a placeholder user if
    /// needed) and mails it. Delivery failures are logged, not returned: the
    /// stored code stays valid either way.
    pub async fn send_otp_at(&self, email: Option<&str>, now: DateTime<Utc>) -> AppResult<String> {
        let email = validate_email(email, "Email is required")?;
        let code = generate_otp_code();
        let expiry = now + Duration::minutes(OTP_VALID_MINUTES);

        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(&self.pool)
            .await?;

        match existing {
            Some(user) => {
                let mut model = user.into_active_model();
                model.otp_code = Set(Some(code.clone()));
                model.otp_expiry = Set(Some(expiry));
                model.updated_at = Set(now);
                model.update(&self.pool).await?;
            }
            None => {
                users::ActiveModel {
                    firebase_uid: Set(Some(placeholder_uid(now))),
                    email: Set(email.clone()),
                    role: Set(UserRole::User),
                    is_verified: Set(false),
                    otp_code: Set(Some(code.clone())),
                    otp_expiry: Set(Some(expiry)),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.pool)
                .await?;
                log::info!("Created placeholder user for {email}");
            }
        }

        let html = otp_email_html(&code, OTP_VALID_MINUTES);
        match self.mailer.send_html(&email, OTP_EMAIL_SUBJECT, &html).await {
            Ok(()) => log::info!("OTP email sent to {email}"),
            Err(e) => log::error!("OTP email to {email} failed: {e:#}"),
        }

        Ok(email)
    }

    pub async fn verify_otp(&self, email: Option<&str>, otp: Option<&str>) -> AppResult<users::Model> {
        self.verify_otp_at(email, otp, Utc::now()).await
    }

    /// Checks the code, then marks the user verified and clears both OTP
    /// fields in one statement.
    pub async fn verify_otp_at(
        &self,
        email: Option<&str>,
        otp: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<users::Model> {
        let email = email.map(str::trim).filter(|e| !e.is_empty());
        let otp = otp.map(str::trim).filter(|o| !o.is_empty());
        let (Some(email), Some(otp)) = (email, otp) else {
            return Err(AppError::ValidationError(
                "Email and OTP are required".to_string(),
            ));
        };

        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if user.otp_code.as_deref() != Some(otp) {
            return Err(AppError::AuthError("Invalid OTP".to_string()));
        }
        if user.otp_expiry.is_none_or(|expiry| now > expiry) {
            return Err(AppError::AuthError("OTP expired".to_string()));
        }

        // the code predicate makes a concurrent second use of the same code a no-op
        let result = users::Entity::update_many()
            .col_expr(users::Column::IsVerified, Expr::value(true))
            .col_expr(users::Column::OtpCode, Expr::value(Option::<String>::None))
            .col_expr(
                users::Column::OtpExpiry,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(user.id))
            .filter(users::Column::OtpCode.eq(otp))
            .exec(&self.pool)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::AuthError("Invalid OTP".to_string()));
        }

        let user = users::Entity::find_by_id(user.id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        log::info!("Email verified: {}", user.email);
        Ok(user)
    }

    /// Clears code/expiry pairs that expired before `cutoff`.
    pub async fn sweep_expired_otps(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::OtpCode, Expr::value(Option::<String>::None))
            .col_expr(
                users::Column::OtpExpiry,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .filter(users::Column::OtpExpiry.lt(cutoff))
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected)
    }
}
