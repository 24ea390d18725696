use crate::entities::{
    BookingStatus, booking_entity as bookings, consultant_entity as consultants,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::external::VerifiedIdentity;
use crate::models::{BookingResponse, ConsultantResponse, CreateBookingRequest};
use crate::services::UserService;
use crate::utils::{parse_booking_date, parse_id};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;

#[derive(Clone)]
pub struct BookingService {
    pool: DatabaseConnection,
    user_service: UserService,
}

impl BookingService {
    pub fn new(pool: DatabaseConnection, user_service: UserService) -> Self {
        Self { pool, user_service }
    }

    pub async fn create_booking(
        &self,
        identity: &VerifiedIdentity,
        request: CreateBookingRequest,
    ) -> AppResult<BookingResponse> {
        let consultant_id = parse_id(request.consultant_id.as_ref(), "consultant_id")?;
        let date = request.date.as_deref().map(str::trim).filter(|d| !d.is_empty());
        let time_slot = request
            .time_slot
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        let (Some(consultant_id), Some(date), Some(time_slot)) = (consultant_id, date, time_slot)
        else {
            return Err(AppError::ValidationError(
                "consultant_id, date, and time_slot are required".to_string(),
            ));
        };
        let date = parse_booking_date(date)?;

        let user = self.user_service.require_by_uid(&identity.uid).await?;
        let consultant = consultants::Entity::find_by_id(consultant_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Consultant not found".to_string()))?;

        let now = Utc::now();
        let booking = bookings::ActiveModel {
            user_id: Set(user.id),
            consultant_id: Set(consultant.id),
            date: Set(date),
            time_slot: Set(time_slot.to_string()),
            status: Set(BookingStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Booking {} created by {} with consultant {}",
            booking.id,
            user.email,
            consultant.id
        );

        let mut response = BookingResponse::from(booking);
        response.consultant = Some(ConsultantResponse::from(consultant));
        Ok(response)
    }

    /// The caller's bookings, newest first, each carrying its consultant and
    /// the consultant's owner email.
    pub async fn list_bookings(&self, identity: &VerifiedIdentity) -> AppResult<Vec<BookingResponse>> {
        let user = self.user_service.require_by_uid(&identity.uid).await?;

        let rows = bookings::Entity::find()
            .filter(bookings::Column::UserId.eq(user.id))
            .order_by_desc(bookings::Column::CreatedAt)
            .order_by_desc(bookings::Column::Id)
            .find_also_related(consultants::Entity)
            .all(&self.pool)
            .await?;

        let owner_ids: Vec<i64> = rows
            .iter()
            .filter_map(|(_, c)| c.as_ref().map(|c| c.user_id))
            .collect();
        let owners: HashMap<i64, String> = if owner_ids.is_empty() {
            HashMap::new()
        } else {
            users::Entity::find()
                .filter(users::Column::Id.is_in(owner_ids))
                .all(&self.pool)
                .await?
                .into_iter()
                .map(|u| (u.id, u.email))
                .collect()
        };

        Ok(rows
            .into_iter()
            .map(|(booking, consultant)| {
                let mut response = BookingResponse::from(booking);
                response.consultant = consultant.map(|c| {
                    let owner = owners.get(&c.user_id).cloned();
                    let c = ConsultantResponse::from(c);
                    match owner {
                        Some(email) => c.with_owner(email),
                        None => c,
                    }
                });
                response
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::entities::UserRole;
    use chrono::TimeZone;
    use sea_orm::{IntoActiveModel, PaginatorTrait};
    use serde_json::json;

    struct Fixture {
        pool: DatabaseConnection,
        svc: BookingService,
        client: VerifiedIdentity,
        consultant_id: i64,
    }

    async fn fixture() -> Fixture {
        let pool = test_pool().await;
        let user_service = UserService::new(pool.clone());

        let owner = VerifiedIdentity::new("uid-owner", "owner@x.com");
        let (owner_row, _) = user_service
            .reconcile(&owner, UserRole::Consultant)
            .await
            .unwrap();
        let now = Utc::now();
        let consultant = consultants::ActiveModel {
            user_id: Set(owner_row.id),
            consultant_type: Set(Default::default()),
            domain: Set("Tax".into()),
            hourly_price: Set(100.0),
            is_verified: Set(true),
            rating: Set(0.0),
            total_reviews: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&pool)
        .await
        .unwrap();

        let client = VerifiedIdentity::new("uid-client", "client@x.com");
        user_service.reconcile(&client, UserRole::User).await.unwrap();

        Fixture {
            svc: BookingService::new(pool.clone(), user_service),
            pool,
            client,
            consultant_id: consultant.id,
        }
    }

    fn request(consultant_id: serde_json::Value, date: &str, slot: &str) -> CreateBookingRequest {
        CreateBookingRequest {
            consultant_id: Some(consultant_id),
            date: Some(date.to_string()),
            time_slot: Some(slot.to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_booking_is_pending() {
        let f = fixture().await;

        let booking = f
            .svc
            .create_booking(
                &f.client,
                request(json!(f.consultant_id.to_string()), "2025-11-03", "10:00 AM"),
            )
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.consultant_id, f.consultant_id);
        assert_eq!(booking.time_slot, "10:00 AM");
        assert_eq!(booking.date, Utc.with_ymd_and_hms(2025, 11, 3, 0, 0, 0).unwrap());
        assert_eq!(bookings::Entity::find().count(&f.pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_booking_requires_fields() {
        let f = fixture().await;

        for req in [
            CreateBookingRequest::default(),
            request(json!(f.consultant_id), "", "10:00 AM"),
            request(json!(f.consultant_id), "2025-11-03", " "),
            CreateBookingRequest {
                consultant_id: None,
                ..request(json!(1), "2025-11-03", "10:00 AM")
            },
        ] {
            match f.svc.create_booking(&f.client, req).await {
                Err(AppError::ValidationError(msg)) => {
                    assert_eq!(msg, "consultant_id, date, and time_slot are required")
                }
                other => panic!("unexpected: {other:?}"),
            }
        }

        match f
            .svc
            .create_booking(&f.client, request(json!(f.consultant_id), "03/11/2025", "10:00"))
            .await
        {
            Err(AppError::ValidationError(msg)) => assert_eq!(msg, "Invalid date format"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_booking_not_found() {
        let f = fixture().await;

        let stranger = VerifiedIdentity::new("uid-nobody", "nobody@x.com");
        match f
            .svc
            .create_booking(&stranger, request(json!(f.consultant_id), "2025-11-03", "10:00"))
            .await
        {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "User not found"),
            other => panic!("unexpected: {other:?}"),
        }

        match f
            .svc
            .create_booking(&f.client, request(json!(9999), "2025-11-03", "10:00"))
            .await
        {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "Consultant not found"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_bookings_newest_first_with_owner() {
        let f = fixture().await;

        let first = f
            .svc
            .create_booking(&f.client, request(json!(f.consultant_id), "2025-11-03", "09:00"))
            .await
            .unwrap();
        let second = f
            .svc
            .create_booking(&f.client, request(json!(f.consultant_id), "2025-11-04", "11:00"))
            .await
            .unwrap();

        // push the first booking back in time so ordering does not depend on clock resolution
        let mut older = bookings::Entity::find_by_id(first.id)
            .one(&f.pool)
            .await
            .unwrap()
            .unwrap()
            .into_active_model();
        older.created_at = Set(Utc::now() - chrono::Duration::hours(1));
        older.update(&f.pool).await.unwrap();

        let list = f.svc.list_bookings(&f.client).await.unwrap();
        let ids: Vec<i64> = list.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let consultant = list[0].consultant.as_ref().unwrap();
        assert_eq!(consultant.id, f.consultant_id);
        assert_eq!(consultant.user.as_ref().unwrap().email, "owner@x.com");
    }

    #[tokio::test]
    async fn test_list_bookings_only_callers() {
        let f = fixture().await;
        f.svc
            .create_booking(&f.client, request(json!(f.consultant_id), "2025-11-03", "09:00"))
            .await
            .unwrap();

        let other = VerifiedIdentity::new("uid-other", "other@x.com");
        f.svc
            .user_service
            .reconcile(&other, UserRole::User)
            .await
            .unwrap();

        assert!(f.svc.list_bookings(&other).await.unwrap().is_empty());
        assert_eq!(f.svc.list_bookings(&f.client).await.unwrap().len(), 1);
    }
}
