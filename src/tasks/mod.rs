//! Background scheduled tasks.
//!
//! Call `spawn_all` once during startup; tasks are detached with `tokio::spawn`.

use crate::services::AuthService;
use chrono::{Duration, Utc};

/// How often stale OTP codes are swept.
const OTP_SWEEP_INTERVAL_SECS: u64 = 10 * 60;
/// Codes are kept this long past expiry before being cleared.
const OTP_RETENTION_HOURS: i64 = 1;

pub fn spawn_all(auth_service: AuthService) {
    tokio::spawn(async move {
        loop {
            let cutoff = Utc::now() - Duration::hours(OTP_RETENTION_HOURS);
            match auth_service.sweep_expired_otps(cutoff).await {
                Ok(n) if n > 0 => log::info!("Cleared expired OTP codes: {n}"),
                Ok(_) => {}
                Err(e) => log::error!("Failed to clear expired OTP codes: {e:?}"),
            }
            tokio::time::sleep(std::time::Duration::from_secs(OTP_SWEEP_INTERVAL_SECS)).await;
        }
    });
}
