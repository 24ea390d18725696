use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

const PLACEHOLDER_UID_PREFIX: &str = "temp_";

/// 6-digit numeric one-time code, never with a leading zero.
pub fn generate_otp_code() -> String {
    let mut rng = rand::thread_rng();
    format!("{:06}", rng.gen_range(100000..=999999))
}

/// UID given to users created by an OTP request before the identity
/// provider has issued them a real one. The random suffix keeps UIDs
/// unique when several users are created within the same millisecond.
pub fn placeholder_uid(now: DateTime<Utc>) -> String {
    format!(
        "{PLACEHOLDER_UID_PREFIX}{}_{}",
        now.timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

pub fn is_placeholder_uid(uid: &str) -> bool {
    uid.starts_with(PLACEHOLDER_UID_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_otp_code() {
        for _ in 0..100 {
            let code = generate_otp_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));

            let code_num: u32 = code.parse().unwrap();
            assert!((100000..=999999).contains(&code_num));
        }
    }

    #[test]
    fn test_placeholder_uid() {
        let now = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let uid = placeholder_uid(now);
        assert!(uid.starts_with("temp_1700000000123_"));
        assert_eq!(uid.len(), "temp_1700000000123_".len() + 32);
        assert!(is_placeholder_uid(&uid));
        assert_ne!(uid, placeholder_uid(now));
        assert!(!is_placeholder_uid("kq2YtQ1nVbQ8"));
    }
}
