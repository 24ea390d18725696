pub mod code_generator;
pub mod email;
pub mod parsing;

pub use code_generator::{generate_otp_code, is_placeholder_uid, placeholder_uid};
pub use email::validate_email;
pub use parsing::*;
