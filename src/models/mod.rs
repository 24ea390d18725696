pub mod booking;
pub mod common;
pub mod consultant;
pub mod user;

pub use booking::*;
pub use common::*;
pub use consultant::*;
pub use user::*;
