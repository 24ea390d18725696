pub mod bookings;
pub mod consultants;
pub mod users;

pub use bookings as booking_entity;
pub use consultants as consultant_entity;
pub use users as user_entity;

pub use bookings::BookingStatus;
pub use consultants::ConsultantType;
pub use users::UserRole;
