pub mod identity;
pub mod mailer;
pub mod object_store;

pub use identity::*;
pub use mailer::*;
pub use object_store::*;
