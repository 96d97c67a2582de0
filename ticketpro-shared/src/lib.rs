pub mod models;
pub mod pii;

pub use models::events::BackOfficeEvent;
pub use pii::Masked;
