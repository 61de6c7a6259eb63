pub mod audience;
pub mod call_control;

pub use audience::{AudienceFilter, AudienceResolver, DbAudienceResolver};
pub use call_control::{CallControl, HttpCallControl, NullCallControl, PlaceCallRequest};
