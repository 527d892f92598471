pub mod auth;
pub mod extract;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use extract::{FormParts, JsonBody, RecordId};
pub use response::ApiResponse;
