pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    RequestLoginCommand, RequestLoginError, RequestLoginResponse, TokenResponse,
    VerifyLoginCommand, VerifyLoginError,
};
pub use queries::CurrentUserResponse;
pub use routes::auth_routes;
