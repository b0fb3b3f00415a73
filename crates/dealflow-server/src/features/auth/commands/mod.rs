pub mod request_login;
pub mod verify_login;

pub use request_login::{RequestLoginCommand, RequestLoginError, RequestLoginResponse};
pub use verify_login::{TokenResponse, VerifyLoginCommand, VerifyLoginError};
