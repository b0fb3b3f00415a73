//! Who does the presented session token belong to

use serde::{Deserialize, Serialize};

use crate::auth::AuthenticatedUser;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUserResponse {
    pub identity: String,
}

pub fn handle(user: AuthenticatedUser) -> CurrentUserResponse {
    CurrentUserResponse { identity: user.0 }
}
