pub mod current_user;

pub use current_user::CurrentUserResponse;
