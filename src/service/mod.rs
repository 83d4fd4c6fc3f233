pub mod attendance;
pub mod auth;
pub mod crypto;
pub mod event;
pub mod invitation;
pub mod log;
pub mod user;
pub mod validation;
