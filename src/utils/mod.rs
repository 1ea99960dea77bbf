pub mod auth;
pub mod imaging;
pub mod validation;
