pub mod auth;
pub mod diagnosis;
pub mod health;
pub mod reports;
pub mod uploads;
