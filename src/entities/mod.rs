pub mod prelude;

pub mod admin;
