pub use super::admin::Entity as Admin;
