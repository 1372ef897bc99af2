pub mod auth;
pub mod system;
pub mod users;
pub mod vegetables;
