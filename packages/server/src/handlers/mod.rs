pub mod auth;
pub mod book;
pub mod health;
