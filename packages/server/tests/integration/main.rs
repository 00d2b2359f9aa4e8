mod auth;
mod book;
mod health;
