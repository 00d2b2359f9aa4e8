//! Record stores for users and books.
//!
//! Every book query is scoped by owner and ignores soft-deleted rows; a row
//! belonging to another user is indistinguishable from a missing one.

mod book;
mod error;
mod user;

pub use book::{BookStore, NewBook, SeaOrmBookStore};
pub use error::StoreError;
pub use user::{NewUser, SeaOrmUserStore, UserStore};
