pub mod book;

pub use book::{BookDownload, BookService, Upload};
