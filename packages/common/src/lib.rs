pub mod book;
pub mod storage;

pub use book::{BookFormat, UploadRejection};
