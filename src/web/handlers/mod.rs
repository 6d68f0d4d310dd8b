pub mod health;
pub mod pages;
pub mod stream;
pub mod upload;
