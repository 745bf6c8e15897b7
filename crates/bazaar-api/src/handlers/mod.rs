pub mod health;
pub mod images;
pub mod progress;
pub mod upload;
