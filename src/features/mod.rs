pub mod health;
pub mod image;
pub mod profile;
pub mod text;
