pub mod client;
pub mod models;

pub use client::ProfileClient;
pub use models::PlayerProfile;
