mod compositor;
mod fetcher;
pub mod handler;
mod service;
mod types;

pub use compositor::{
    AVATAR_POS, AVATAR_SIZE, CardText, PLACEHOLDER_COLOR, compose_card, encode_png,
};
pub use fetcher::{ImageFetcher, decode_image};
pub use handler::create_image_router;
pub use service::CardService;
pub use types::CardQuery;
