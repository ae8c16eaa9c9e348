//! 进程内的上游模拟服务：资料接口、物品图片接口与固定背景图。

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use bnr_backend::config::{AppConfig, BackgroundSource};
use bnr_backend::features::text::{DEFAULT_SIZES, FontSet};
use bnr_backend::{AppState, build_router};
use image::{ImageFormat, Rgba, RgbaImage};
use serde_json::json;

pub const SECRET: &str = "BNGX";
pub const BG_SIZE: (u32, u32) = (600, 300);
pub const BG_COLOR: Rgba<u8> = Rgba([30, 60, 90, 255]);
pub const AVATAR_COLOR: Rgba<u8> = Rgba([220, 20, 20, 255]);
pub const AVATAR_ID: &str = "102000007";
pub const BANNER_ID: &str = "901000001";
pub const TINY_ID: &str = "555";

#[derive(Clone, Default)]
pub struct Hits {
    pub profile: Arc<AtomicUsize>,
    pub images: Arc<AtomicUsize>,
}

impl Hits {
    pub fn profile(&self) -> usize {
        self.profile.load(Ordering::SeqCst)
    }

    pub fn images(&self) -> usize {
        self.images.load(Ordering::SeqCst)
    }
}

pub struct MockUpstream {
    pub addr: SocketAddr,
    pub hits: Hits,
}

impl MockUpstream {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// 指向模拟上游的配置（背景为固定 URL）
    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.upstream.profile_url = self.url("/accinfo");
        config.upstream.image_url = self.url("/item");
        config.upstream.background = BackgroundSource::Fixed {
            url: self.url("/bg.png"),
        };
        config.upstream.timeout_secs = 5;
        config
    }
}

pub fn png(w: u32, h: u32, color: Rgba<u8>) -> Vec<u8> {
    let img = RgbaImage::from_pixel(w, h, color);
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).expect("encode png");
    buf.into_inner()
}

fn png_response(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "image/png")], bytes).into_response()
}

async fn profile(
    State(hits): State<Hits>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    hits.profile.fetch_add(1, Ordering::SeqCst);
    match q.get("uid").map(String::as_str) {
        Some("100200300") => Json(json!({
            "basicInfo": {
                "nickname": "Ahmed",
                "level": 45,
                "liked": 1200,
                "bannerId": BANNER_ID
            },
            "profileInfo": { "avatarId": AVATAR_ID }
        }))
        .into_response(),
        Some("no-avatar") => Json(json!({
            "basicInfo": { "nickname": "Nobody", "level": 3, "liked": 7, "bannerId": BANNER_ID },
            "profileInfo": { "avatarId": "404404" }
        }))
        .into_response(),
        Some("override") => Json(json!({
            "basicInfo": { "accountId": 987654321 }
        }))
        .into_response(),
        Some("garbage") => "<html>oops</html>".into_response(),
        _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn item(State(hits): State<Hits>, Query(q): Query<HashMap<String, String>>) -> Response {
    hits.images.fetch_add(1, Ordering::SeqCst);
    if q.get("key").map(String::as_str) != Some("PikaApis") {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match q.get("item_id").map(String::as_str) {
        Some(AVATAR_ID) => png_response(png(125, 125, AVATAR_COLOR)),
        Some(BANNER_ID) => png_response(png(BG_SIZE.0, BG_SIZE.1, BG_COLOR)),
        Some(TINY_ID) => png_response(vec![0x89, b'P', b'N', b'G']),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn background(State(hits): State<Hits>) -> Response {
    hits.images.fetch_add(1, Ordering::SeqCst);
    png_response(png(BG_SIZE.0, BG_SIZE.1, BG_COLOR))
}

async fn missing(State(hits): State<Hits>) -> Response {
    hits.images.fetch_add(1, Ordering::SeqCst);
    StatusCode::NOT_FOUND.into_response()
}

pub async fn spawn_upstream() -> MockUpstream {
    let hits = Hits::default();
    let app = Router::new()
        .route("/accinfo", get(profile))
        .route("/item", get(item))
        .route("/bg.png", get(background))
        .route("/missing.png", get(missing))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock upstream");
    });
    MockUpstream { addr, hits }
}

/// 用内置字体构建完整应用路由
pub fn build_app(config: &AppConfig) -> Router {
    let fonts = Arc::new(FontSet::builtin(&DEFAULT_SIZES));
    let state = AppState::new(config, fonts).expect("app state");
    build_router(state, &config.api.prefix)
}
