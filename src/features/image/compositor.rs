use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

use crate::error::AppError;
use crate::features::text::{FontSet, draw_text, measure_text};

/// 头像边长
pub const AVATAR_SIZE: u32 = 125;
/// 头像左上角位置
pub const AVATAR_POS: (i64, i64) = (90, 82);
/// 头像不可用时的占位色
pub const PLACEHOLDER_COLOR: Rgba<u8> = Rgba([128, 128, 128, 255]);

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

const LEVEL_SIZE: u32 = 50;
const NICKNAME_SIZE: u32 = 50;
const UID_SIZE: u32 = 35;
const LIKES_SIZE: u32 = 40;
const SIGNATURE_SIZE: u32 = 30;

/// 卡片上的文字内容
#[derive(Debug, Clone, PartialEq)]
pub struct CardText {
    pub nickname: String,
    pub level: i64,
    pub liked: i64,
    pub uid: String,
    pub signature: String,
}

/// 在背景上合成头像与文字，返回的画布尺寸与背景相同。
///
/// `avatar` 为 `None` 时在头像位置画灰色占位方块。
pub fn compose_card(
    background: RgbaImage,
    avatar: Option<&RgbaImage>,
    text: &CardText,
    fonts: &FontSet,
) -> RgbaImage {
    let mut canvas = background;
    let (ax, ay) = AVATAR_POS;

    match avatar {
        Some(img) => image::imageops::overlay(&mut canvas, img, ax, ay),
        None => {
            let placeholder = RgbaImage::from_pixel(AVATAR_SIZE, AVATAR_SIZE, PLACEHOLDER_COLOR);
            image::imageops::overlay(&mut canvas, &placeholder, ax, ay);
        }
    }

    let (ax, ay) = (ax as f32, ay as f32);
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);

    let level = format!("Lv. {}", text.level);
    draw_text(
        &mut canvas,
        (ax - 40.0, ay + 160.0),
        &level,
        fonts,
        LEVEL_SIZE,
        BLACK,
    );
    draw_text(
        &mut canvas,
        (ax + AVATAR_SIZE as f32 + 80.0, ay - 3.0),
        &text.nickname,
        fonts,
        NICKNAME_SIZE,
        BLACK,
    );

    let uid = measure_text(&text.uid, fonts, UID_SIZE);
    let uid_pos = (w - uid.width - 110.0, h - uid.height() - 17.0);
    draw_text(&mut canvas, uid_pos, &text.uid, fonts, UID_SIZE, WHITE);

    let liked = text.liked.to_string();
    let likes = measure_text(&liked, fonts, LIKES_SIZE);
    draw_text(
        &mut canvas,
        (w - likes.width - 60.0, uid_pos.1 - likes.height() - 25.0),
        &liked,
        fonts,
        LIKES_SIZE,
        BLACK,
    );

    let signature = measure_text(&text.signature, fonts, SIGNATURE_SIZE);
    draw_text(
        &mut canvas,
        (w - signature.width - 30.0, 30.0),
        &text.signature,
        fonts,
        SIGNATURE_SIZE,
        WHITE,
    );

    canvas
}

/// 编码为 PNG 字节
pub fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>, AppError> {
    let mut buf = Cursor::new(Vec::new());
    canvas
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| AppError::Internal(format!("PNG 编码失败: {e}")))?;
    Ok(buf.into_inner())
}
