use image::{Rgba, RgbaImage};

use super::font_set::FontSet;
use super::resolver::resolve;

/// 文本度量结果（相对绘制原点）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextExtent {
    /// 各字符绘制盒宽度之和
    pub width: f32,
    pub top: f32,
    pub bottom: f32,
}

impl TextExtent {
    pub fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }
}

/// 逐字符绘制单行文本，返回光标最终的 x 坐标。
///
/// 每个字符独立选择字体，光标按该字符绘制盒宽度右移；不做字距、连字与双向重排，
/// 从右到左的文字按存储顺序从左到右排列。
pub fn draw_text(
    canvas: &mut RgbaImage,
    start: (f32, f32),
    text: &str,
    fonts: &FontSet,
    size: u32,
    color: Rgba<u8>,
) -> f32 {
    let (mut x, y) = start;
    for ch in text.chars() {
        let resolved = resolve(ch, size, fonts);
        resolved.face.draw(canvas, (x, y), ch, color);
        x += resolved.face.draw_box(ch).width();
    }
    x
}

/// 度量文本：宽度与 `draw_text` 的光标位移一致，高度取墨迹范围。
///
/// 整段文本都没有墨迹时（例如只有缺字框字体），高度退回绘制盒高度。
pub fn measure_text(text: &str, fonts: &FontSet, size: u32) -> TextExtent {
    let mut width = 0.0;
    let mut ink: Option<(f32, f32)> = None;
    let mut boxes: Option<(f32, f32)> = None;

    for ch in text.chars() {
        let face = resolve(ch, size, fonts).face;
        let draw_box = face.draw_box(ch);
        width += draw_box.width();
        boxes = Some(merge(boxes, draw_box.top, draw_box.bottom));
        if let Some(b) = face.ink_bounds(ch) {
            ink = Some(merge(ink, b.top, b.bottom));
        }
    }

    let (top, bottom) = ink.or(boxes).unwrap_or((0.0, 0.0));
    TextExtent { width, top, bottom }
}

fn merge(acc: Option<(f32, f32)>, top: f32, bottom: f32) -> (f32, f32) {
    match acc {
        Some((t, b)) => (t.min(top), b.max(bottom)),
        None => (top, bottom),
    }
}
