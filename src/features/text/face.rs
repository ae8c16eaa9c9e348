use std::fmt;
use std::sync::Arc;

use ab_glyph::{Font, FontVec, Glyph, PxScale, ScaleFont, point};
use image::{Pixel, Rgba, RgbaImage};

/// 字形在绘制原点坐标系下的矩形（原点为行顶左侧，y 向下）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphBounds {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl GlyphBounds {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

/// 某个字号下的一个字体。
///
/// 实现者在构造时就绑定了字号，方法只接收字符。
pub trait GlyphFace: Send + Sync + fmt::Debug {
    /// 用于日志的字体名
    fn label(&self) -> &str;

    /// 字形墨迹包围盒；`None` 表示该字体没有此字符（或只有缺字框）
    fn ink_bounds(&self, ch: char) -> Option<GlyphBounds>;

    /// 绘制盒：水平方向覆盖 `[min(0, 墨迹左), max(步进, 墨迹右)]`
    fn draw_box(&self, ch: char) -> GlyphBounds;

    /// 在 `origin`（行顶左侧）绘制单个字符
    fn draw(&self, canvas: &mut RgbaImage, origin: (f32, f32), ch: char, color: Rgba<u8>);

    /// 能否渲染该字符：墨迹包围盒非空
    fn can_render(&self, ch: char) -> bool {
        self.ink_bounds(ch).is_some_and(|b| !b.is_empty())
    }
}

/// 共享的字体句柄
pub type FontHandle = Arc<dyn GlyphFace>;

/// 基于 ab_glyph 轮廓字体的实现
pub struct OutlineFace {
    label: String,
    font: Arc<FontVec>,
    scale: PxScale,
}

impl fmt::Debug for OutlineFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutlineFace")
            .field("label", &self.label)
            .field("scale", &self.scale.y)
            .finish()
    }
}

impl OutlineFace {
    /// `size` 为 em 像素大小，换算为 ab_glyph 的行高缩放
    pub fn new(label: impl Into<String>, font: Arc<FontVec>, size: u32) -> Self {
        let em = size as f32;
        let scale = match font.units_per_em() {
            Some(upem) if upem > 0.0 => PxScale::from(em * font.height_unscaled() / upem),
            _ => PxScale::from(em),
        };
        Self {
            label: label.into(),
            font,
            scale,
        }
    }

    fn glyph_at(&self, ch: char, origin: (f32, f32)) -> Glyph {
        let ascent = self.font.as_scaled(self.scale).ascent();
        self.font
            .glyph_id(ch)
            .with_scale_and_position(self.scale, point(origin.0, origin.1 + ascent))
    }
}

impl GlyphFace for OutlineFace {
    fn label(&self) -> &str {
        &self.label
    }

    fn ink_bounds(&self, ch: char) -> Option<GlyphBounds> {
        let glyph = self.glyph_at(ch, (0.0, 0.0));
        // .notdef 画出来是缺字框，不算能渲染
        if glyph.id.0 == 0 {
            return None;
        }
        let outlined = self.font.outline_glyph(glyph)?;
        let rect = outlined.px_bounds();
        let bounds = GlyphBounds {
            left: rect.min.x,
            top: rect.min.y,
            right: rect.max.x,
            bottom: rect.max.y,
        };
        (!bounds.is_empty()).then_some(bounds)
    }

    fn draw_box(&self, ch: char) -> GlyphBounds {
        let scaled = self.font.as_scaled(self.scale);
        let advance = scaled.h_advance(self.font.glyph_id(ch));
        let ink = self
            .font
            .outline_glyph(self.glyph_at(ch, (0.0, 0.0)))
            .map(|g| g.px_bounds());
        let (ink_left, ink_right) = ink.map_or((0.0, 0.0), |r| (r.min.x, r.max.x));
        GlyphBounds {
            left: ink_left.min(0.0),
            top: 0.0,
            right: ink_right.max(advance),
            bottom: scaled.height(),
        }
    }

    fn draw(&self, canvas: &mut RgbaImage, origin: (f32, f32), ch: char, color: Rgba<u8>) {
        let Some(outlined) = self.font.outline_glyph(self.glyph_at(ch, origin)) else {
            return;
        };
        let rect = outlined.px_bounds();
        let (x0, y0) = (rect.min.x as i64, rect.min.y as i64);
        outlined.draw(|gx, gy, coverage| {
            blend_coverage(canvas, x0 + gx as i64, y0 + gy as i64, color, coverage);
        });
    }
}

/// 最后的兜底字体：不覆盖任何字符，每个非空白字符画一个空心缺字框。
///
/// 主字体文件和系统字体都不可用时使用，保证主字体槽位永不为空。
#[derive(Debug, Clone)]
pub struct MissingGlyphFace {
    size: f32,
}

impl MissingGlyphFace {
    pub const LABEL: &'static str = "builtin:missing-glyph";

    pub fn new(size: u32) -> Self {
        Self {
            size: size.max(1) as f32,
        }
    }

    fn box_rect(&self) -> GlyphBounds {
        GlyphBounds {
            left: (self.size * 0.08).round(),
            top: (self.size * 0.2).round(),
            right: (self.size * 0.52).round(),
            bottom: (self.size * 0.9).round(),
        }
    }
}

impl GlyphFace for MissingGlyphFace {
    fn label(&self) -> &str {
        Self::LABEL
    }

    fn ink_bounds(&self, _ch: char) -> Option<GlyphBounds> {
        None
    }

    fn draw_box(&self, _ch: char) -> GlyphBounds {
        GlyphBounds {
            left: 0.0,
            top: 0.0,
            right: (self.size * 0.6).round(),
            bottom: self.size,
        }
    }

    fn draw(&self, canvas: &mut RgbaImage, origin: (f32, f32), ch: char, color: Rgba<u8>) {
        if ch.is_whitespace() {
            return;
        }
        let r = self.box_rect();
        let stroke = (self.size / 15.0).round().max(1.0) as i64;
        let x0 = (origin.0 + r.left) as i64;
        let y0 = (origin.1 + r.top) as i64;
        let x1 = (origin.0 + r.right) as i64;
        let y1 = (origin.1 + r.bottom) as i64;
        for y in y0..y1 {
            for x in x0..x1 {
                let on_edge =
                    x < x0 + stroke || x >= x1 - stroke || y < y0 + stroke || y >= y1 - stroke;
                if on_edge {
                    blend_coverage(canvas, x, y, color, 1.0);
                }
            }
        }
    }
}

/// 按覆盖率将颜色混合到画布（越界像素忽略）
pub fn blend_coverage(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let alpha = (coverage.clamp(0.0, 1.0) * color[3] as f32).round() as u8;
    if alpha == 0 {
        return;
    }
    let mut src = color;
    src[3] = alpha;
    canvas.get_pixel_mut(x as u32, y as u32).blend(&src);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_glyph_face_renders_nothing_but_draws_a_box() {
        let face = MissingGlyphFace::new(30);
        assert!(!face.can_render('A'));
        assert_eq!(face.draw_box('A').width(), 18.0);

        let mut canvas = RgbaImage::from_pixel(40, 40, Rgba([0, 0, 0, 255]));
        face.draw(&mut canvas, (0.0, 0.0), 'A', Rgba([255, 255, 255, 255]));
        // 左边框
        assert_eq!(*canvas.get_pixel(2, 15), Rgba([255, 255, 255, 255]));
        // 框内部保持原色
        assert_eq!(*canvas.get_pixel(9, 15), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn missing_glyph_face_skips_whitespace() {
        let face = MissingGlyphFace::new(30);
        let mut canvas = RgbaImage::from_pixel(40, 40, Rgba([0, 0, 0, 255]));
        face.draw(&mut canvas, (0.0, 0.0), ' ', Rgba([255, 255, 255, 255]));
        assert!(canvas.pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn blend_coverage_mixes_and_clips() {
        let mut canvas = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        blend_coverage(&mut canvas, 0, 0, Rgba([255, 255, 255, 255]), 0.5);
        let p = canvas.get_pixel(0, 0);
        assert!((127..=128).contains(&p[0]));
        assert_eq!(p[3], 255);
        // 越界不 panic
        blend_coverage(&mut canvas, -1, 5, Rgba([255, 0, 0, 255]), 1.0);
    }

    #[test]
    fn blend_coverage_respects_color_alpha_and_zero_coverage() {
        let mut canvas = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        // 半透明颜色在全覆盖下也只混合一半
        blend_coverage(&mut canvas, 0, 0, Rgba([200, 200, 200, 128]), 1.0);
        let p = canvas.get_pixel(0, 0);
        assert!((99..=101).contains(&p[0]), "got {p:?}");
        assert_eq!(p[3], 255);

        blend_coverage(&mut canvas, 1, 0, Rgba([255, 255, 255, 255]), 0.0);
        assert_eq!(*canvas.get_pixel(1, 0), Rgba([0, 0, 0, 255]));

        // 透明底上全覆盖直接得到原色
        let mut clear = RgbaImage::new(1, 1);
        blend_coverage(&mut clear, 0, 0, Rgba([10, 20, 30, 255]), 1.0);
        assert_eq!(*clear.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
    }
}
