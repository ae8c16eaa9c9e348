//! 多字体回退的文字渲染：字体集合、逐字符字体解析与单行绘制。

mod face;
mod font_set;
mod renderer;
mod resolver;

pub use face::{FontHandle, GlyphBounds, GlyphFace, MissingGlyphFace, OutlineFace};
pub use font_set::{DEFAULT_SIZES, FallbackFont, FontSet};
pub use renderer::{TextExtent, draw_text, measure_text};
pub use resolver::{FaceChoice, Resolved, resolve};

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use image::{Rgba, RgbaImage};

    use super::face::blend_coverage;
    use super::{FallbackFont, FontHandle, FontSet, GlyphBounds, GlyphFace};

    /// 覆盖固定字符集、固定宽度的测试字体
    #[derive(Debug)]
    pub struct StubFace {
        label: String,
        covers: Vec<char>,
        width: f32,
    }

    impl GlyphFace for StubFace {
        fn label(&self) -> &str {
            &self.label
        }

        fn ink_bounds(&self, ch: char) -> Option<GlyphBounds> {
            self.covers.contains(&ch).then_some(GlyphBounds {
                left: 1.0,
                top: 2.0,
                right: 5.0,
                bottom: 8.0,
            })
        }

        fn draw_box(&self, _ch: char) -> GlyphBounds {
            GlyphBounds {
                left: 0.0,
                top: 0.0,
                right: self.width,
                bottom: 10.0,
            }
        }

        fn draw(&self, canvas: &mut RgbaImage, origin: (f32, f32), ch: char, color: Rgba<u8>) {
            if !self.covers.contains(&ch) {
                return;
            }
            let (ox, oy) = (origin.0 as i64, origin.1 as i64);
            for y in oy + 2..oy + 8 {
                for x in ox + 1..ox + 5 {
                    blend_coverage(canvas, x, y, color, 1.0);
                }
            }
        }
    }

    pub fn stub(label: &str, covers: &str, width: u32) -> FontHandle {
        Arc::new(StubFace {
            label: label.to_string(),
            covers: covers.chars().collect(),
            width: width as f32,
        })
    }

    /// 只含 30 号字的字体集合
    pub fn font_set(primary: FontHandle, fallbacks: Vec<Option<FontHandle>>) -> FontSet {
        let fallbacks = fallbacks
            .into_iter()
            .enumerate()
            .map(|(i, face)| FallbackFont::new(format!("fb{i}"), BTreeMap::from([(30, face)])))
            .collect();
        FontSet::from_parts(BTreeMap::from([(30, primary)]), fallbacks)
    }
}
