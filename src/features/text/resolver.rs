use super::face::FontHandle;
use super::font_set::FontSet;

/// 字符最终落到的字体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceChoice {
    /// 主字体能渲染
    Primary,
    /// 第 i 个后备字体能渲染（i 为配置顺序下标）
    Fallback(usize),
    /// 没有字体能渲染，退回主字体（画出缺字框）
    Unresolved,
}

/// 一次解析的结果
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    pub choice: FaceChoice,
    pub face: &'a FontHandle,
}

/// 为单个字符选择字体：主字体 → 后备字体（按顺序）→ 退回主字体。
///
/// 纯函数，不产生副作用。
pub fn resolve(ch: char, size: u32, fonts: &FontSet) -> Resolved<'_> {
    let size = fonts.nearest_size(size);
    let primary = fonts.primary(size);
    if primary.can_render(ch) {
        return Resolved {
            choice: FaceChoice::Primary,
            face: primary,
        };
    }

    fonts
        .fallbacks()
        .iter()
        .enumerate()
        .find_map(|(i, fallback)| {
            fallback
                .face(size)
                .filter(|face| face.can_render(ch))
                .map(|face| Resolved {
                    choice: FaceChoice::Fallback(i),
                    face,
                })
        })
        .unwrap_or(Resolved {
            choice: FaceChoice::Unresolved,
            face: primary,
        })
}
