use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use ab_glyph::FontVec;
use resvg::usvg::fontdb;

use super::face::{FontHandle, MissingGlyphFace, OutlineFace};
use crate::config::FontsConfig;

/// 未配置字号时使用的默认字号
pub const DEFAULT_SIZES: [u32; 4] = [30, 35, 40, 50];

/// 一个后备字体在各字号下的句柄（加载失败的字号为 `None`）
#[derive(Debug, Clone)]
pub struct FallbackFont {
    label: String,
    faces: BTreeMap<u32, Option<FontHandle>>,
}

impl FallbackFont {
    pub fn new(label: impl Into<String>, faces: BTreeMap<u32, Option<FontHandle>>) -> Self {
        Self {
            label: label.into(),
            faces,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// 指定字号的句柄
    pub fn face(&self, size: u32) -> Option<&FontHandle> {
        self.faces.get(&size).and_then(Option::as_ref)
    }

    /// 是否在任意字号下可用
    pub fn is_available(&self) -> bool {
        self.faces.values().any(Option::is_some)
    }
}

/// 启动时构建、之后只读的字体集合。
///
/// 不变式：每个已加载字号都有主字体句柄。
#[derive(Debug, Clone)]
pub struct FontSet {
    primary: BTreeMap<u32, FontHandle>,
    fallbacks: Vec<FallbackFont>,
    missing: FontHandle,
}

impl FontSet {
    /// 按配置加载字体
    pub fn load(cfg: &FontsConfig) -> Self {
        Self::load_from(&cfg.dir_path(), &cfg.primary, &cfg.fallbacks, &cfg.sizes)
    }

    /// 从指定目录加载主字体与后备字体。
    ///
    /// 尽力而为：任何字体文件缺失或损坏都只记录日志，不会中断启动。
    pub fn load_from(dir: &Path, primary: &str, fallbacks: &[String], sizes: &[u32]) -> Self {
        let sizes = normalize_sizes(sizes);

        let (primary_label, primary_font) = match read_font(dir, primary) {
            Some(font) => (primary.to_string(), Some(font)),
            None => match system_default_font() {
                Some((label, font)) => {
                    tracing::warn!("主字体 {} 不可用，改用系统默认字体 {}", primary, label);
                    (label, Some(font))
                }
                None => {
                    tracing::warn!("主字体 {} 与系统字体均不可用，改用内置缺字框字体", primary);
                    (String::new(), None)
                }
            },
        };

        let primary_faces = sizes
            .iter()
            .map(|&size| {
                let face: FontHandle = match &primary_font {
                    Some(font) => {
                        Arc::new(OutlineFace::new(&primary_label, font.clone(), size)) as FontHandle
                    }
                    None => Arc::new(MissingGlyphFace::new(size)) as FontHandle,
                };
                (size, face)
            })
            .collect();

        let fallbacks = fallbacks
            .iter()
            .map(|name| {
                let font = read_font(dir, name);
                let faces = sizes
                    .iter()
                    .map(|&size| {
                        let face = font.as_ref().map(|f| {
                            Arc::new(OutlineFace::new(name, f.clone(), size)) as FontHandle
                        });
                        (size, face)
                    })
                    .collect();
                FallbackFont::new(name, faces)
            })
            .collect::<Vec<_>>();

        let available = fallbacks.iter().filter(|f| f.is_available()).count();
        tracing::info!(
            "字体加载完成：主字体 {}，后备字体 {}/{} 可用，字号 {:?}",
            if primary_font.is_some() {
                primary_label.as_str()
            } else {
                "builtin"
            },
            available,
            fallbacks.len(),
            sizes
        );

        Self::from_parts(primary_faces, fallbacks)
    }

    /// 由现成的句柄组装字体集合
    pub fn from_parts(primary: BTreeMap<u32, FontHandle>, fallbacks: Vec<FallbackFont>) -> Self {
        let mut primary = primary;
        if primary.is_empty() {
            for size in DEFAULT_SIZES {
                primary.insert(size, Arc::new(MissingGlyphFace::new(size)) as FontHandle);
            }
        }
        let missing_size = primary.keys().next().copied().unwrap_or(DEFAULT_SIZES[0]);
        Self {
            primary,
            fallbacks,
            missing: Arc::new(MissingGlyphFace::new(missing_size)),
        }
    }

    /// 只含内置缺字框字体的集合（无任何字体文件时的形态）
    pub fn builtin(sizes: &[u32]) -> Self {
        let primary = normalize_sizes(sizes)
            .into_iter()
            .map(|size| (size, Arc::new(MissingGlyphFace::new(size)) as FontHandle))
            .collect();
        Self::from_parts(primary, Vec::new())
    }

    /// 已加载的字号
    pub fn sizes(&self) -> impl Iterator<Item = u32> + '_ {
        self.primary.keys().copied()
    }

    /// 离 `size` 最近的已加载字号（距离相同时取较小者）
    pub fn nearest_size(&self, size: u32) -> u32 {
        if self.primary.contains_key(&size) {
            return size;
        }
        let below = self.primary.range(..size).next_back().map(|(s, _)| *s);
        let above = self.primary.range(size..).next().map(|(s, _)| *s);
        match (below, above) {
            (Some(b), Some(a)) if size - b <= a - size => b,
            (_, Some(a)) => a,
            (Some(b), None) => b,
            (None, None) => size,
        }
    }

    /// 主字体句柄（字号未加载时取最近字号）
    pub fn primary(&self, size: u32) -> &FontHandle {
        self.primary
            .get(&self.nearest_size(size))
            .unwrap_or(&self.missing)
    }

    /// 后备字体（按查询顺序）
    pub fn fallbacks(&self) -> &[FallbackFont] {
        &self.fallbacks
    }
}

fn normalize_sizes(sizes: &[u32]) -> Vec<u32> {
    let mut out: Vec<u32> = sizes.iter().copied().filter(|s| *s > 0).collect();
    if out.is_empty() {
        out = DEFAULT_SIZES.to_vec();
    }
    out.sort_unstable();
    out.dedup();
    out
}

fn read_font(dir: &Path, name: &str) -> Option<Arc<FontVec>> {
    let path = dir.join(name);
    let data = match std::fs::read(&path) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!("字体文件不可读 '{}': {}", path.display(), e);
            return None;
        }
    };
    match FontVec::try_from_vec(data) {
        Ok(font) => {
            tracing::info!("字体已加载: {}", path.display());
            Some(Arc::new(font))
        }
        Err(e) => {
            tracing::warn!("字体文件解析失败 '{}': {}", path.display(), e);
            None
        }
    }
}

/// 通过 fontdb 查找系统无衬线字体（默认 sans-serif 族，其次常见发行版字体，最后任意一个）
fn system_default_font() -> Option<(String, Arc<FontVec>)> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    let query = fontdb::Query {
        families: &[
            fontdb::Family::SansSerif,
            fontdb::Family::Name("DejaVu Sans"),
            fontdb::Family::Name("Noto Sans"),
            fontdb::Family::Name("Liberation Sans"),
        ],
        ..fontdb::Query::default()
    };
    let id = db
        .query(&query)
        .or_else(|| db.faces().next().map(|face| face.id))?;
    let label = db
        .face(id)
        .map(|face| face.post_script_name.clone())
        .unwrap_or_else(|| "system".to_string());

    db.with_face_data(id, |data, index| {
        FontVec::try_from_vec_and_index(data.to_vec(), index).ok()
    })
    .flatten()
    .map(|font| (label, Arc::new(font)))
}
