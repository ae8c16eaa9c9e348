use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 全局配置单例
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 未设置 RUST_LOG 时使用的日志级别
    pub level: String,
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API 路由前缀（默认为空，即 `/bnr`）
    #[serde(default)]
    pub prefix: String,
}

/// 访问口令配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// 共享口令（query 参数 `key` 必须与之完全相等）
    #[serde(default = "AuthConfig::default_secret_key")]
    pub secret_key: String,
}

impl AuthConfig {
    fn default_secret_key() -> String {
        "BNGX".to_string()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: Self::default_secret_key(),
        }
    }
}

/// 字体配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontsConfig {
    /// 字体文件目录
    #[serde(default = "FontsConfig::default_dir")]
    pub dir: String,
    /// 主字体文件名
    #[serde(default = "FontsConfig::default_primary")]
    pub primary: String,
    /// 后备字体文件名（按顺序查询）
    #[serde(default = "FontsConfig::default_fallbacks")]
    pub fallbacks: Vec<String>,
    /// 需要预加载的字号
    #[serde(default = "FontsConfig::default_sizes")]
    pub sizes: Vec<u32>,
}

impl FontsConfig {
    fn default_dir() -> String {
        "resources/fonts".to_string()
    }
    fn default_primary() -> String {
        "Tajawal-Bold.ttf".to_string()
    }
    fn default_fallbacks() -> Vec<String> {
        [
            "DejaVuSans.ttf",
            "NotoSans-Regular.ttf",
            "ARIAL.TTF",
            "NotoSansArabic-Regular.ttf",
            "NotoSansSymbols2-Regular.ttf",
            "NotoSansCJKjp-Regular.otf",
            "unifont-15.0.01.ttf",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
    fn default_sizes() -> Vec<u32> {
        vec![30, 35, 40, 50]
    }

    /// 字体目录完整路径
    pub fn dir_path(&self) -> PathBuf {
        PathBuf::from(&self.dir)
    }
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
            primary: Self::default_primary(),
            fallbacks: Self::default_fallbacks(),
            sizes: Self::default_sizes(),
        }
    }
}

/// 背景图来源
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackgroundSource {
    /// 固定 URL
    Fixed { url: String },
    /// 由玩家 bannerId 经图片服务获取
    Banner,
}

/// 头像候选 ID 的来源字段
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AvatarCandidate {
    /// profileInfo.avatarId
    Avatar,
    /// basicInfo.headPic
    HeadPic,
    /// basicInfo.bannerId
    Banner,
}

/// 上游服务配置
///
/// 原先几个部署版本只在这些字段上有差异，统一收敛为数据。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// 玩家资料接口
    #[serde(default = "UpstreamConfig::default_profile_url")]
    pub profile_url: String,
    /// 玩家所在区服
    #[serde(default = "UpstreamConfig::default_region")]
    pub region: String,
    /// 物品图片接口
    #[serde(default = "UpstreamConfig::default_image_url")]
    pub image_url: String,
    /// 物品图片接口访问 key
    #[serde(default = "UpstreamConfig::default_image_key")]
    pub image_key: String,
    /// 物品图片接口的附加 query 参数（如 watermark）
    #[serde(default)]
    pub image_extra_params: Vec<(String, String)>,
    /// 单次上游请求超时（秒）
    #[serde(default = "UpstreamConfig::default_timeout")]
    pub timeout_secs: u64,
    /// 背景图来源
    #[serde(default = "UpstreamConfig::default_background")]
    pub background: BackgroundSource,
    /// 头像候选字段（按优先级）
    #[serde(default = "UpstreamConfig::default_avatar_candidates")]
    pub avatar_candidates: Vec<AvatarCandidate>,
    /// 候选图片的最小字节数，低于该值视为无效图片
    #[serde(default = "UpstreamConfig::default_min_image_bytes")]
    pub min_image_bytes: usize,
}

impl UpstreamConfig {
    fn default_profile_url() -> String {
        "https://info-five-mauve.vercel.app/accinfo".to_string()
    }
    fn default_region() -> String {
        "IND".to_string()
    }
    fn default_image_url() -> String {
        "https://pika-ffitmes-api.vercel.app/".to_string()
    }
    fn default_image_key() -> String {
        "PikaApis".to_string()
    }
    fn default_timeout() -> u64 {
        10
    }
    fn default_background() -> BackgroundSource {
        BackgroundSource::Fixed {
            url: "https://i.postimg.cc/L4PQBgmx/IMG-20250807-042134-670.jpg".to_string(),
        }
    }
    fn default_avatar_candidates() -> Vec<AvatarCandidate> {
        vec![AvatarCandidate::Avatar]
    }
    fn default_min_image_bytes() -> usize {
        100
    }

    /// 获取上游请求超时
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            profile_url: Self::default_profile_url(),
            region: Self::default_region(),
            image_url: Self::default_image_url(),
            image_key: Self::default_image_key(),
            image_extra_params: Vec::new(),
            timeout_secs: Self::default_timeout(),
            background: Self::default_background(),
            avatar_candidates: Self::default_avatar_candidates(),
            min_image_bytes: Self::default_min_image_bytes(),
        }
    }
}

/// 卡片展示配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardConfig {
    /// 右上角开发者签名
    #[serde(default = "CardConfig::default_signature")]
    pub signature: String,
}

impl CardConfig {
    fn default_signature() -> String {
        "DEV BY : BNGX".to_string()
    }
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            signature: Self::default_signature(),
        }
    }
}

/// 图片渲染配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ImageRenderConfig {
    /// 并发渲染许可数（0=自动，取 CPU 核心数）
    #[serde(default)]
    pub max_parallel: u32,
}

impl ImageRenderConfig {
    /// 实际生效的并发许可数
    pub fn effective_parallel(&self) -> usize {
        if self.max_parallel == 0 {
            num_cpus::get()
        } else {
            self.max_parallel as usize
        }
    }
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 优雅退出超时时间（秒）
    #[serde(default = "ShutdownConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl ShutdownConfig {
    fn default_timeout() -> u64 {
        30
    }

    /// 获取优雅退出超时时间
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub fonts: FontsConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub card: CardConfig,
    #[serde(default)]
    pub image: ImageRenderConfig,
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// 从配置文件加载配置，支持环境变量覆盖
    ///
    /// 配置文件缺失时使用内置默认值。
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path();

        tracing::info!("正在从 {:?} 加载配置文件", config_path);

        Self::load_with(config_path, Self::environment())
    }

    /// 环境变量覆盖：前缀后接单下划线，层级之间用双下划线，
    /// 例如 APP_SERVER__PORT、APP_AUTH__SECRET_KEY
    fn environment() -> Environment {
        Environment::with_prefix("APP")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load_with(config_path: PathBuf, env: Environment) -> Result<Self, ConfigError> {
        let defaults = ConfigBuilder::try_from(&AppConfig::default())?;
        let builder = ConfigBuilder::builder()
            .add_source(defaults)
            .add_source(File::from(config_path).required(false))
            .add_source(env)
            .build()?;

        builder.try_deserialize()
    }

    /// 获取全局配置单例
    pub fn global() -> &'static AppConfig {
        CONFIG.get().expect("配置未初始化，请先调用 init_global()")
    }

    /// 初始化全局配置
    pub fn init_global() -> Result<(), ConfigError> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))?;
        Ok(())
    }

    /// 获取配置文件路径（可通过 APP_CONFIG 指定）
    fn get_config_path() -> PathBuf {
        std::env::var("APP_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"))
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            api: ApiConfig {
                prefix: String::new(),
            },
            auth: AuthConfig::default(),
            fonts: FontsConfig::default(),
            upstream: UpstreamConfig::default(),
            card: CardConfig::default(),
            image: ImageRenderConfig::default(),
            shutdown: ShutdownConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Map;

    #[test]
    fn defaults_match_original_deployment() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server_addr(), "0.0.0.0:5000");
        assert_eq!(cfg.fonts.sizes, vec![30, 35, 40, 50]);
        assert_eq!(cfg.fonts.fallbacks.len(), 7);
        assert_eq!(cfg.fonts.fallbacks[0], "DejaVuSans.ttf");
        assert_eq!(cfg.upstream.timeout_duration(), Duration::from_secs(10));
        assert_eq!(cfg.card.signature, "DEV BY : BNGX");
    }

    #[test]
    fn background_source_is_tagged_by_kind() {
        let fixed: BackgroundSource =
            serde_json::from_str(r#"{"kind":"fixed","url":"http://x/bg.jpg"}"#).unwrap();
        assert_eq!(
            fixed,
            BackgroundSource::Fixed {
                url: "http://x/bg.jpg".to_string()
            }
        );
        let banner: BackgroundSource = serde_json::from_str(r#"{"kind":"banner"}"#).unwrap();
        assert_eq!(banner, BackgroundSource::Banner);
    }

    #[test]
    fn avatar_candidates_parse_snake_case() {
        let v: Vec<AvatarCandidate> =
            serde_json::from_str(r#"["head_pic","avatar","banner"]"#).unwrap();
        assert_eq!(
            v,
            vec![
                AvatarCandidate::HeadPic,
                AvatarCandidate::Avatar,
                AvatarCandidate::Banner
            ]
        );
    }

    #[test]
    fn env_overrides_multi_word_keys() {
        let vars: Map<String, String> = [
            ("APP_AUTH__SECRET_KEY", "rotated"),
            ("APP_SERVER__PORT", "8081"),
            ("APP_UPSTREAM__TIMEOUT_SECS", "3"),
            ("APP_UPSTREAM__PROFILE_URL", "http://127.0.0.1:9/accinfo"),
            ("APP_IMAGE__MAX_PARALLEL", "2"),
            ("APP_CONFIG", "ignored.toml"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let env = AppConfig::environment().source(Some(vars));
        let cfg = AppConfig::load_with(PathBuf::from("does-not-exist.toml"), env)
            .expect("load with env overrides");
        assert_eq!(cfg.auth.secret_key, "rotated");
        assert_eq!(cfg.server.port, 8081);
        assert_eq!(cfg.upstream.timeout_secs, 3);
        assert_eq!(cfg.upstream.profile_url, "http://127.0.0.1:9/accinfo");
        assert_eq!(cfg.image.max_parallel, 2);
        // 未覆盖的字段保持默认值
        assert_eq!(cfg.upstream.region, "IND");
    }

    #[test]
    fn zero_parallel_means_cpu_count() {
        let img = ImageRenderConfig { max_parallel: 0 };
        assert!(img.effective_parallel() >= 1);
        let img = ImageRenderConfig { max_parallel: 3 };
        assert_eq!(img.effective_parallel(), 3);
    }
}
