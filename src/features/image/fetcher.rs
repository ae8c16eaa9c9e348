use axum::body::Bytes;
use image::RgbaImage;
use image::imageops::FilterType;
use reqwest::{Client, RequestBuilder};
use tokio::task::spawn_blocking;

use crate::config::UpstreamConfig;
use crate::error::FetchError;

/// 远程图片获取：下载 → 解码为 RGBA → 可选缩放（Lanczos3）
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: Client,
    image_url: String,
    image_key: String,
    extra_params: Vec<(String, String)>,
    min_bytes: usize,
}

impl ImageFetcher {
    pub fn new(cfg: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: crate::http::client_with_timeout(cfg.timeout_duration())?,
            image_url: cfg.image_url.clone(),
            image_key: cfg.image_key.clone(),
            extra_params: cfg.image_extra_params.clone(),
            min_bytes: cfg.min_image_bytes,
        })
    }

    /// 按完整 URL 获取图片
    pub async fn fetch(
        &self,
        url: &str,
        target: Option<(u32, u32)>,
    ) -> Result<RgbaImage, FetchError> {
        self.fetch_with(self.client.get(url), url, target, 0).await
    }

    /// 按物品 ID 经图片服务获取图片
    pub async fn fetch_item(
        &self,
        item_id: &str,
        target: Option<(u32, u32)>,
    ) -> Result<RgbaImage, FetchError> {
        let label = self.item_label(item_id);
        self.fetch_with(self.item_request(item_id), &label, target, 0)
            .await
    }

    /// 依次尝试候选物品 ID，返回第一张字节数达标且能解码的图片
    pub async fn fetch_first(
        &self,
        item_ids: &[String],
        target: Option<(u32, u32)>,
    ) -> Result<RgbaImage, FetchError> {
        for item_id in item_ids {
            match self
                .fetch_with(
                    self.item_request(item_id),
                    &self.item_label(item_id),
                    target,
                    self.min_bytes,
                )
                .await
            {
                Ok(img) => return Ok(img),
                Err(e) => tracing::debug!("候选图片 {} 不可用: {}", item_id, e),
            }
        }
        tracing::warn!("所有候选图片均不可用: {:?}", item_ids);
        Err(FetchError::NoCandidate)
    }

    /// 日志用的物品 URL（不含 key）
    fn item_label(&self, item_id: &str) -> String {
        format!("{}?item_id={}", self.image_url, item_id)
    }

    fn item_request(&self, item_id: &str) -> RequestBuilder {
        self.client
            .get(&self.image_url)
            .query(&[("item_id", item_id), ("key", self.image_key.as_str())])
            .query(&self.extra_params)
    }

    async fn fetch_with(
        &self,
        req: RequestBuilder,
        label: &str,
        target: Option<(u32, u32)>,
        min_bytes: usize,
    ) -> Result<RgbaImage, FetchError> {
        let result: Result<RgbaImage, FetchError> = async {
            let bytes = download(req).await?;
            if bytes.len() < min_bytes {
                return Err(FetchError::TooSmall(bytes.len()));
            }
            spawn_blocking(move || decode_image(&bytes, target))
                .await
                .map_err(|e| FetchError::Decode(format!("解码任务执行失败: {e}")))?
        }
        .await;

        if let Err(e) = &result {
            tracing::warn!("图片获取失败 {}: {}", label, e);
        }
        result
    }
}

async fn download(req: RequestBuilder) -> Result<Bytes, FetchError> {
    let resp = req.send().await?.error_for_status()?;
    Ok(resp.bytes().await?)
}

/// 解码图片为 RGBA，给定目标尺寸时用 Lanczos3 缩放
pub fn decode_image(bytes: &[u8], target: Option<(u32, u32)>) -> Result<RgbaImage, FetchError> {
    let img = image::load_from_memory(bytes)?.to_rgba8();
    Ok(match target {
        Some((w, h)) if (w, h) != img.dimensions() => {
            image::imageops::resize(&img, w.max(1), h.max(1), FilterType::Lanczos3)
        }
        _ => img,
    })
}
