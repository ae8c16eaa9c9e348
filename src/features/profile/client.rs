use reqwest::Client;

use super::models::{PlayerProfile, ProfileResponse};
use crate::config::UpstreamConfig;
use crate::error::FetchError;

/// 玩家资料接口客户端
#[derive(Debug, Clone)]
pub struct ProfileClient {
    client: Client,
    profile_url: String,
    region: String,
}

impl ProfileClient {
    pub fn new(cfg: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: crate::http::client_with_timeout(cfg.timeout_duration())?,
            profile_url: cfg.profile_url.clone(),
            region: cfg.region.clone(),
        })
    }

    /// 获取玩家资料（单次请求，不重试）
    pub async fn fetch(&self, uid: &str) -> Result<PlayerProfile, FetchError> {
        let resp = self
            .client
            .get(&self.profile_url)
            .query(&[("uid", uid), ("region", self.region.as_str())])
            .send()
            .await?
            .error_for_status()?;
        let raw: ProfileResponse = resp.json().await?;
        let profile = PlayerProfile::from_response(uid, raw);
        tracing::debug!(
            target: "bnr_backend::card",
            uid = %profile.uid,
            level = profile.level,
            "玩家资料获取成功"
        );
        Ok(profile)
    }
}
