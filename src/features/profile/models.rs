use serde::Deserialize;

/// 上游既可能返回数字也可能返回字符串的字段
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// 规范化为字符串 ID（空串视为缺失）
    pub fn into_id(self) -> Option<String> {
        let s = match self {
            Scalar::Int(v) => v.to_string(),
            Scalar::Float(v) if v.fract() == 0.0 => format!("{v:.0}"),
            Scalar::Float(v) => v.to_string(),
            Scalar::Text(s) => s.trim().to_string(),
        };
        (!s.is_empty()).then_some(s)
    }

    /// 规范化为整数（无法解析时为 None）
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(v) => Some(*v),
            Scalar::Float(v) => Some(*v as i64),
            Scalar::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// 资料接口原始响应
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(default)]
    pub basic_info: Option<BasicInfo>,
    #[serde(default)]
    pub profile_info: Option<ProfileInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub level: Option<Scalar>,
    #[serde(default)]
    pub liked: Option<Scalar>,
    #[serde(default)]
    pub account_id: Option<Scalar>,
    #[serde(default)]
    pub banner_id: Option<Scalar>,
    #[serde(default)]
    pub head_pic: Option<Scalar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInfo {
    #[serde(default)]
    pub avatar_id: Option<Scalar>,
}

/// 昵称缺失时的占位
pub const UNKNOWN_NICKNAME: &str = "UNKNOWN";

/// 渲染卡片所需的玩家资料（缺失字段已填充占位值）
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProfile {
    pub nickname: String,
    pub level: i64,
    pub liked: i64,
    /// 展示用 UID（上游 accountId 优先，否则为请求的 uid）
    pub uid: String,
    pub avatar_id: Option<String>,
    pub head_pic_id: Option<String>,
    pub banner_id: Option<String>,
}

impl PlayerProfile {
    pub fn from_response(requested_uid: &str, raw: ProfileResponse) -> Self {
        let basic = raw.basic_info.unwrap_or_default();
        let profile = raw.profile_info.unwrap_or_default();

        let nickname = basic
            .nickname
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_NICKNAME.to_string());

        Self {
            nickname,
            level: basic.level.as_ref().and_then(Scalar::as_i64).unwrap_or(0),
            liked: basic.liked.as_ref().and_then(Scalar::as_i64).unwrap_or(0),
            uid: basic
                .account_id
                .and_then(Scalar::into_id)
                .unwrap_or_else(|| requested_uid.to_string()),
            avatar_id: profile.avatar_id.and_then(Scalar::into_id),
            head_pic_id: basic.head_pic.and_then(Scalar::into_id),
            banner_id: basic.banner_id.and_then(Scalar::into_id),
        }
    }
}
