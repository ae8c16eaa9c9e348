use serde::Deserialize;

/// 名片请求参数
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CardQuery {
    /// 玩家 UID
    #[param(example = "100200300")]
    pub uid: Option<String>,
    /// 访问口令
    pub key: Option<String>,
}
