use once_cell::sync::OnceCell;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// 按 timeout 维度复用的 HTTP Client（统一连接池/Keep-Alive），避免每次请求重复创建。
///
/// `Client` 内部是 `Arc`，clone 成本很低。
static CLIENTS: OnceCell<Mutex<HashMap<Duration, Client>>> = OnceCell::new();

/// 获取指定超时的共享 HTTP Client
pub fn client_with_timeout(timeout: Duration) -> Result<Client, reqwest::Error> {
    let clients = CLIENTS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = clients.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(client) = guard.get(&timeout) {
        return Ok(client.clone());
    }
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("bnr-backend/", env!("CARGO_PKG_VERSION")))
        .build()?;
    guard.insert(timeout, client.clone());
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::client_with_timeout;
    use std::time::Duration;

    #[test]
    fn same_timeout_reuses_client_slot() {
        let _a = client_with_timeout(Duration::from_secs(7)).expect("client");
        let _b = client_with_timeout(Duration::from_secs(7)).expect("client");
        let clients = super::CLIENTS.get().expect("initialized");
        let guard = clients.lock().expect("lock");
        assert!(guard.contains_key(&Duration::from_secs(7)));
    }
}
