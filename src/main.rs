use std::future::IntoFuture;
use std::sync::Arc;

use bnr_backend::startup::{load_font_set, run_startup_checks};
use bnr_backend::{AppConfig, AppState, ShutdownManager, build_router};

#[tokio::main]
async fn main() {
    // 先加载配置，日志级别来自配置（RUST_LOG 优先）
    let config_result = AppConfig::init_global();
    let default_level = config_result
        .as_ref()
        .map(|_| AppConfig::global().logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("bnr_backend={default_level},tower_http=info").into()),
        )
        .init();

    if let Err(e) = config_result {
        tracing::error!("Config init failed: {}", e);
        std::process::exit(1);
    }
    let config = AppConfig::global();

    // 创建优雅退出管理器并启动信号处理器
    let shutdown_manager = ShutdownManager::new();
    if let Err(e) = shutdown_manager.start_signal_handler().await {
        tracing::error!("信号处理器启动失败: {}", e);
        std::process::exit(1);
    }

    // Run startup checks
    if let Err(e) = run_startup_checks(config).await {
        tracing::error!("Startup checks failed: {}", e);
        std::process::exit(1);
    }

    // 字体只在启动时加载一次，之后只读共享
    let fonts = match load_font_set(&config.fonts).await {
        Ok(f) => Arc::new(f),
        Err(e) => {
            tracing::error!("字体加载失败: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = match AppState::new(config, fonts) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("应用状态初始化失败: {}", e);
            std::process::exit(1);
        }
    };
    let app = build_router(app_state, &config.api.prefix);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("Card API: http://{}{}/bnr", addr, config.api.prefix);

    let shutdown_timeout = config.shutdown.timeout_duration();
    let drain_watch = shutdown_manager.clone();
    let shutdown_signal = async move {
        let reason = shutdown_manager.wait_for_shutdown().await;
        tracing::info!("接收到退出信号: {:?}，开始优雅关闭HTTP服务器...", reason);
    };

    // 收到退出信号后，最多等待 shutdown_timeout 让在途请求完成
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .into_future();
    let deadline = async move {
        drain_watch.wait_for_shutdown().await;
        tokio::time::sleep(shutdown_timeout).await;
    };

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("服务器运行错误: {}", e);
                std::process::exit(1);
            }
            tracing::info!("服务器已优雅关闭");
        }
        _ = deadline => {
            tracing::warn!(
                "优雅退出超时（{}秒），强制退出",
                config.shutdown.timeout_secs
            );
        }
    }
}
