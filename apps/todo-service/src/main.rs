//! # Todo Service サーバー
//!
//! Todo の CRUD を提供する REST API サーバー。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `TODO_HOST` | No | バインドアドレス（既定: `0.0.0.0`） |
//! | `TODO_PORT` | No | ポート番号（既定: `8080`） |
//! | `DATABASE_URL` | No | SQLite 接続 URL（既定: `sqlite://todo.db`） |
//! | `LOG_FORMAT` | No | `json` または `pretty`（既定） |
//! | `RUST_LOG` | No | ログレベル |
//!
//! ## 起動方法
//!
//! ```bash
//! cargo run -p todo-service
//! ```

use std::net::SocketAddr;

use anyhow::Context;
use todo_infra::db;
use todo_service::{app, config::TodoConfig};
use todo_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    let tracing_config = TracingConfig::from_env("todo-service");
    init_tracing(&tracing_config);

    let config = TodoConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "Todo Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    let pool = db::create_pool(&config.database_url)
        .await
        .context("データベース接続に失敗しました")?;
    db::run_migrations(&pool)
        .await
        .context("スキーマの適用に失敗しました")?;
    tracing::info!("データベースに接続しました");

    let app = app::create_app(pool);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Todo Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("シグナルハンドラの登録に失敗しました: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("シャットダウンします");
}
