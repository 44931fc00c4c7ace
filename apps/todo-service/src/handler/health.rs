//! # ヘルスチェックハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/v1/health` - Liveness（プロセスが応答できるか）
//! - `GET /api/v1/health/ready` - Readiness（DB に到達できるか）
//!
//! ## レスポンス例
//!
//! ```json
//! { "status": "ready", "checks": { "database": "ok" } }
//! ```

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;
use todo_infra::db;
use todo_shared::{CheckStatus, HealthResponse, ReadinessResponse};

/// DB 疎通確認のタイムアウト
const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// ヘルスチェックエンドポイント
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Readiness Check 用の共有状態
pub struct ReadinessState {
    pub pool: SqlitePool,
}

/// Readiness Check エンドポイント
///
/// 全チェックが `ok` なら 200、1 つでも `error` なら 503。
#[tracing::instrument(skip_all)]
pub async fn readiness_check(State(state): State<Arc<ReadinessState>>) -> impl IntoResponse {
    let checks = BTreeMap::from([("database".to_string(), check_database(&state.pool).await)]);
    let response = ReadinessResponse::from_checks(checks);

    let http_status = if response.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (http_status, Json(response))
}

/// DB への接続を `SELECT 1` で確認する（タイムアウト: 5 秒）
async fn check_database(pool: &SqlitePool) -> CheckStatus {
    match tokio::time::timeout(CHECK_TIMEOUT, db::ping(pool)).await {
        Ok(Ok(())) => CheckStatus::Ok,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "readiness check: database ping failed");
            CheckStatus::Error
        }
        Err(_) => {
            tracing::warn!("readiness check: database ping timed out");
            CheckStatus::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    use super::*;

    async fn request_readiness(pool: SqlitePool) -> (StatusCode, serde_json::Value) {
        let app = Router::new()
            .route("/health/ready", get(readiness_check))
            .with_state(Arc::new(ReadinessState { pool }));

        let response = app
            .oneshot(Request::builder().uri("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_checkはokを返す() {
        let Json(response) = health_check().await;

        assert_eq!(serde_json::to_value(response).unwrap(), serde_json::json!({"status": "ok"}));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_readiness_check_dbに到達できれば200(pool: SqlitePool) {
        let (status, body) = request_readiness(pool).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({"status": "ready", "checks": {"database": "ok"}})
        );
    }

    #[tokio::test]
    async fn test_readiness_check_プールが閉じていれば503() {
        let pool = db::create_pool("sqlite::memory:").await.unwrap();
        pool.close().await;

        let (status, body) = request_readiness(pool).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body,
            serde_json::json!({"status": "not_ready", "checks": {"database": "error"}})
        );
    }
}
