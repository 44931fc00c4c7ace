//! # ルーター構築
//!
//! 状態の組み立てとルーティングを行う。`main` と結合テストの両方から使う。

use std::sync::Arc;

use axum::{Router, routing::get};
use sqlx::SqlitePool;
use todo_domain::clock::{Clock, SystemClock};
use todo_infra::{db::SqliteTransactionManager, repository::SqliteTodoRepository};
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        ReadinessState,
        TodoState,
        create_todo,
        delete_todo,
        get_todo,
        health_check,
        list_todos,
        readiness_check,
        update_todo,
    },
    usecase::TodoUseCaseImpl,
};

/// API のベースパス
pub const API_BASE_PATH: &str = "/api/v1";

/// SQLite プールからアプリケーションを組み立てる
pub fn create_app(pool: SqlitePool) -> Router {
    create_app_with_clock(pool, Arc::new(SystemClock))
}

/// 時計を差し替えてアプリケーションを組み立てる
pub fn create_app_with_clock(pool: SqlitePool, clock: Arc<dyn Clock>) -> Router {
    let usecase = TodoUseCaseImpl::new(
        Arc::new(SqliteTodoRepository::new(pool.clone())),
        Arc::new(SqliteTransactionManager::new(pool.clone())),
        clock,
    );

    build_router(
        Arc::new(TodoState { usecase }),
        Arc::new(ReadinessState { pool }),
    )
}

/// 状態を受け取ってルーターを構築する
pub fn build_router(todo_state: Arc<TodoState>, readiness_state: Arc<ReadinessState>) -> Router {
    let api = Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        .with_state(readiness_state)
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .with_state(todo_state);

    Router::new()
        .nest(API_BASE_PATH, api)
        .layer(TraceLayer::new_for_http())
}
