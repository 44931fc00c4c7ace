//! # Todo ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/v1/todos` - Todo 一覧（`completed` / `window` で絞り込み）
//! - `GET /api/v1/todos/{id}` - Todo 取得
//! - `POST /api/v1/todos` - Todo 作成
//! - `PUT /api/v1/todos/{id}` - Todo 更新
//! - `DELETE /api/v1/todos/{id}` - Todo 削除
//!
//! パスの `id` が非負の整数でない場合、ルートが存在しないものとして 404 を返す。

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path,
        Query,
        State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use todo_domain::todo::{Todo, TodoId};

use crate::{
    error::TodoError,
    usecase::{
        ListTodosFilter,
        TodoPayload,
        TodoUseCaseImpl,
        todo::payload::invalid_json_payload,
    },
};

/// Todo API の共有状態
pub struct TodoState {
    pub usecase: TodoUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// 一覧取得のクエリパラメータ
///
/// 値の解釈は [`ListTodosFilter::parse`] に任せるため、文字列のまま受け取る。
/// 同じキーが複数回現れた場合は先頭の値を使う。
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ListTodosQuery {
    pub completed: Option<String>,
    pub window:    Option<String>,
}

impl ListTodosQuery {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "completed" => &mut query.completed,
                "window" => &mut query.window,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}

/// Todo DTO
#[derive(Debug, Serialize)]
pub struct TodoDto {
    pub id:          i64,
    pub title:       String,
    pub description: Option<String>,
    pub completed:   bool,
    pub deadline_at: Option<String>,
    pub created_at:  String,
    pub updated_at:  String,
}

impl From<&Todo> for TodoDto {
    fn from(todo: &Todo) -> Self {
        Self {
            id:          todo.id().as_i64(),
            title:       todo.title().to_string(),
            description: todo.description().map(|s| s.to_string()),
            completed:   todo.completed(),
            deadline_at: todo.deadline_at().map(|d| d.to_iso8601()),
            created_at:  todo.created_at().to_rfc3339(),
            updated_at:  todo.updated_at().to_rfc3339(),
        }
    }
}

// --- 抽出ヘルパー ---

/// 負の数や `i64` に収まらない値は、存在しない ID として扱う
fn todo_id(path: Result<Path<u64>, PathRejection>) -> Result<TodoId, TodoError> {
    let Path(id) = path.map_err(|_| TodoError::NotFound)?;
    let id = i64::try_from(id).map_err(|_| TodoError::NotFound)?;
    Ok(TodoId::new(id))
}

fn todo_payload(body: Result<Json<Value>, JsonRejection>) -> Result<TodoPayload, TodoError> {
    let Json(value) = body.map_err(|e| {
        tracing::debug!(error = %e, "JSON ペイロードの解析に失敗");
        invalid_json_payload()
    })?;
    TodoPayload::from_value(value)
}

// --- ハンドラ ---

/// GET /api/v1/todos
#[tracing::instrument(skip_all)]
pub async fn list_todos(
    State(state): State<Arc<TodoState>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<impl IntoResponse, TodoError> {
    let Query(pairs) =
        query.map_err(|_| TodoError::InvalidInput("Invalid query parameters".to_string()))?;
    let query = ListTodosQuery::from_pairs(pairs);
    let filter = ListTodosFilter::parse(query.completed.as_deref(), query.window.as_deref())?;

    let todos = state.usecase.list_todos(filter).await?;

    let items: Vec<TodoDto> = todos.iter().map(TodoDto::from).collect();
    Ok((StatusCode::OK, Json(items)))
}

/// GET /api/v1/todos/{id}
#[tracing::instrument(skip_all)]
pub async fn get_todo(
    State(state): State<Arc<TodoState>>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<impl IntoResponse, TodoError> {
    let id = todo_id(path)?;

    let todo = state.usecase.get_todo(id).await?;

    Ok((StatusCode::OK, Json(TodoDto::from(&todo))))
}

/// POST /api/v1/todos
#[tracing::instrument(skip_all)]
pub async fn create_todo(
    State(state): State<Arc<TodoState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, TodoError> {
    let input = todo_payload(body)?.into_create_input()?;

    let todo = state.usecase.create_todo(input).await?;

    Ok((StatusCode::CREATED, Json(TodoDto::from(&todo))))
}

/// PUT /api/v1/todos/{id}
#[tracing::instrument(skip_all)]
pub async fn update_todo(
    State(state): State<Arc<TodoState>>,
    path: Result<Path<u64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, TodoError> {
    let id = todo_id(path)?;
    let payload = todo_payload(body)?;

    let todo = state.usecase.update_todo(id, payload).await?;

    Ok((StatusCode::OK, Json(TodoDto::from(&todo))))
}

/// DELETE /api/v1/todos/{id}
///
/// 存在しない ID でも 200 で `{}` を返す。
#[tracing::instrument(skip_all)]
pub async fn delete_todo(
    State(state): State<Arc<TodoState>>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Response, TodoError> {
    let id = todo_id(path)?;

    let response = match state.usecase.delete_todo(id).await? {
        Some(todo) => (StatusCode::OK, Json(TodoDto::from(&todo))).into_response(),
        None => (StatusCode::OK, Json(serde_json::json!({}))).into_response(),
    };
    Ok(response)
}
