//! # Todo Service エラー定義
//!
//! Todo Service 固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! レスポンスボディは常に `{"error": "<message>"}`。
//! 内部エラーの詳細はログにだけ出力し、クライアントには固定文言を返す。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use itertools::Itertools;
use thiserror::Error;
use todo_domain::DomainError;
use todo_infra::InfraError;
use todo_shared::{ErrorResponse, event_log::error as log_error};

/// Todo Service で発生するエラー
#[derive(Debug, Error)]
pub enum TodoError {
    /// 不正な入力（型違い、書式不正、不正なクエリパラメータ）
    #[error("{0}")]
    InvalidInput(String),

    /// Todo が存在しない
    #[error("Todo not found")]
    NotFound,

    /// 必須フィールドの欠落
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// ホワイトリスト外のフィールド（ソート済み）
    #[error("Unexpected field(s): {}", .0.iter().join(", "))]
    UnexpectedFields(Vec<String>),

    /// 既存 Todo の ID を変更しようとした
    #[error("Cannot change the ID of an existing todo")]
    ImmutableField,

    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(#[from] InfraError),

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl From<DomainError> for TodoError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => TodoError::InvalidInput(msg),
        }
    }
}

impl TodoError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TodoError::NotFound => StatusCode::NOT_FOUND,
            TodoError::InvalidInput(_)
            | TodoError::MissingField(_)
            | TodoError::UnexpectedFields(_)
            | TodoError::ImmutableField => StatusCode::BAD_REQUEST,
            TodoError::Database(_) | TodoError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            TodoError::Database(e) => {
                tracing::error!(
                    error.category = log_error::category::INFRASTRUCTURE,
                    error.kind = log_error::kind::DATABASE,
                    "データベースエラー: {}",
                    e
                );
                ErrorResponse::internal_error()
            }
            TodoError::Internal(msg) => {
                tracing::error!(
                    error.category = log_error::category::INFRASTRUCTURE,
                    error.kind = log_error::kind::INTERNAL,
                    "内部エラー: {}",
                    msg
                );
                ErrorResponse::internal_error()
            }
            _ => ErrorResponse::new(self.to_string()),
        };

        (status, Json(body)).into_response()
    }
}
