//! # エラーレスポンス
//!
//! 全エンドポイントで共通のエラーレスポンス構造体を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換は todo-service の責務（shared に axum 依存を入れない）
//! - ボディ形状は `{"error": "<message>"}` 固定

use serde::{Deserialize, Serialize};

/// 内部エラー時にクライアントへ返す固定メッセージ
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// エラーレスポンス
///
/// メッセージはクライアントにそのまま表示される前提の英文。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// 500 Internal Server Error
    ///
    /// メッセージは固定値（内部情報を漏らさないため）。
    pub fn internal_error() -> Self {
        Self::new(INTERNAL_ERROR_MESSAGE)
    }
}
