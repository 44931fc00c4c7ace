//! # ドメイン層エラー定義
//!
//! ビジネスルール違反を表現するエラー型。
//! API 層でこのエラーを受け取り、HTTP 400 に変換する。

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// メッセージはクライアントへそのまま返される。
    ///
    /// # 例
    ///
    /// - 空のタイトル
    /// - ISO-8601 として解釈できない期限
    /// - 整数として解釈できない期間指定
    #[error("{0}")]
    Validation(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
