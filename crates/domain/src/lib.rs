//! # Todo ドメイン層
//!
//! Todo API の中核となるドメインモデルを定義する。
//!
//! ## 依存関係の方向
//!
//! ```text
//! todo-service → infra → domain
//!        ↘                 ↑
//!          ────────────────
//! ```
//!
//! ドメイン層はインフラ層（DB、HTTP）には一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`clock`] - 現在時刻の抽象化
//! - [`error`] - ドメイン層で発生するエラーの定義
//! - [`todo`] - Todo エンティティと値オブジェクト
//!
//! ## 使用例
//!
//! ```rust
//! use todo_domain::{DomainError, todo::{Deadline, TodoTitle}};
//!
//! let title = TodoTitle::new("Buy milk").unwrap();
//! assert_eq!(title.as_str(), "Buy milk");
//!
//! let err = Deadline::parse("not-a-date").unwrap_err();
//! assert!(matches!(err, DomainError::Validation(_)));
//! ```

pub mod clock;
pub mod error;
pub mod todo;

pub use error::DomainError;
