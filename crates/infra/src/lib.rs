//! # Todo インフラ層
//!
//! 永続化（SQLite）を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **データベース接続**: SQLite への接続プール管理とスキーマ適用
//! - **トランザクション**: 書き込みを「ステージ → コミット」の単位で扱う [`db::TxContext`]
//! - **リポジトリ実装**: [`repository::TodoRepository`] の SQLite 実装
//!
//! ## 依存関係
//!
//! ```text
//! todo-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - 接続プール・マイグレーション・トランザクション
//! - [`error`] - インフラ層エラー定義
//! - [`repository`] - リポジトリ実装
//! - `mock` - インメモリ実装（`test-utils` feature）
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use todo_infra::{db, repository::SqliteTodoRepository};
//!
//! async fn setup() -> Result<(), todo_infra::InfraError> {
//!     let pool = db::create_pool("sqlite://todo.db").await?;
//!     db::run_migrations(&pool).await?;
//!     let repo = SqliteTodoRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod repository;

pub use error::{InfraError, InfraErrorKind};
