//! # リポジトリ実装
//!
//! 永続化操作のトレイトと SQLite 実装を提供する。
//!
//! ## 設計方針
//!
//! - **読み取りはプール、書き込みは [`TxContext`](crate::db::TxContext)**:
//!   書き込みメソッドはトランザクション外では呼べない
//! - **テスタビリティ**: トレイト経由でモック可能な設計

pub mod todo_repository;

pub use todo_repository::{SqliteTodoRepository, TodoRepository};
