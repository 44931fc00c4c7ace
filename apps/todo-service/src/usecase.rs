//! # ユースケース層
//!
//! Todo Service のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリ、トランザクション管理、時計を `Arc<dyn Trait>` で注入
//! - **薄いハンドラ**: ハンドラは HTTP の入出力変換だけを行い、検証と永続化はここに集約

pub(crate) mod helpers;

pub mod todo;

pub use todo::{
    ListTodosFilter,
    TodoUseCaseImpl,
    payload::{CreateTodoInput, TodoPayload, UpdateTodoInput},
};
