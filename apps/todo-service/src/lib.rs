//! # Todo Service ライブラリ
//!
//! Todo Service のユースケースとハンドラを公開する。
//! 結合テスト用に内部モジュールへのアクセスを提供する。

pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;
