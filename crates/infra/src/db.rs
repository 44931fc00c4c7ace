//! # SQLite データベース接続管理
//!
//! 接続プールの作成、スキーマ適用、トランザクション管理を行う。
//!
//! ## 設計方針
//!
//! - **接続プール**: アプリケーション起動時に一度だけ作成し、ハンドラ間で共有
//! - **明示的なハンドル**: プールはグローバルに置かず、状態として注入する。
//!   テストは `#[sqlx::test]` が用意する独立した DB を渡す
//! - **書き込みは必ずトランザクション経由**: リポジトリの書き込みメソッドは
//!   [`TxContext`] を必須引数にとる
//!
//! ## インメモリ DB について
//!
//! `sqlite::memory:` は接続ごとに別の DB になる。そのためインメモリ URL の場合は
//! 接続数を 1 に固定し、アイドル切断もしない。
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use todo_infra::db;
//!
//! let pool = db::create_pool("sqlite://todo.db").await?;
//! db::run_migrations(&pool).await?;
//! ```

use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use sqlx::{
    Sqlite,
    SqliteConnection,
    SqlitePool,
    Transaction,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::error::InfraError;

/// ファイル DB の最大接続数
const MAX_CONNECTIONS: u32 = 5;

/// 接続取得のタイムアウト
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// インメモリ DB の URL かどうか
fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// SQLite 接続プールを作成する
///
/// # 引数
///
/// * `database_url` - SQLite 接続 URL
///   - ファイル: `sqlite://todo.db`（存在しなければ作成する）
///   - インメモリ: `sqlite::memory:`
///
/// # エラー
///
/// URL の形式不正、ファイルの作成失敗、接続失敗。
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, InfraError> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool_options = if is_memory_url(database_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS)
    };

    let pool = pool_options
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// スキーマを適用する
///
/// `sqlx::migrate!()` で埋め込まれた `migrations/` を順番に適用する。
/// 適用済みのものはスキップされる。
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), InfraError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// DB への疎通を確認する（Readiness Check 用）
pub async fn ping(pool: &SqlitePool) -> Result<(), InfraError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

// =============================================================================
// TxContext
// =============================================================================

/// トランザクションコンテキスト
///
/// 書き込みリポジトリメソッドの必須引数。
/// トランザクションなしの書き込みはコンパイルエラーになる。
///
/// # ライフサイクル
///
/// 1. `TransactionManager::begin()` で作成
/// 2. 書き込みメソッドに `&mut TxContext` として渡す（ステージ）
/// 3. `commit()` でコミット、またはドロップでロールバック
pub struct TxContext(TxContextInner);

enum TxContextInner {
    Sqlite(Transaction<'static, Sqlite>),
    #[cfg(any(test, feature = "test-utils"))]
    Mock,
}

impl TxContext {
    pub(crate) async fn begin_sqlite(pool: &SqlitePool) -> Result<Self, InfraError> {
        Ok(Self(TxContextInner::Sqlite(pool.begin().await?)))
    }

    /// テスト用のモック TxContext を作成する
    ///
    /// Mock リポジトリはインメモリ実装のため、実際のトランザクションは不要。
    #[cfg(any(test, feature = "test-utils"))]
    pub fn mock() -> Self {
        Self(TxContextInner::Mock)
    }

    /// トランザクションをコミットする
    ///
    /// 呼ばずにドロップすると、sqlx が自動的にロールバックする。
    pub async fn commit(self) -> Result<(), InfraError> {
        match self.0 {
            TxContextInner::Sqlite(tx) => {
                tx.commit().await?;
                Ok(())
            }
            #[cfg(any(test, feature = "test-utils"))]
            TxContextInner::Mock => Ok(()),
        }
    }

    /// トランザクション内の DB コネクションを取得する
    ///
    /// Mock の場合はエラーを返す（Mock リポジトリは `conn()` を使わない）。
    pub(crate) fn conn(&mut self) -> Result<&mut SqliteConnection, InfraError> {
        match &mut self.0 {
            TxContextInner::Sqlite(tx) => Ok(&mut **tx),
            #[cfg(any(test, feature = "test-utils"))]
            TxContextInner::Mock => Err(InfraError::unexpected(
                "Mock TxContext に対して conn() が呼ばれた",
            )),
        }
    }
}

// =============================================================================
// TransactionManager
// =============================================================================

/// トランザクション管理 trait
///
/// ユースケース層は `SqlitePool` に直接依存せず、この trait 経由で
/// トランザクションを開始する。
#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn begin(&self) -> Result<TxContext, InfraError>;
}

/// SQLite 用 TransactionManager 実装
#[derive(Debug, Clone)]
pub struct SqliteTransactionManager {
    pool: SqlitePool,
}

impl SqliteTransactionManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionManager for SqliteTransactionManager {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        TxContext::begin_sqlite(&self.pool).await
    }
}
