//! # TodoRepository
//!
//! Todo の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **採番はストア**: `insert` は `NewTodo` を受け取り、採番済みの `Todo` を返す
//! - **順序**: 一覧系は `id` 昇順（作成順）
//! - **完了状態の絞り込み**: 等値条件として SQL に押し下げる。期限ウィンドウは
//!   現在時刻に依存するためユースケース層で絞り込む

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::SqlitePool;
use todo_domain::todo::{Deadline, NewTodo, Todo, TodoId, TodoTitle};

use crate::{db::TxContext, error::InfraError};

/// Todo リポジトリトレイト
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// 全件を取得する
    async fn find_all(&self) -> Result<Vec<Todo>, InfraError>;

    /// 完了状態が一致するものを取得する
    async fn find_all_by_completed(&self, completed: bool) -> Result<Vec<Todo>, InfraError>;

    /// ID で検索する
    async fn find_by_id(&self, id: TodoId) -> Result<Option<Todo>, InfraError>;

    /// 新規作成する（ID はストアが採番）
    async fn insert(&self, tx: &mut TxContext, new_todo: &NewTodo) -> Result<Todo, InfraError>;

    /// 既存の Todo を上書き更新する（`id` と `created_at` 以外）
    ///
    /// 対象行が存在しない場合は `InfraErrorKind::Conflict`。
    async fn update(&self, tx: &mut TxContext, todo: &Todo) -> Result<(), InfraError>;

    /// 削除する。行を削除した場合 `true`、存在しなかった場合 `false`
    async fn delete(&self, tx: &mut TxContext, id: TodoId) -> Result<bool, InfraError>;
}

/// SQLite 実装の TodoRepository
#[derive(Debug, Clone)]
pub struct SqliteTodoRepository {
    pool: SqlitePool,
}

impl SqliteTodoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// `todos` テーブルの行
#[derive(Debug, sqlx::FromRow)]
struct TodoRow {
    id:          i64,
    title:       String,
    description: Option<String>,
    completed:   bool,
    deadline_at: Option<NaiveDateTime>,
    created_at:  DateTime<Utc>,
    updated_at:  DateTime<Utc>,
}

impl TryFrom<TodoRow> for Todo {
    type Error = InfraError;

    fn try_from(row: TodoRow) -> Result<Self, Self::Error> {
        let title = TodoTitle::new(row.title)
            .map_err(|e| InfraError::corrupt_data(format!("todos.id={}: {}", row.id, e)))?;

        Ok(Todo::from_db(
            TodoId::new(row.id),
            title,
            row.description,
            row.completed,
            row.deadline_at.map(Deadline::new),
            row.created_at,
            row.updated_at,
        ))
    }
}

fn into_todos(rows: Vec<TodoRow>) -> Result<Vec<Todo>, InfraError> {
    rows.into_iter().map(Todo::try_from).collect()
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_all(&self) -> Result<Vec<Todo>, InfraError> {
        let rows = sqlx::query_as::<_, TodoRow>(
            r#"
            SELECT id, title, description, completed, deadline_at, created_at, updated_at
            FROM todos
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        into_todos(rows)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(completed = completed))]
    async fn find_all_by_completed(&self, completed: bool) -> Result<Vec<Todo>, InfraError> {
        let rows = sqlx::query_as::<_, TodoRow>(
            r#"
            SELECT id, title, description, completed, deadline_at, created_at, updated_at
            FROM todos
            WHERE completed = ?
            ORDER BY id ASC
            "#,
        )
        .bind(completed)
        .fetch_all(&self.pool)
        .await?;

        into_todos(rows)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: TodoId) -> Result<Option<Todo>, InfraError> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            SELECT id, title, description, completed, deadline_at, created_at, updated_at
            FROM todos
            WHERE id = ?
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Todo::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn insert(&self, tx: &mut TxContext, new_todo: &NewTodo) -> Result<Todo, InfraError> {
        let result = sqlx::query(
            r#"
            INSERT INTO todos (title, description, completed, deadline_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new_todo.title.as_str())
        .bind(new_todo.description.as_deref())
        .bind(new_todo.completed)
        .bind(new_todo.deadline_at.map(|d| d.as_naive()))
        .bind(new_todo.now)
        .bind(new_todo.now)
        .execute(tx.conn()?)
        .await?;

        let id = TodoId::new(result.last_insert_rowid());
        Ok(Todo::from_new(id, new_todo.clone()))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %todo.id()))]
    async fn update(&self, tx: &mut TxContext, todo: &Todo) -> Result<(), InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE todos
            SET title = ?, description = ?, completed = ?, deadline_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(todo.title().as_str())
        .bind(todo.description())
        .bind(todo.completed())
        .bind(todo.deadline_at().map(|d| d.as_naive()))
        .bind(todo.updated_at())
        .bind(todo.id().as_i64())
        .execute(tx.conn()?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(InfraError::conflict("Todo", todo.id()));
        }

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn delete(&self, tx: &mut TxContext, id: TodoId) -> Result<bool, InfraError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id.as_i64())
            .execute(tx.conn()?)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
