//! # テスト用モックリポジトリ
//!
//! ユースケーステストで使用するインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! todo-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! 書き込みは `TxContext::mock()` を受け取った時点で即時反映される
//! （ロールバックは再現しない）。

use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    atomic::{AtomicI64, Ordering},
};

use async_trait::async_trait;
use todo_domain::todo::{NewTodo, Todo, TodoId};

use crate::{
    db::{TransactionManager, TxContext},
    error::InfraError,
    repository::TodoRepository,
};

// ===== MockTodoRepository =====

#[derive(Clone)]
pub struct MockTodoRepository {
    todos:   Arc<Mutex<Vec<Todo>>>,
    next_id: Arc<AtomicI64>,
}

impl Default for MockTodoRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTodoRepository {
    pub fn new() -> Self {
        Self {
            todos:   Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    /// 任意の状態の Todo を直接投入する（採番カウンタも追従させる）
    pub fn add_todo(&self, todo: Todo) {
        self.next_id
            .fetch_max(todo.id().as_i64() + 1, Ordering::SeqCst);
        let mut todos = self.lock();
        todos.push(todo);
        todos.sort_by_key(Todo::id);
    }

    /// 現在保持している全 Todo のスナップショット
    pub fn snapshot(&self) -> Vec<Todo> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Todo>> {
        self.todos.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TodoRepository for MockTodoRepository {
    async fn find_all(&self) -> Result<Vec<Todo>, InfraError> {
        Ok(self.snapshot())
    }

    async fn find_all_by_completed(&self, completed: bool) -> Result<Vec<Todo>, InfraError> {
        Ok(self
            .lock()
            .iter()
            .filter(|t| t.completed() == completed)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: TodoId) -> Result<Option<Todo>, InfraError> {
        Ok(self.lock().iter().find(|t| t.id() == id).cloned())
    }

    async fn insert(&self, _tx: &mut TxContext, new_todo: &NewTodo) -> Result<Todo, InfraError> {
        let id = TodoId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let todo = Todo::from_new(id, new_todo.clone());
        self.lock().push(todo.clone());
        Ok(todo)
    }

    async fn update(&self, _tx: &mut TxContext, todo: &Todo) -> Result<(), InfraError> {
        let mut todos = self.lock();
        let Some(existing) = todos.iter_mut().find(|t| t.id() == todo.id()) else {
            return Err(InfraError::conflict("Todo", todo.id()));
        };
        *existing = todo.clone();
        Ok(())
    }

    async fn delete(&self, _tx: &mut TxContext, id: TodoId) -> Result<bool, InfraError> {
        let mut todos = self.lock();
        let before = todos.len();
        todos.retain(|t| t.id() != id);
        Ok(todos.len() < before)
    }
}

// ===== MockTransactionManager =====

#[derive(Clone, Default)]
pub struct MockTransactionManager;

#[async_trait]
impl TransactionManager for MockTransactionManager {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        Ok(TxContext::mock())
    }
}
