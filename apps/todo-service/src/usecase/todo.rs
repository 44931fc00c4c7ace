//! Todo ユースケース

pub mod payload;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use todo_domain::{
    clock::Clock,
    todo::{DeadlineWindow, NewTodo, Todo, TodoId},
};
use todo_infra::{db::TransactionManager, repository::TodoRepository};
use todo_shared::{event_log::event, log_business_event};

use self::payload::{CreateTodoInput, TodoPayload, UpdateTodoInput};
use super::helpers::{FindResultExt, commit_tx, conflict_as_not_found};
use crate::error::TodoError;

/// 一覧取得の絞り込み条件
///
/// `completed` を先に（ストアで）適用し、その後 `window` を適用する。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListTodosFilter {
    pub completed: Option<bool>,
    pub window:    Option<DeadlineWindow>,
}

impl ListTodosFilter {
    /// クエリパラメータの文字列から組み立てる
    ///
    /// `completed` は大文字小文字を区別せず `"true"` のときだけ true、
    /// それ以外の値はすべて false。
    pub fn parse(completed: Option<&str>, window: Option<&str>) -> Result<Self, TodoError> {
        Ok(Self {
            completed: completed.map(|value| value.eq_ignore_ascii_case("true")),
            window:    window.map(DeadlineWindow::parse).transpose()?,
        })
    }
}

/// Todo ユースケース
pub struct TodoUseCaseImpl {
    todo_repository: Arc<dyn TodoRepository>,
    tx_manager:      Arc<dyn TransactionManager>,
    clock:           Arc<dyn Clock>,
}

impl TodoUseCaseImpl {
    pub fn new(
        todo_repository: Arc<dyn TodoRepository>,
        tx_manager: Arc<dyn TransactionManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            todo_repository,
            tx_manager,
            clock,
        }
    }

    /// Todo 一覧を取得する（`id` 昇順）
    pub async fn list_todos(&self, filter: ListTodosFilter) -> Result<Vec<Todo>, TodoError> {
        let deadline_limit = filter
            .window
            .map(|window| window.limit_from(self.clock.now()))
            .transpose()?;

        let todos = match filter.completed {
            Some(completed) => self.todo_repository.find_all_by_completed(completed).await?,
            None => self.todo_repository.find_all().await?,
        };

        let Some(limit) = deadline_limit else {
            return Ok(todos);
        };
        Ok(todos.into_iter().filter(|todo| todo.is_due_by(limit)).collect())
    }

    /// Todo を 1 件取得する
    pub async fn get_todo(&self, id: TodoId) -> Result<Todo, TodoError> {
        self.todo_repository.find_by_id(id).await.or_not_found()
    }

    /// Todo を作成する
    ///
    /// 1. 新規 Todo を組み立てる（`created_at` / `updated_at` は現在時刻）
    /// 2. トランザクション内で挿入し、採番された ID を受け取る
    /// 3. コミット
    pub async fn create_todo(&self, input: CreateTodoInput) -> Result<Todo, TodoError> {
        let new_todo = NewTodo {
            title:       input.title,
            description: input.description,
            completed:   input.completed,
            deadline_at: input.deadline_at,
            now:         self.clock.now(),
        };

        let mut tx = self.tx_manager.begin().await?;
        let todo = self.todo_repository.insert(&mut tx, &new_todo).await?;
        commit_tx(tx).await?;

        log_business_event!(
            event.category = event::category::TODO,
            event.action = event::action::TODO_CREATED,
            event.entity_type = event::entity_type::TODO,
            event.entity_id = %todo.id(),
            event.result = event::result::SUCCESS,
            "Todo 作成完了"
        );

        Ok(todo)
    }

    /// Todo を更新する
    ///
    /// 存在確認をペイロード検証より先に行う。存在しない ID への更新は、
    /// ペイロードの内容に関わらず Not-Found になる。
    ///
    /// 指定されたフィールドだけを置き換え、`updated_at` は必ず更新する。
    pub async fn update_todo(&self, id: TodoId, payload: TodoPayload) -> Result<Todo, TodoError> {
        let todo = self.todo_repository.find_by_id(id).await.or_not_found()?;
        let input = payload.into_update_input(id)?;

        let todo = apply_update(todo, input, self.clock.now());

        let mut tx = self.tx_manager.begin().await?;
        self.todo_repository
            .update(&mut tx, &todo)
            .await
            .map_err(conflict_as_not_found)?;
        commit_tx(tx).await?;

        log_business_event!(
            event.category = event::category::TODO,
            event.action = event::action::TODO_UPDATED,
            event.entity_type = event::entity_type::TODO,
            event.entity_id = %todo.id(),
            event.result = event::result::SUCCESS,
            "Todo 更新完了"
        );

        Ok(todo)
    }

    /// Todo を削除する
    ///
    /// 削除した Todo の最終状態を返す。存在しない場合は何もせず `None`。
    /// 読み取り後に別のリクエストで削除されていた場合も `None`。
    pub async fn delete_todo(&self, id: TodoId) -> Result<Option<Todo>, TodoError> {
        let Some(todo) = self.todo_repository.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut tx = self.tx_manager.begin().await?;
        let deleted = self.todo_repository.delete(&mut tx, id).await?;
        commit_tx(tx).await?;

        if !deleted {
            return Ok(None);
        }

        log_business_event!(
            event.category = event::category::TODO,
            event.action = event::action::TODO_DELETED,
            event.entity_type = event::entity_type::TODO,
            event.entity_id = %id,
            event.result = event::result::SUCCESS,
            "Todo 削除完了"
        );

        Ok(Some(todo))
    }
}

fn apply_update(todo: Todo, input: UpdateTodoInput, now: DateTime<Utc>) -> Todo {
    let todo = todo.touched(now);

    let todo = match input.title {
        Some(title) => todo.with_title(title, now),
        None => todo,
    };
    let todo = match input.description {
        Some(description) => todo.with_description(description, now),
        None => todo,
    };
    let todo = match input.completed {
        Some(completed) => todo.with_completed(completed, now),
        None => todo,
    };
    match input.deadline_at {
        Some(deadline_at) => todo.with_deadline_at(deadline_at, now),
        None => todo,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use todo_domain::{
        clock::FixedClock,
        todo::{Deadline, TodoTitle},
    };
    use async_trait::async_trait;
    use todo_infra::{
        InfraError,
        db::TxContext,
        mock::{MockTodoRepository, MockTransactionManager},
    };

    use super::*;

    fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 2, 20, 0, 0, 0).unwrap()
    }

    fn deadline(month: u32, day: u32) -> Deadline {
        Deadline::new(
            NaiveDate::from_ymd_opt(2023, month, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )
    }

    fn todo(id: i64, completed: bool, deadline_at: Option<Deadline>) -> Todo {
        Todo::from_db(
            TodoId::new(id),
            TodoTitle::new(format!("Todo {id}")).unwrap(),
            None,
            completed,
            deadline_at,
            created_at(),
            created_at(),
        )
    }

    fn setup(todos: Vec<Todo>) -> (TodoUseCaseImpl, MockTodoRepository, Arc<FixedClock>) {
        let repo = MockTodoRepository::new();
        for todo in todos {
            repo.add_todo(todo);
        }
        let clock = Arc::new(FixedClock::new(created_at()));
        let sut = TodoUseCaseImpl::new(
            Arc::new(repo.clone()),
            Arc::new(MockTransactionManager),
            clock.clone(),
        );
        (sut, repo, clock)
    }

    /// 読み取りでは見つかるが、書き込みの時点では別のリクエストに削除されているリポジトリ
    struct VanishingTodoRepository {
        stale: Todo,
        store: MockTodoRepository,
    }

    #[async_trait]
    impl TodoRepository for VanishingTodoRepository {
        async fn find_all(&self) -> Result<Vec<Todo>, InfraError> {
            self.store.find_all().await
        }

        async fn find_all_by_completed(&self, completed: bool) -> Result<Vec<Todo>, InfraError> {
            self.store.find_all_by_completed(completed).await
        }

        async fn find_by_id(&self, _id: TodoId) -> Result<Option<Todo>, InfraError> {
            Ok(Some(self.stale.clone()))
        }

        async fn insert(&self, tx: &mut TxContext, new_todo: &NewTodo) -> Result<Todo, InfraError> {
            self.store.insert(tx, new_todo).await
        }

        async fn update(&self, tx: &mut TxContext, todo: &Todo) -> Result<(), InfraError> {
            self.store.update(tx, todo).await
        }

        async fn delete(&self, tx: &mut TxContext, id: TodoId) -> Result<bool, InfraError> {
            self.store.delete(tx, id).await
        }
    }

    fn setup_vanishing(stale: Todo) -> TodoUseCaseImpl {
        let repo = VanishingTodoRepository {
            stale,
            store: MockTodoRepository::new(),
        };
        TodoUseCaseImpl::new(
            Arc::new(repo),
            Arc::new(MockTransactionManager),
            Arc::new(FixedClock::new(created_at())),
        )
    }

    fn payload(value: serde_json::Value) -> TodoPayload {
        TodoPayload::from_value(value).unwrap()
    }

    fn ids(todos: &[Todo]) -> Vec<i64> {
        todos.iter().map(|todo| todo.id().as_i64()).collect()
    }

    // ===== list_todos =====

    #[rstest]
    #[case(None, vec![1, 2, 3])]
    #[case(Some(true), vec![2])]
    #[case(Some(false), vec![1, 3])]
    #[tokio::test]
    async fn test_list_todos_完了状態で絞り込める(
        #[case] completed: Option<bool>,
        #[case] expected: Vec<i64>,
    ) {
        // Given
        let (sut, _, _) = setup(vec![todo(1, false, None), todo(2, true, None), todo(3, false, None)]);

        // When
        let result = sut
            .list_todos(ListTodosFilter {
                completed,
                window: None,
            })
            .await
            .unwrap();

        // Then
        assert_eq!(ids(&result), expected);
    }

    #[tokio::test]
    async fn test_list_todos_期限ウィンドウは期限なしを除外し上限以下だけ残す() {
        // Given: 現在時刻 2023-02-20、ウィンドウ 7 日 → 上限 2023-02-27T00:00:00
        let (sut, _, _) = setup(vec![
            todo(1, false, None),
            todo(2, false, Some(deadline(2, 27))),
            todo(3, false, Some(deadline(2, 28))),
            todo(4, false, Some(deadline(1, 1))),
        ]);

        // When
        let result = sut
            .list_todos(ListTodosFilter {
                completed: None,
                window:    Some(DeadlineWindow::days(7)),
            })
            .await
            .unwrap();

        // Then
        assert_eq!(ids(&result), vec![2, 4]);
    }

    #[tokio::test]
    async fn test_list_todos_完了状態と期限ウィンドウを組み合わせられる() {
        let (sut, _, _) = setup(vec![
            todo(1, true, Some(deadline(2, 21))),
            todo(2, false, Some(deadline(2, 21))),
            todo(3, true, None),
        ]);

        let result = sut
            .list_todos(ListTodosFilter {
                completed: Some(true),
                window:    Some(DeadlineWindow::days(1)),
            })
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![1]);
    }

    #[tokio::test]
    async fn test_list_todos_負のウィンドウは過去の期限だけ残す() {
        let (sut, _, _) = setup(vec![todo(1, false, Some(deadline(2, 10))), todo(2, false, Some(deadline(2, 19)))]);

        let result = sut
            .list_todos(ListTodosFilter {
                completed: None,
                window:    Some(DeadlineWindow::days(-5)),
            })
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![1]);
    }

    #[tokio::test]
    async fn test_list_todos_ウィンドウは時計の現在時刻を基準にする() {
        let (sut, _, clock) = setup(vec![todo(1, false, Some(deadline(3, 1)))]);
        let filter = ListTodosFilter {
            completed: None,
            window:    Some(DeadlineWindow::days(1)),
        };

        assert!(sut.list_todos(filter).await.unwrap().is_empty());

        clock.set(Utc.with_ymd_and_hms(2023, 2, 28, 0, 0, 0).unwrap());
        assert_eq!(ids(&sut.list_todos(filter).await.unwrap()), vec![1]);
    }

    #[tokio::test]
    async fn test_list_todos_範囲外のウィンドウはinvalid_input() {
        let (sut, _, _) = setup(vec![]);

        let result = sut
            .list_todos(ListTodosFilter {
                completed: None,
                window:    Some(DeadlineWindow::days(i64::MAX)),
            })
            .await;

        assert_eq!(result.unwrap_err().to_string(), "Invalid window parameter");
    }

    #[rstest]
    #[case(Some("true"), Some(true))]
    #[case(Some("TRUE"), Some(true))]
    #[case(Some("false"), Some(false))]
    #[case(Some("yes"), Some(false))]
    #[case(None, None)]
    fn test_list_filter_completedの解釈(#[case] raw: Option<&str>, #[case] expected: Option<bool>) {
        let filter = ListTodosFilter::parse(raw, None).unwrap();

        assert_eq!(filter.completed, expected);
    }

    #[test]
    fn test_list_filter_整数でないウィンドウはinvalid_input() {
        let result = ListTodosFilter::parse(None, Some("abc"));

        assert_eq!(result.unwrap_err().to_string(), "Invalid window parameter");
    }

    // ===== get_todo =====

    #[tokio::test]
    async fn test_get_todo_存在しないidはnot_found() {
        let (sut, _, _) = setup(vec![todo(1, false, None)]);

        let result = sut.get_todo(TodoId::new(99)).await;

        assert!(matches!(result, Err(TodoError::NotFound)));
    }

    // ===== create_todo =====

    #[tokio::test]
    async fn test_create_todo_採番して保存しタイムスタンプを設定する() {
        // Given
        let (sut, repo, _) = setup(vec![]);
        let input = payload(json!({"title": "牛乳を買う", "deadline_at": "2023-02-27T00:00:00"}))
            .into_create_input()
            .unwrap();

        // When
        let created = sut.create_todo(input).await.unwrap();

        // Then
        assert_eq!(created.id(), TodoId::new(1));
        assert_eq!(created.title().as_str(), "牛乳を買う");
        assert!(!created.completed());
        assert_eq!(created.deadline_at(), Some(deadline(2, 27)));
        assert_eq!(created.created_at(), created_at());
        assert_eq!(created.updated_at(), created_at());
        assert_eq!(repo.snapshot(), vec![created]);
    }

    // ===== update_todo =====

    #[tokio::test]
    async fn test_update_todo_指定したフィールドだけ置き換えupdated_atを更新する() {
        // Given
        let (sut, repo, clock) = setup(vec![todo(1, false, Some(deadline(2, 27)))]);
        let later = Utc.with_ymd_and_hms(2023, 2, 21, 12, 0, 0).unwrap();
        clock.set(later);

        // When
        let updated = sut
            .update_todo(TodoId::new(1), payload(json!({"completed": true, "description": "詳細"})))
            .await
            .unwrap();

        // Then
        assert!(updated.completed());
        assert_eq!(updated.description(), Some("詳細"));
        assert_eq!(updated.title().as_str(), "Todo 1");
        assert_eq!(updated.deadline_at(), Some(deadline(2, 27)));
        assert_eq!(updated.created_at(), created_at());
        assert_eq!(updated.updated_at(), later);
        assert_eq!(repo.snapshot(), vec![updated]);
    }

    #[tokio::test]
    async fn test_update_todo_nullで期限をクリアできる() {
        let (sut, _, _) = setup(vec![todo(1, false, Some(deadline(2, 27)))]);

        let updated = sut
            .update_todo(TodoId::new(1), payload(json!({"deadline_at": null})))
            .await
            .unwrap();

        assert_eq!(updated.deadline_at(), None);
    }

    #[tokio::test]
    async fn test_update_todo_空のペイロードでもupdated_atは更新される() {
        let (sut, _, clock) = setup(vec![todo(1, false, None)]);
        let later = Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap();
        clock.set(later);

        let updated = sut.update_todo(TodoId::new(1), payload(json!({}))).await.unwrap();

        assert_eq!(updated.updated_at(), later);
    }

    #[tokio::test]
    async fn test_update_todo_存在しないidはペイロード検証より先にnot_found() {
        let (sut, _, _) = setup(vec![]);

        let result = sut
            .update_todo(TodoId::new(1), payload(json!({"id": 2, "foo": "bar"})))
            .await;

        assert!(matches!(result, Err(TodoError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_todo_検証エラー時は保存しない() {
        let original = todo(1, false, None);
        let (sut, repo, _) = setup(vec![original.clone()]);

        let result = sut
            .update_todo(TodoId::new(1), payload(json!({"title": "新しい", "foo": 1})))
            .await;

        assert!(matches!(result, Err(TodoError::UnexpectedFields(_))));
        assert_eq!(repo.snapshot(), vec![original]);
    }

    #[tokio::test]
    async fn test_update_todo_読み取り後に削除されていればnot_found() {
        let sut = setup_vanishing(todo(1, false, None));

        let result = sut
            .update_todo(TodoId::new(1), payload(json!({"completed": true})))
            .await;

        assert!(matches!(result, Err(TodoError::NotFound)));
    }

    // ===== delete_todo =====

    #[tokio::test]
    async fn test_delete_todo_削除した最終状態を返す() {
        let original = todo(1, true, None);
        let (sut, repo, _) = setup(vec![original.clone(), todo(2, false, None)]);

        let deleted = sut.delete_todo(TodoId::new(1)).await.unwrap();

        assert_eq!(deleted, Some(original));
        assert_eq!(ids(&repo.snapshot()), vec![2]);
    }

    #[tokio::test]
    async fn test_delete_todo_存在しないidはnoneを返す() {
        let (sut, _, _) = setup(vec![]);

        let deleted = sut.delete_todo(TodoId::new(1)).await.unwrap();

        assert_eq!(deleted, None);
    }

    #[tokio::test]
    async fn test_delete_todo_読み取り後に削除されていればnoneを返す() {
        let sut = setup_vanishing(todo(1, false, None));

        let deleted = sut.delete_todo(TodoId::new(1)).await.unwrap();

        assert_eq!(deleted, None);
    }
}
