//! ユースケース層の共通ヘルパー

use todo_infra::{InfraError, db::TxContext};

use crate::error::TodoError;

/// リポジトリの `Result<Option<T>, InfraError>` を `Result<T, TodoError>` に変換する
///
/// ```ignore
/// let todo = self.todo_repository.find_by_id(id).await.or_not_found()?;
/// ```
pub(crate) trait FindResultExt<T> {
    /// `None` の場合は `TodoError::NotFound`、`InfraError` の場合は `TodoError::Database` を返す
    fn or_not_found(self) -> Result<T, TodoError>;
}

impl<T> FindResultExt<T> for Result<Option<T>, InfraError> {
    fn or_not_found(self) -> Result<T, TodoError> {
        self?.ok_or(TodoError::NotFound)
    }
}

/// 書き込み時の競合（読み取り後に行が削除された）を `TodoError::NotFound` に変換する
///
/// ```ignore
/// self.todo_repository.update(&mut tx, &todo).await.map_err(conflict_as_not_found)?;
/// ```
pub(crate) fn conflict_as_not_found(err: InfraError) -> TodoError {
    if err.is_conflict() {
        TodoError::NotFound
    } else {
        TodoError::Database(err)
    }
}

/// トランザクションをコミットする
pub(crate) async fn commit_tx(tx: TxContext) -> Result<(), TodoError> {
    tx.commit()
        .await
        .map_err(|e| TodoError::Internal(format!("トランザクションコミットに失敗: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_not_found_値があればそのまま返す() {
        let result: Result<Option<i32>, InfraError> = Ok(Some(1));

        assert_eq!(result.or_not_found().unwrap(), 1);
    }

    #[test]
    fn test_or_not_found_noneはnot_found() {
        let result: Result<Option<i32>, InfraError> = Ok(None);

        assert!(matches!(result.or_not_found(), Err(TodoError::NotFound)));
    }

    #[test]
    fn test_or_not_found_インフラエラーはdatabaseエラー() {
        let result: Result<Option<i32>, InfraError> = Err(InfraError::unexpected("boom"));

        assert!(matches!(result.or_not_found(), Err(TodoError::Database(_))));
    }

    #[test]
    fn test_conflict_as_not_found_競合はnot_foundでそれ以外はdatabaseエラー() {
        assert!(matches!(
            conflict_as_not_found(InfraError::conflict("Todo", 1)),
            TodoError::NotFound
        ));
        assert!(matches!(
            conflict_as_not_found(InfraError::unexpected("boom")),
            TodoError::Database(_)
        ));
    }

    #[tokio::test]
    async fn test_commit_tx_モックのトランザクションはコミットできる() {
        commit_tx(TxContext::mock()).await.unwrap();
    }
}
