//! # 書き込みペイロードの検証
//!
//! 作成・更新リクエストの JSON オブジェクトを検証し、型付きの入力に変換する。
//!
//! ## 検証の順序
//!
//! | 操作 | 順序 |
//! |------|------|
//! | 作成 | `title` の有無 → ホワイトリスト → 各フィールドの型 |
//! | 更新 | `id` の不一致 → ホワイトリスト → 各フィールドの型 |
//!
//! 更新時の存在確認（Not-Found）はこれより前にユースケース側で行う。
//!
//! ホワイトリスト検査は構造体へのデシリアライズではなく、実際に送られてきた
//! キーを列挙して [`TodoField`] と照合する。

use itertools::Itertools;
use serde_json::{Map, Value};
use todo_domain::todo::{Deadline, TodoField, TodoId, TodoTitle};

use crate::error::TodoError;

/// 検証前のペイロード（JSON オブジェクト）
#[derive(Debug, Clone, PartialEq)]
pub struct TodoPayload(Map<String, Value>);

/// Todo 作成の入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTodoInput {
    pub title:       TodoTitle,
    pub description: Option<String>,
    pub completed:   bool,
    pub deadline_at: Option<Deadline>,
}

/// Todo 更新の入力
///
/// 外側の `None` は「キーなし（変更しない）」、`Some(None)` は「null（クリア）」。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTodoInput {
    pub title:       Option<TodoTitle>,
    pub description: Option<Option<String>>,
    pub completed:   Option<bool>,
    pub deadline_at: Option<Option<Deadline>>,
}

impl TodoPayload {
    /// JSON 値からペイロードを作る
    ///
    /// オブジェクト以外は Invalid-Input。
    pub fn from_value(value: Value) -> Result<Self, TodoError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            _ => Err(invalid_json_payload()),
        }
    }

    /// 作成用の入力に変換する
    pub fn into_create_input(self) -> Result<CreateTodoInput, TodoError> {
        if self.0.get(TodoField::Title.as_str()).is_none_or(Value::is_null) {
            return Err(TodoError::MissingField(TodoField::Title.as_str()));
        }
        self.check_whitelist()?;

        Ok(CreateTodoInput {
            title:       self.title()?.ok_or(TodoError::MissingField(TodoField::Title.as_str()))?,
            description: self.description()?.flatten(),
            completed:   self.completed()?.unwrap_or(false),
            deadline_at: self.deadline_at()?.flatten(),
        })
    }

    /// 更新用の入力に変換する
    ///
    /// `id` キーが null でなく、かつパスの ID と異なる場合は Immutable-Field。
    /// パスと同じ `id` はホワイトリスト違反として扱う。
    pub fn into_update_input(self, path_id: TodoId) -> Result<UpdateTodoInput, TodoError> {
        let id_changed = self
            .0
            .get("id")
            .is_some_and(|id| !id.is_null() && !id_matches(id, path_id));
        if id_changed {
            return Err(TodoError::ImmutableField);
        }
        self.check_whitelist()?;

        Ok(UpdateTodoInput {
            title:       self.title()?,
            description: self.description()?,
            completed:   self.completed()?,
            deadline_at: self.deadline_at()?,
        })
    }

    fn check_whitelist(&self) -> Result<(), TodoError> {
        let unexpected: Vec<String> = self
            .0
            .keys()
            .filter(|key| !TodoField::is_allowed(key))
            .sorted()
            .cloned()
            .collect();

        if unexpected.is_empty() {
            Ok(())
        } else {
            Err(TodoError::UnexpectedFields(unexpected))
        }
    }

    fn title(&self) -> Result<Option<TodoTitle>, TodoError> {
        match self.0.get(TodoField::Title.as_str()) {
            None => Ok(None),
            Some(Value::String(title)) => Ok(Some(TodoTitle::new(title.as_str())?)),
            Some(_) => Err(invalid_value(TodoField::Title)),
        }
    }

    fn description(&self) -> Result<Option<Option<String>>, TodoError> {
        match self.0.get(TodoField::Description.as_str()) {
            None => Ok(None),
            Some(Value::Null) => Ok(Some(None)),
            Some(Value::String(description)) => Ok(Some(Some(description.clone()))),
            Some(_) => Err(invalid_value(TodoField::Description)),
        }
    }

    fn completed(&self) -> Result<Option<bool>, TodoError> {
        match self.0.get(TodoField::Completed.as_str()) {
            None => Ok(None),
            Some(Value::Bool(completed)) => Ok(Some(*completed)),
            Some(_) => Err(invalid_value(TodoField::Completed)),
        }
    }

    fn deadline_at(&self) -> Result<Option<Option<Deadline>>, TodoError> {
        match self.0.get(TodoField::DeadlineAt.as_str()) {
            None => Ok(None),
            Some(Value::Null) => Ok(Some(None)),
            Some(Value::String(text)) => Ok(Some(Some(Deadline::parse(text)?))),
            Some(_) => Err(invalid_value(TodoField::DeadlineAt)),
        }
    }
}

/// `5` と `5.0` はどちらもパスの ID 5 と一致する
///
/// 小数表記は整数値で、かつ `i64` へ誤差なく変換できる場合だけ比較する。
fn id_matches(value: &Value, path_id: TodoId) -> bool {
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0; // 2^63

    if let Some(id) = value.as_i64() {
        return id == path_id.as_i64();
    }
    if value.is_u64() {
        return false;
    }
    value.as_f64().is_some_and(|id| {
        id.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&id) && id as i64 == path_id.as_i64()
    })
}

fn invalid_value(field: TodoField) -> TodoError {
    TodoError::InvalidInput(format!("Invalid value for field: {field}"))
}

pub(crate) fn invalid_json_payload() -> TodoError {
    TodoError::InvalidInput("Invalid JSON payload".to_string())
}
