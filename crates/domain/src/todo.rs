//! # Todo（やること）
//!
//! Todo エンティティと、それを構成する値オブジェクトを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 備考 |
//! |---|------------|------|
//! | [`Todo`] | Todo | 唯一のエンティティ |
//! | [`TodoTitle`] | タイトル | 空文字列不可 |
//! | [`Deadline`] | 期限 | タイムゾーンなしの ISO-8601 日時 |
//! | [`DeadlineWindow`] | 期限ウィンドウ | 「今から N 日以内」の絞り込み条件 |
//! | [`TodoField`] | 書き込み可能フィールド | ペイロードのホワイトリスト |
//!
//! ## 不変条件
//!
//! - `id` はストアが採番し、以降変更されない
//! - `created_at` / `updated_at` はクライアントから書き込めない
//! - 変更操作（`with_*`）は必ず `updated_at` を更新する

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::error::DomainError;

/// Todo ID
///
/// SQLite の `INTEGER PRIMARY KEY` で採番される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[display("{_0}")]
#[serde(transparent)]
pub struct TodoId(i64);

impl TodoId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// クライアントが書き込み可能なフィールド
///
/// 作成・更新ペイロードのホワイトリスト。ここに無いキーは
/// Unexpected-Field として拒否される。
///
/// ```
/// use todo_domain::todo::TodoField;
///
/// assert_eq!("deadline_at".parse::<TodoField>().unwrap(), TodoField::DeadlineAt);
/// assert!("id".parse::<TodoField>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum TodoField {
    Title,
    Description,
    Completed,
    DeadlineAt,
}

impl TodoField {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// ホワイトリストに含まれるキーかどうか
    pub fn is_allowed(key: &str) -> bool {
        key.parse::<Self>().is_ok()
    }
}

impl fmt::Display for TodoField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Todo のタイトル（値オブジェクト）
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{_0}")]
pub struct TodoTitle(String);

impl TodoTitle {
    /// # バリデーション
    ///
    /// - 空文字列ではない（空白のみも不可）
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::validation("Title must not be empty"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 期限（値オブジェクト）
///
/// タイムゾーンを持たない日時。オフセット付きで渡された場合は UTC に
/// 正規化してから保持する。
///
/// ## 受け付ける形式
///
/// | 入力例 | 解釈 |
/// |--------|------|
/// | `2023-02-27T00:00:00` | そのまま |
/// | `2023-02-27T09:30:00.250` | 小数秒付き |
/// | `2023-02-27 09:30:00` | 区切りが空白 |
/// | `2023-02-27T09:30` | 秒省略 |
/// | `2023-02-27` | その日の 00:00:00 |
/// | `2023-02-27T09:30:00+09:00` | UTC に変換（00:30:00） |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(NaiveDateTime);

/// オフセットなし日時として試す書式（先に一致したものを採用）
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

impl Deadline {
    pub fn new(value: NaiveDateTime) -> Self {
        Self(value)
    }

    /// ISO-8601 テキストから期限をパースする
    pub fn parse(text: &str) -> Result<Self, DomainError> {
        let text = text.trim();

        for format in NAIVE_FORMATS {
            if let Ok(value) = NaiveDateTime::parse_from_str(text, format) {
                return Ok(Self(value));
            }
        }

        if let Ok(value) = DateTime::parse_from_rfc3339(text) {
            return Ok(Self(value.naive_utc()));
        }

        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Ok(Self(date.and_time(chrono::NaiveTime::MIN)));
        }

        Err(DomainError::validation("Invalid deadline_at format"))
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    /// ISO-8601 テキストに整形する
    ///
    /// 小数秒は 0 のとき省略される（例: `2023-02-27T00:00:00`）。
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

/// 期限ウィンドウ（「今から N 日以内」）
///
/// N は負でもよい。その場合は「N 日以上前に期限切れ」の Todo だけが残る。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineWindow {
    days: i64,
}

impl DeadlineWindow {
    pub fn days(days: i64) -> Self {
        Self { days }
    }

    /// クエリパラメータの文字列からパースする
    ///
    /// 前後の空白と先頭の符号は許容する。
    pub fn parse(text: &str) -> Result<Self, DomainError> {
        text.trim()
            .parse::<i64>()
            .map(Self::days)
            .map_err(|_| DomainError::validation("Invalid window parameter"))
    }

    pub fn as_days(&self) -> i64 {
        self.days
    }

    /// `now + N 日` の上限日時を計算する
    ///
    /// 日時の表現範囲を超える場合はバリデーションエラー。
    pub fn limit_from(&self, now: DateTime<Utc>) -> Result<NaiveDateTime, DomainError> {
        TimeDelta::try_days(self.days)
            .and_then(|delta| now.naive_utc().checked_add_signed(delta))
            .ok_or_else(|| DomainError::validation("Invalid window parameter"))
    }
}

/// 新規 Todo の入力
///
/// ID はストアが採番するため含まない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title:       TodoTitle,
    pub description: Option<String>,
    pub completed:   bool,
    pub deadline_at: Option<Deadline>,
    pub now:         DateTime<Utc>,
}

/// Todo エンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    id:          TodoId,
    title:       TodoTitle,
    description: Option<String>,
    completed:   bool,
    deadline_at: Option<Deadline>,
    created_at:  DateTime<Utc>,
    updated_at:  DateTime<Utc>,
}

impl Todo {
    /// 採番済み ID と入力からエンティティを組み立てる
    ///
    /// `created_at` と `updated_at` は `input.now` で初期化される。
    pub fn from_new(id: TodoId, input: NewTodo) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            completed: input.completed,
            deadline_at: input.deadline_at,
            created_at: input.now,
            updated_at: input.now,
        }
    }

    /// 既存のデータから復元する（データベースから取得時）
    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: TodoId,
        title: TodoTitle,
        description: Option<String>,
        completed: bool,
        deadline_at: Option<Deadline>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            completed,
            deadline_at,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> TodoId {
        self.id
    }

    pub fn title(&self) -> &TodoTitle {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn deadline_at(&self) -> Option<Deadline> {
        self.deadline_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn with_title(self, title: TodoTitle, now: DateTime<Utc>) -> Self {
        Self {
            title,
            updated_at: now,
            ..self
        }
    }

    pub fn with_description(self, description: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            description,
            updated_at: now,
            ..self
        }
    }

    pub fn with_completed(self, completed: bool, now: DateTime<Utc>) -> Self {
        Self {
            completed,
            updated_at: now,
            ..self
        }
    }

    pub fn with_deadline_at(self, deadline_at: Option<Deadline>, now: DateTime<Utc>) -> Self {
        Self {
            deadline_at,
            updated_at: now,
            ..self
        }
    }

    /// フィールドを変えずに `updated_at` だけ更新する
    pub fn touched(self, now: DateTime<Utc>) -> Self {
        Self {
            updated_at: now,
            ..self
        }
    }

    /// 期限が `limit` 以前かどうか
    ///
    /// 期限のない Todo は常に `false`（ウィンドウ絞り込みの対象外）。
    pub fn is_due_by(&self, limit: NaiveDateTime) -> bool {
        self.deadline_at
            .is_some_and(|deadline| deadline.as_naive() <= limit)
    }
}
