//! SQLite Message Repository 実装
//!
//! `messages` テーブルに 1 メッセージ 1 行で永続化します。
//! タイムスタンプは UNIX エポックからのナノ秒（INTEGER）で保存するため、
//! SQL 側の並び替えは数値比較になり、往復しても値が変わりません。

use std::{path::Path, str::FromStr};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::domain::{
    Identity, Message, MessageId, MessageRepository, MessageText, NewMessage, StoreError,
    Timestamp,
};

const MAX_CONNECTIONS: u32 = 5;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

/// SQLite-backed message store.
pub struct SqliteMessageRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: i64,
    author: String,
    text: String,
    timestamp: i64,
}

impl TryFrom<MessageRow> for Message {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |reason: String| StoreError::CorruptRow { id, reason };

        Ok(Self {
            id: MessageId::new(id),
            author: Identity::new(row.author).map_err(|e| corrupt(e.to_string()))?,
            text: MessageText::new(row.text).map_err(|e| corrupt(e.to_string()))?,
            timestamp: Timestamp::from_unix_nanos(row.timestamp),
        })
    }
}

impl SqliteMessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database file at `path` and make sure the schema
    /// exists. Missing parent directories are created.
    pub async fn connect(path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.exists() {
                tracing::info!("database directory {} does not exist, creating it", dir.display());
            }
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                StoreError::Storage(format!("failed to create {}: {e}", dir.display()))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        Self::init(&pool).await?;
        tracing::info!("message store opened at {}", path.display());
        Ok(Self::new(pool))
    }

    /// Private in-memory database. Uses a single pinned connection so every
    /// query sees the same database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::init(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Create the `messages` table if it doesn't exist.
    pub async fn init(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS messages (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                author    TEXT    NOT NULL,
                text      TEXT    NOT NULL,
                timestamp INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages (timestamp, id)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

fn into_messages(rows: Vec<MessageRow>) -> Result<Vec<Message>, StoreError> {
    rows.into_iter().map(Message::try_from).collect()
}

#[async_trait]
impl MessageRepository for SqliteMessageRepository {
    async fn save(&self, message: NewMessage) -> Result<Message, StoreError> {
        let timestamp = message.timestamp.unwrap_or_else(Timestamp::now);
        let nanos = timestamp
            .unix_nanos()
            .ok_or_else(|| StoreError::TimestampOutOfRange(timestamp.to_rfc3339()))?;

        let result = sqlx::query("INSERT INTO messages (author, text, timestamp) VALUES (?, ?, ?)")
            .bind(message.author.as_str())
            .bind(message.text.as_str())
            .bind(nanos)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("messages.save failed: {e}"))?;

        let id = MessageId::new(result.last_insert_rowid());
        tracing::debug!("message saved with id {id} at {timestamp}");
        Ok(Message::stored(message, id, timestamp))
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Message>, StoreError> {
        // SQLite reads a negative LIMIT as "no limit"
        if limit <= 0 {
            return Ok(Vec::new());
        }

        let mut rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, author, text, timestamp FROM messages
             ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("messages.recent failed: {e}"))?;

        rows.reverse();
        into_messages(rows)
    }

    async fn all(&self) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, author, text, timestamp FROM messages ORDER BY timestamp ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("messages.all failed: {e}"))?;

        into_messages(rows)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn new_message(author: &str, text: &str) -> NewMessage {
        NewMessage::new(
            Identity::new(author.to_string()).unwrap(),
            MessageText::new(text.to_string()).unwrap(),
        )
    }

    fn at(seconds: i64) -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(seconds))
    }

    fn texts(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.text.as_str()).collect()
    }

    #[tokio::test]
    async fn test_sqlite_save_assigns_increasing_ids() {
        // テスト項目: 保存のたびに増加する id が割り当てられる
        // given (前提条件):
        let repo = SqliteMessageRepository::in_memory().await.unwrap();

        // when (操作):
        let first = repo.save(new_message("alice", "one")).await.unwrap();
        let second = repo.save(new_message("bob", "two")).await.unwrap();

        // then (期待する結果):
        assert!(first.id < second.id);
    }

    #[tokio::test]
    async fn test_sqlite_timestamp_round_trip_is_exact() {
        // テスト項目: ナノ秒精度のタイムスタンプがそのまま読み戻せる
        // given (前提条件):
        let repo = SqliteMessageRepository::in_memory().await.unwrap();
        let ts = Timestamp::new(
            Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap() + Duration::nanoseconds(123_456_789),
        );

        // when (操作):
        let saved = repo
            .save(NewMessage::with_timestamp(
                Identity::new("alice".to_string()).unwrap(),
                MessageText::new("precise".to_string()).unwrap(),
                ts,
            ))
            .await
            .unwrap();
        let all = repo.all().await.unwrap();

        // then (期待する結果):
        assert_eq!(saved.timestamp, ts);
        assert_eq!(all, vec![saved]);
    }

    #[tokio::test]
    async fn test_sqlite_save_assigns_timestamp_when_missing() {
        // テスト項目: タイムスタンプ未設定なら保存時刻が入る
        let repo = SqliteMessageRepository::in_memory().await.unwrap();
        let before = Utc::now();

        let saved = repo.save(new_message("alice", "now")).await.unwrap();

        assert!(saved.timestamp.value() >= before);
    }

    #[tokio::test]
    async fn test_sqlite_all_orders_backdated_messages() {
        // テスト項目: all は保存順ではなくタイムスタンプ順に返す
        // given (前提条件):
        let repo = SqliteMessageRepository::in_memory().await.unwrap();
        for (text, seconds) in [("late", 30), ("early", 10), ("middle", 20)] {
            let mut message = new_message("alice", text);
            message.timestamp = Some(at(seconds));
            repo.save(message).await.unwrap();
        }

        // when (操作):
        let all = repo.all().await.unwrap();

        // then (期待する結果):
        assert_eq!(texts(&all), vec!["early", "middle", "late"]);
    }

    #[tokio::test]
    async fn test_sqlite_recent_window() {
        // テスト項目: recent は最新 limit 件を古い順で返し、0 以下なら空
        // given (前提条件):
        let repo = SqliteMessageRepository::in_memory().await.unwrap();
        for i in 1..=5 {
            let mut message = new_message("alice", &format!("m{i}"));
            message.timestamp = Some(at(i));
            repo.save(message).await.unwrap();
        }

        // then (期待する結果):
        assert_eq!(texts(&repo.recent(3).await.unwrap()), vec!["m3", "m4", "m5"]);
        assert_eq!(repo.recent(10).await.unwrap().len(), 5);
        assert!(repo.recent(0).await.unwrap().is_empty());
        assert!(repo.recent(-1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sqlite_equal_timestamps_break_ties_by_id() {
        // テスト項目: 同じタイムスタンプは id 順で並ぶ（recent でも同じ）
        // given (前提条件):
        let repo = SqliteMessageRepository::in_memory().await.unwrap();
        for text in ["a", "b", "c"] {
            let mut message = new_message("alice", text);
            message.timestamp = Some(at(1));
            repo.save(message).await.unwrap();
        }

        // then (期待する結果):
        assert_eq!(texts(&repo.all().await.unwrap()), vec!["a", "b", "c"]);
        assert_eq!(texts(&repo.recent(2).await.unwrap()), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_sqlite_connect_creates_directory_and_persists() {
        // テスト項目: ファイル DB は親ディレクトリを作成し、再接続後もデータが残る
        // given (前提条件):
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("keeper.db");

        // when (操作):
        {
            let repo = SqliteMessageRepository::connect(&path).await.unwrap();
            repo.save(new_message("alice", "persisted")).await.unwrap();
            repo.pool.close().await;
        }
        let reopened = SqliteMessageRepository::connect(&path).await.unwrap();

        // then (期待する結果):
        let all = reopened.all().await.unwrap();
        assert_eq!(texts(&all), vec!["persisted"]);
    }

    #[tokio::test]
    async fn test_sqlite_long_text_round_trip() {
        // テスト項目: 長い本文・長い Identity も保存でき、読み戻しで拒否されない
        // given (前提条件):
        let repo = SqliteMessageRepository::in_memory().await.unwrap();
        let author = format!("{}@example.com", "a".repeat(242));
        let text = "x".repeat(50_000);

        // when (操作):
        repo.save(new_message(&author, &text)).await.unwrap();

        // then (期待する結果):
        let recent = repo.recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].author.as_str(), author);
        assert_eq!(recent[0].text.as_str().len(), 50_000);
    }

    #[tokio::test]
    async fn test_sqlite_rejects_out_of_range_timestamp() {
        // テスト項目: i64 ナノ秒で表せない日時は TimestampOutOfRange になり、保存されない
        // given (前提条件):
        let repo = SqliteMessageRepository::in_memory().await.unwrap();
        let mut message = new_message("alice", "far future");
        message.timestamp = Some(Timestamp::new(Utc.with_ymd_and_hms(2300, 1, 1, 0, 0, 0).unwrap()));

        // when (操作):
        let result = repo.save(message).await;

        // then (期待する結果):
        assert!(matches!(result, Err(StoreError::TimestampOutOfRange(_))));
        assert!(repo.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sqlite_concurrent_saves_get_unique_ids() {
        // テスト項目: 複数接続のプールで並行保存しても id は一意
        // given (前提条件):
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(
            SqliteMessageRepository::connect(&dir.path().join("keeper.db"))
                .await
                .unwrap(),
        );

        // when (操作):
        let handles: Vec<_> = (0..20)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.save(new_message("alice", &format!("m{i}"))).await.unwrap()
                })
            })
            .collect();
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().id);
        }

        // then (期待する結果):
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
        assert_eq!(repo.all().await.unwrap().len(), 20);
    }
}
