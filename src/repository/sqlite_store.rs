// ==========================================
// 期刊文章导入 - SQLite 参考出版系统
// ==========================================
// 职责: 以 rusqlite 实现全部协作接口（期刊/期/栏目/提交/文件）
// 存储: 数据库 + files_dir（提交文件区与公共文件区）
// 红线: 不含导入业务逻辑，只负责数据访问
// ==========================================

mod context;
mod file;
mod issue;
mod section;
mod settings;
mod submission;

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::{
    Galley, LocalizedText, Role, Submission, SubmissionFile, WorkflowStage,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// 数据库日期时间格式
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn fmt_datetime(value: &NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

pub(crate) fn parse_datetime(raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

// ==========================================
// SqlitePublishingStore
// ==========================================
pub struct SqlitePublishingStore {
    conn: Arc<Mutex<Connection>>,
    files_dir: PathBuf,
}

impl SqlitePublishingStore {
    /// 创建新的 Store 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - files_dir: 文件存储根目录（不存在时自动创建）
    pub fn new(db_path: &str, files_dir: impl Into<PathBuf>) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::with_files_dir(Arc::new(Mutex::new(conn)), files_dir.into())
    }

    /// 从已有连接创建 Store
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(
        conn: Arc<Mutex<Connection>>,
        files_dir: impl Into<PathBuf>,
    ) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }
        Self::with_files_dir(conn, files_dir.into())
    }

    fn with_files_dir(conn: Arc<Mutex<Connection>>, files_dir: PathBuf) -> RepositoryResult<Self> {
        std::fs::create_dir_all(&files_dir)
            .map_err(|e| RepositoryError::file_storage(&files_dir, e))?;
        Ok(Self { conn, files_dir })
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 文件存储根目录
    pub fn files_dir(&self) -> &Path {
        &self.files_dir
    }

    /// 建表（幂等）
    pub fn init_schema(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        crate::db::init_schema(&conn)?;
        Ok(())
    }

    // ===== 管理辅助（运维/测试使用）=====

    /// 创建期刊
    pub fn create_journal(
        &self,
        path: &str,
        name: &LocalizedText,
        primary_locale: &str,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO journals (path, name_json, primary_locale) VALUES (?1, ?2, ?3)",
            params![path, name.to_json(), primary_locale],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn create_user(&self, username: &str, email: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO users (username, email) VALUES (?1, ?2)",
            params![username, email],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 创建用户组并分配工作流阶段
    pub fn create_user_group(
        &self,
        context_id: i64,
        role: Role,
        name: &str,
        stages: &[WorkflowStage],
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO user_groups (context_id, role, name) VALUES (?1, ?2, ?3)",
            params![context_id, role.to_db_str(), name],
        )?;
        let group_id = tx.last_insert_rowid();
        for stage in stages {
            tx.execute(
                "INSERT OR IGNORE INTO user_group_stages (user_group_id, stage) VALUES (?1, ?2)",
                params![group_id, stage.to_db_str()],
            )?;
        }
        tx.commit()?;
        Ok(group_id)
    }

    pub fn create_genre(&self, context_id: i64, key: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO genres (context_id, genre_key) VALUES (?1, ?2)",
            params![context_id, key],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 写入全局配置（config_kv, scope_id='global'）
    pub fn set_setting(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO config_kv (scope_id, key, value, updated_at)
               VALUES ('global', ?1, ?2, datetime('now'))
               ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value,
                                                        updated_at = excluded.updated_at"#,
            params![key, value],
        )?;
        Ok(())
    }

    // ===== 查询辅助 =====

    pub fn find_submission(&self, submission_id: i64) -> RepositoryResult<Option<Submission>> {
        submission::find_submission(&*self.get_conn()?, submission_id)
    }

    /// 期刊内全部提交（按 ID 升序）
    pub fn list_submissions(&self, context_id: i64) -> RepositoryResult<Vec<Submission>> {
        submission::list_submissions(&*self.get_conn()?, context_id)
    }

    pub fn list_keywords(&self, publication_id: i64, locale: &str) -> RepositoryResult<Vec<String>> {
        submission::list_keywords(&*self.get_conn()?, publication_id, locale)
    }

    pub fn list_galleys(&self, publication_id: i64) -> RepositoryResult<Vec<Galley>> {
        submission::list_galleys(&*self.get_conn()?, publication_id)
    }

    pub fn list_submission_files(
        &self,
        submission_id: i64,
    ) -> RepositoryResult<Vec<SubmissionFile>> {
        file::list_submission_files(&*self.get_conn()?, submission_id)
    }

    /// 期刊的栏目数量
    pub fn count_sections(&self, context_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM sections WHERE context_id = ?1",
            params![context_id],
            |row| row.get(0),
        )?)
    }

    /// 期刊的期数量
    pub fn count_issues(&self, context_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM issues WHERE context_id = ?1",
            params![context_id],
            |row| row.get(0),
        )?)
    }

    /// 期刊的出版物数量
    pub fn count_publications(&self, context_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row(
            r#"SELECT COUNT(*) FROM publications p
               JOIN submissions s ON s.submission_id = p.submission_id
               WHERE s.context_id = ?1"#,
            params![context_id],
            |row| row.get(0),
        )?)
    }

    /// 期刊当前期 ID
    pub fn current_issue_id(&self, context_id: i64) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        Ok(conn.query_row(
            "SELECT current_issue_id FROM journals WHERE journal_id = ?1",
            params![context_id],
            |row| row.get(0),
        )?)
    }

    /// 期的自定义排序号
    pub fn custom_issue_seq(&self, issue_id: i64) -> RepositoryResult<Option<i64>> {
        use rusqlite::OptionalExtension;
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT seq FROM custom_issue_orders WHERE issue_id = ?1",
                params![issue_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// 期内栏目排序（section_id, seq），按 seq 升序
    pub fn list_custom_section_orders(&self, issue_id: i64) -> RepositoryResult<Vec<(i64, i64)>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT section_id, seq FROM custom_section_orders WHERE issue_id = ?1 ORDER BY seq",
        )?;
        let rows = stmt
            .query_map(params![issue_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 提交的阶段指派（user_group_id, user_id, stage）
    pub fn list_stage_assignments(
        &self,
        submission_id: i64,
    ) -> RepositoryResult<Vec<(i64, i64, WorkflowStage)>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT user_group_id, user_id, stage FROM stage_assignments
               WHERE submission_id = ?1 ORDER BY stage_assignment_id"#,
        )?;
        let rows = stmt
            .query_map(params![submission_id], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    WorkflowStage::from_db_str(&row.get::<_, String>(2)?),
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
