// ==========================================
// 期刊文章导入 - SQLite 连接初始化与参考库结构
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 提供参考出版系统的建表语句（init_schema，幂等）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 创建参考出版系统的全部表（IF NOT EXISTS，可重复执行）
///
/// 说明：
/// - 多语言字段以 JSON 文本存储（LocalizedText）
/// - 删除 submission 级联删除其出版物、作者、关键词、galley、文件、阶段指派
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        -- ===== 期刊 / 用户 / 角色 =====
        CREATE TABLE IF NOT EXISTS journals (
            journal_id INTEGER PRIMARY KEY AUTOINCREMENT,
            path TEXT NOT NULL UNIQUE,
            name_json TEXT NOT NULL DEFAULT '{}',
            primary_locale TEXT NOT NULL,
            current_issue_id INTEGER
        );

        CREATE TABLE IF NOT EXISTS users (
            user_id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS user_groups (
            user_group_id INTEGER PRIMARY KEY AUTOINCREMENT,
            context_id INTEGER NOT NULL REFERENCES journals(journal_id) ON DELETE CASCADE,
            role TEXT NOT NULL,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS user_group_stages (
            user_group_id INTEGER NOT NULL REFERENCES user_groups(user_group_id) ON DELETE CASCADE,
            stage TEXT NOT NULL,
            PRIMARY KEY (user_group_id, stage)
        );

        CREATE TABLE IF NOT EXISTS genres (
            genre_id INTEGER PRIMARY KEY AUTOINCREMENT,
            context_id INTEGER NOT NULL REFERENCES journals(journal_id) ON DELETE CASCADE,
            genre_key TEXT NOT NULL,
            UNIQUE (context_id, genre_key)
        );

        -- ===== 期 / 栏目 =====
        CREATE TABLE IF NOT EXISTS issues (
            issue_id INTEGER PRIMARY KEY AUTOINCREMENT,
            context_id INTEGER NOT NULL REFERENCES journals(journal_id) ON DELETE CASCADE,
            volume TEXT NOT NULL,
            number TEXT NOT NULL,
            year INTEGER NOT NULL,
            published INTEGER NOT NULL DEFAULT 0,
            is_current INTEGER NOT NULL DEFAULT 0,
            date_published TEXT NOT NULL,
            access_status TEXT NOT NULL,
            show_volume INTEGER NOT NULL DEFAULT 1,
            show_number INTEGER NOT NULL DEFAULT 1,
            show_year INTEGER NOT NULL DEFAULT 1,
            show_title INTEGER NOT NULL DEFAULT 0,
            cover_image_json TEXT NOT NULL DEFAULT '{}',
            UNIQUE (context_id, volume, number)
        );

        CREATE TABLE IF NOT EXISTS custom_issue_orders (
            issue_id INTEGER PRIMARY KEY REFERENCES issues(issue_id) ON DELETE CASCADE,
            context_id INTEGER NOT NULL,
            seq INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sections (
            section_id INTEGER PRIMARY KEY AUTOINCREMENT,
            context_id INTEGER NOT NULL REFERENCES journals(journal_id) ON DELETE CASCADE,
            title_json TEXT NOT NULL DEFAULT '{}',
            abbrev_json TEXT NOT NULL DEFAULT '{}',
            policy_json TEXT NOT NULL DEFAULT '{}',
            abstracts_not_required INTEGER NOT NULL DEFAULT 0,
            meta_indexed INTEGER NOT NULL DEFAULT 1,
            meta_reviewed INTEGER NOT NULL DEFAULT 0,
            editor_restricted INTEGER NOT NULL DEFAULT 0,
            hide_title INTEGER NOT NULL DEFAULT 0,
            hide_author INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS section_titles (
            section_id INTEGER NOT NULL REFERENCES sections(section_id) ON DELETE CASCADE,
            locale TEXT NOT NULL,
            title TEXT NOT NULL,
            PRIMARY KEY (section_id, locale)
        );

        CREATE INDEX IF NOT EXISTS idx_section_titles_lookup ON section_titles(locale, title);

        CREATE TABLE IF NOT EXISTS custom_section_orders (
            issue_id INTEGER NOT NULL REFERENCES issues(issue_id) ON DELETE CASCADE,
            section_id INTEGER NOT NULL REFERENCES sections(section_id) ON DELETE CASCADE,
            seq INTEGER NOT NULL,
            PRIMARY KEY (issue_id, section_id)
        );

        -- ===== 提交 / 出版物 =====
        CREATE TABLE IF NOT EXISTS submissions (
            submission_id INTEGER PRIMARY KEY AUTOINCREMENT,
            context_id INTEGER NOT NULL REFERENCES journals(journal_id) ON DELETE CASCADE,
            section_id INTEGER NOT NULL REFERENCES sections(section_id),
            status TEXT NOT NULL,
            stage TEXT NOT NULL,
            locale TEXT NOT NULL,
            date_submitted TEXT NOT NULL,
            current_publication_id INTEGER
        );

        CREATE TABLE IF NOT EXISTS publications (
            publication_id INTEGER PRIMARY KEY AUTOINCREMENT,
            submission_id INTEGER NOT NULL REFERENCES submissions(submission_id) ON DELETE CASCADE,
            status TEXT NOT NULL,
            version INTEGER NOT NULL DEFAULT 1,
            seq INTEGER NOT NULL DEFAULT 0,
            access_status TEXT NOT NULL,
            date_published TEXT NOT NULL,
            section_id INTEGER NOT NULL,
            issue_id INTEGER NOT NULL,
            pages TEXT,
            title_json TEXT NOT NULL DEFAULT '{}',
            subtitle_json TEXT NOT NULL DEFAULT '{}',
            abstract_json TEXT NOT NULL DEFAULT '{}',
            locale TEXT,
            language TEXT,
            copyright_holder_json TEXT NOT NULL DEFAULT '{}',
            copyright_notice_json TEXT NOT NULL DEFAULT '{}',
            copyright_year TEXT,
            license_url TEXT,
            citations_raw TEXT,
            cover_image_json TEXT NOT NULL DEFAULT '{}',
            primary_contact_id INTEGER
        );

        CREATE TABLE IF NOT EXISTS publication_pub_ids (
            publication_id INTEGER NOT NULL REFERENCES publications(publication_id) ON DELETE CASCADE,
            pub_id_type TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (publication_id, pub_id_type)
        );

        CREATE INDEX IF NOT EXISTS idx_pub_ids_lookup ON publication_pub_ids(pub_id_type, value);

        CREATE TABLE IF NOT EXISTS publication_keywords (
            publication_id INTEGER NOT NULL REFERENCES publications(publication_id) ON DELETE CASCADE,
            locale TEXT NOT NULL,
            seq INTEGER NOT NULL,
            keyword TEXT NOT NULL,
            PRIMARY KEY (publication_id, locale, seq)
        );

        CREATE TABLE IF NOT EXISTS authors (
            author_id INTEGER PRIMARY KEY AUTOINCREMENT,
            publication_id INTEGER NOT NULL REFERENCES publications(publication_id) ON DELETE CASCADE,
            given_name_json TEXT NOT NULL DEFAULT '{}',
            family_name_json TEXT NOT NULL DEFAULT '{}',
            affiliation_json TEXT NOT NULL DEFAULT '{}',
            email TEXT NOT NULL,
            url TEXT,
            seq INTEGER NOT NULL,
            include_in_browse INTEGER NOT NULL DEFAULT 1,
            primary_contact INTEGER NOT NULL DEFAULT 0,
            user_group_id INTEGER
        );

        CREATE TABLE IF NOT EXISTS galleys (
            galley_id INTEGER PRIMARY KEY AUTOINCREMENT,
            publication_id INTEGER NOT NULL REFERENCES publications(publication_id) ON DELETE CASCADE,
            name_json TEXT NOT NULL DEFAULT '{}',
            seq INTEGER NOT NULL,
            label TEXT NOT NULL,
            locale TEXT NOT NULL,
            submission_file_id INTEGER
        );

        CREATE TABLE IF NOT EXISTS submission_files (
            submission_file_id INTEGER PRIMARY KEY AUTOINCREMENT,
            submission_id INTEGER NOT NULL REFERENCES submissions(submission_id) ON DELETE CASCADE,
            stored_path TEXT NOT NULL,
            genre_id INTEGER NOT NULL,
            file_stage TEXT NOT NULL,
            uploader_user_id INTEGER NOT NULL,
            assoc_type TEXT,
            assoc_id INTEGER,
            name_json TEXT NOT NULL DEFAULT '{}',
            file_type TEXT NOT NULL,
            file_size INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS stage_assignments (
            stage_assignment_id INTEGER PRIMARY KEY AUTOINCREMENT,
            submission_id INTEGER NOT NULL REFERENCES submissions(submission_id) ON DELETE CASCADE,
            user_group_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            stage TEXT NOT NULL
        );
        "#,
    )?;

    let applied = read_schema_version(conn)?.unwrap_or(0);
    if applied < CURRENT_SCHEMA_VERSION {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [CURRENT_SCHEMA_VERSION],
        )?;
    }

    Ok(())
}
