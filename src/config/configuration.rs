// ==========================================
// 期刊文章导入 - 运行配置
// ==========================================
// 职责: 一次导入运行的只读配置，构造时即完成全部校验
// 失败: 任一校验失败均为 ErrorClass::Configuration，终止整个运行
// ==========================================

use crate::config::settings::ImportSettings;
use crate::domain::{genre_keys, Genre, Journal, Role, User, WorkflowStage};
use crate::importer::error::{ImportError, ImportResult};
use crate::parser::Dialect;
use crate::repository::publishing_store::PublishingStore;
use chrono::NaiveDateTime;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 邮箱格式（本地部分@带点域名）
const EMAIL_PATTERN: &str = r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$";

/// 构造参数（对应命令行的五个位置参数）
#[derive(Debug, Clone)]
pub struct ConfigurationArgs {
    pub journal_path: String,
    pub username: String,
    pub editor_username: String,
    pub default_email: String,
    pub import_path: PathBuf,
    /// 运行日期；None 时取本地当前时间
    pub today: Option<NaiveDateTime>,
}

// ==========================================
// Configuration
// ==========================================
#[derive(Debug, Clone)]
pub struct Configuration {
    journal: Journal,
    importer: User,
    editor: User,
    default_email: String,
    import_root: PathBuf,
    editor_group_id: i64,
    author_group_id: Option<i64>,
    submission_genre: Genre,
    dialects: Vec<Dialect>,
    default_section_name: String,
    issue_cover_basename: String,
    image_extensions: Vec<String>,
    today: NaiveDateTime,
}

impl Configuration {
    /// 构造并校验运行配置
    ///
    /// # 参数
    /// - store: 目标出版系统（同时提供导入参数）
    /// - args: 命令行参数
    ///
    /// # 返回
    /// - Err: 期刊/用户不存在、邮箱无效、目录不存在、缺少编辑用户组或提交文件分类、解析器名未知
    pub fn new<S>(store: &S, args: ConfigurationArgs) -> ImportResult<Self>
    where
        S: PublishingStore + ImportSettings + ?Sized,
    {
        let journal = store
            .find_journal_by_path(&args.journal_path)?
            .ok_or_else(|| ImportError::UnknownJournal(args.journal_path.clone()))?;

        let importer = find_user(store, &args.username)?;
        let editor = find_user(store, &args.editor_username)?;

        if !is_valid_email(&args.default_email)? {
            return Err(ImportError::InvalidEmail(args.default_email));
        }

        if !args.import_path.is_dir() {
            return Err(ImportError::ImportPathNotFound(
                args.import_path.display().to_string(),
            ));
        }

        let editor_group_id = store
            .find_user_group_for_stage(journal.id, Role::Manager, WorkflowStage::Production)?
            .ok_or_else(|| ImportError::MissingEditorGroup(journal.path.clone()))?;
        let author_group_id = store.find_first_user_group(journal.id, Role::Author)?;

        let submission_genre = store
            .find_genre_by_key(journal.id, genre_keys::SUBMISSION)?
            .ok_or_else(|| ImportError::MissingGenre(genre_keys::SUBMISSION.to_string()))?;

        let dialects = store
            .get_parser_names()?
            .iter()
            .map(|name| {
                Dialect::from_name(name).ok_or_else(|| ImportError::UnknownParser(name.clone()))
            })
            .collect::<ImportResult<Vec<_>>>()?;
        if dialects.is_empty() {
            return Err(ImportError::ConfigValueError {
                key: crate::config::settings::config_keys::PARSERS.to_string(),
                value: String::new(),
                message: "至少需要一个解析器".to_string(),
            });
        }

        let today = args
            .today
            .unwrap_or_else(|| chrono::Local::now().naive_local());

        let configuration = Self {
            journal,
            importer,
            editor,
            default_email: args.default_email,
            import_root: args.import_path,
            editor_group_id,
            author_group_id,
            submission_genre,
            dialects,
            default_section_name: store.get_default_section_name()?,
            issue_cover_basename: store.get_issue_cover_basename()?,
            image_extensions: store.get_image_extensions()?,
            today,
        };

        info!(
            journal = %configuration.journal.path,
            importer = %configuration.importer.username,
            editor = %configuration.editor.username,
            import_root = %configuration.import_root.display(),
            "导入配置校验通过"
        );
        debug!(dialects = ?configuration.dialects, editor_group_id, "解析器顺序");

        Ok(configuration)
    }

    // ===== 访问器 =====

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn context_id(&self) -> i64 {
        self.journal.id
    }

    pub fn importer(&self) -> &User {
        &self.importer
    }

    pub fn editor(&self) -> &User {
        &self.editor
    }

    pub fn default_email(&self) -> &str {
        &self.default_email
    }

    pub fn import_root(&self) -> &Path {
        &self.import_root
    }

    pub fn editor_group_id(&self) -> i64 {
        self.editor_group_id
    }

    pub fn author_group_id(&self) -> Option<i64> {
        self.author_group_id
    }

    pub fn submission_genre(&self) -> &Genre {
        &self.submission_genre
    }

    /// 解析器尝试顺序
    pub fn dialects(&self) -> &[Dialect] {
        &self.dialects
    }

    pub fn default_section_name(&self) -> &str {
        &self.default_section_name
    }

    pub fn issue_cover_basename(&self) -> &str {
        &self.issue_cover_basename
    }

    pub fn image_extensions(&self) -> &[String] {
        &self.image_extensions
    }

    pub fn is_image_extension(&self, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        self.image_extensions.iter().any(|ext| *ext == extension)
    }

    /// 运行日期（“当前日期”来源）
    pub fn today(&self) -> NaiveDateTime {
        self.today
    }
}

fn find_user<S>(store: &S, username: &str) -> ImportResult<User>
where
    S: PublishingStore + ?Sized,
{
    store
        .find_user_by_username(username)?
        .ok_or_else(|| ImportError::UnknownUser(username.to_string()))
}

/// 邮箱语法校验
pub fn is_valid_email(email: &str) -> ImportResult<bool> {
    let re = Regex::new(EMAIL_PATTERN).map_err(|e| ImportError::InternalError(e.to_string()))?;
    Ok(re.is_match(email.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("editor@example.org").unwrap());
        assert!(is_valid_email("first.last+tag@sub.example.co").unwrap());
        assert!(!is_valid_email("no-at-sign.example.org").unwrap());
        assert!(!is_valid_email("user@localhost").unwrap());
        assert!(!is_valid_email("user@@example.org").unwrap());
        assert!(!is_valid_email("").unwrap());
    }
}
