// ==========================================
// 期刊文章导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 每个错误归入唯一的 ErrorClass（配置/跳过/失败）
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 错误归类（决定导入驱动如何计数）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 启动阶段的致命配置错误，终止整个运行
    Configuration,
    /// 文章被跳过（已存在 / 无可用解析器）
    Skipped,
    /// 文章导入失败（已回滚）
    Failed,
}

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 配置错误 =====
    #[error("期刊不存在: {0}")]
    UnknownJournal(String),

    #[error("用户不存在: {0}")]
    UnknownUser(String),

    #[error("邮箱格式无效: {0}")]
    InvalidEmail(String),

    #[error("导入目录不存在: {0}")]
    ImportPathNotFound(String),

    #[error("期刊 {0} 缺少分配到出版阶段的管理员用户组")]
    MissingEditorGroup(String),

    #[error("期刊缺少文件分类: {0}")]
    MissingGenre(String),

    #[error("未知的解析器: {0}")]
    UnknownParser(String),

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 目录结构错误 =====
    #[error("目录名不含数字: {0}")]
    InvalidFolderName(String),

    #[error("{folder} 中 {kind} 文件数量不符: 期望 {expected}，实际 {count}")]
    UnexpectedFileCount {
        folder: String,
        kind: &'static str,
        expected: &'static str,
        count: usize,
    },

    #[error("意外的目录: {0}")]
    UnexpectedDirectory(String),

    #[error("{folder} 与 {existing} 编号相同 ({label})")]
    DuplicateEntryFolder {
        folder: String,
        existing: String,
        label: String,
    },

    // ===== 文档错误 =====
    #[error("XML 解析失败 ({path}): {message}")]
    XmlParse { path: String, message: String },

    #[error("不支持的文档类型: {0}")]
    InvalidDocType(String),

    #[error("路径表达式错误 ({expr}): {message}")]
    PathExpression { expr: String, message: String },

    // ===== 跳过 =====
    #[error("没有可用的解析器")]
    NoSuitableParser,

    #[error("文章已存在 ({pub_id_type}: {value})")]
    AlreadyExists { pub_id_type: String, value: String },

    // ===== 文章数据错误 =====
    #[error("缺少文章标题")]
    MissingTitle,

    #[error("缺少出版日期")]
    MissingPublicationDate,

    // ===== 存储错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("文件读取失败 ({path}): {message}")]
    FileReadError { path: String, message: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 错误归类
    pub fn class(&self) -> ErrorClass {
        match self {
            ImportError::UnknownJournal(_)
            | ImportError::UnknownUser(_)
            | ImportError::InvalidEmail(_)
            | ImportError::ImportPathNotFound(_)
            | ImportError::MissingEditorGroup(_)
            | ImportError::MissingGenre(_)
            | ImportError::UnknownParser(_)
            | ImportError::ConfigValueError { .. } => ErrorClass::Configuration,

            ImportError::NoSuitableParser | ImportError::AlreadyExists { .. } => {
                ErrorClass::Skipped
            }

            _ => ErrorClass::Failed,
        }
    }

    /// 构造文件读取错误
    pub fn file_read(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        ImportError::FileReadError {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert_eq!(
            ImportError::UnknownUser("ghost".to_string()).class(),
            ErrorClass::Configuration
        );
        assert_eq!(ImportError::NoSuitableParser.class(), ErrorClass::Skipped);
        assert_eq!(
            ImportError::AlreadyExists {
                pub_id_type: "doi".to_string(),
                value: "10.1/x".to_string(),
            }
            .class(),
            ErrorClass::Skipped
        );
        assert_eq!(ImportError::MissingTitle.class(), ErrorClass::Failed);
        assert_eq!(
            ImportError::InvalidFolderName("vol".to_string()).class(),
            ErrorClass::Failed
        );
        let repo_err = RepositoryError::LockError("poisoned".to_string());
        assert_eq!(ImportError::from(repo_err).class(), ErrorClass::Failed);
    }

    #[test]
    fn test_unexpected_file_count_message() {
        let err = ImportError::UnexpectedFileCount {
            folder: "1/2/3".to_string(),
            kind: "submission",
            expected: "1",
            count: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("submission"));
        assert!(msg.contains('2'));
    }
}
