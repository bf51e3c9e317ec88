// ==========================================
// 期刊文章导入 - 领域模型层
// ==========================================
// 职责: 目标出版系统的数据模型（期刊/期/栏目/提交/出版物/作者/galley/文件）
// 红线: 不含数据访问逻辑,不含解析逻辑
// ==========================================

pub mod issue;
pub mod journal;
pub mod submission;
pub mod types;

// 重导出核心类型
pub use issue::{Issue, Section};
pub use journal::{Genre, Journal, User};
pub use submission::{Author, CoverImage, Galley, Publication, Submission, SubmissionFile};
pub use types::{
    genre_keys, AccessStatus, FileAssoc, FileStage, LocalizedText, PublicationStatus, Role,
    WorkflowStage,
};
