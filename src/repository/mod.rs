// ==========================================
// 期刊文章导入 - 数据仓储层
// ==========================================
// 职责: 目标出版系统的协作接口与 SQLite 参考实现
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod publishing_store;
pub mod sqlite_store;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use publishing_store::{
    ContextRepository, FileRepository, IssueRepository, PublishingStore, SectionRepository,
    SubmissionRepository,
};
pub use sqlite_store::SqlitePublishingStore;
