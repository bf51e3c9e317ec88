// ==========================================
// 期刊文章导入 - 导入层
// ==========================================
// 职责: 条目发现、方言调度、导入驱动、期重排
// 流程: 目录 → ArticleEntry → 方言解析器 → 出版系统数据模型
// ==========================================

pub mod cache;
pub mod discovery;
pub mod dispatcher;
pub mod driver;
pub mod entry;
pub mod error;
pub mod resequence;

// 重导出核心类型
pub use cache::RunCache;
pub use discovery::{discover_entries, natural_cmp, DiscoveredEntries, RejectedFolder};
pub use dispatcher::DialectDispatcher;
pub use driver::{ArticleReport, ArticleStatus, ImportDriver, ImportSummary};
pub use entry::ArticleEntry;
pub use error::{ErrorClass, ImportError, ImportResult};
pub use resequence::resequence_issues;
