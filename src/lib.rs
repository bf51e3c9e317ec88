// ==========================================
// 期刊文章导入工具 - 核心库
// ==========================================
// 输入: 卷/期/文章 三级目录（PDF + XML 元数据 + 可选 HTML/封面）
// 元数据方言: Springer A++、JATS
// 输出: 出版系统数据模型（期、栏目、投稿、出版版本、作者、排版稿件）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 出版系统实体
pub mod domain;

// 数据仓储层 - 出版系统协作接口
pub mod repository;

// 解析层 - XML 文档与方言解析器
pub mod parser;

// 导入层 - 条目发现、调度、驱动
pub mod importer;

// 配置层 - 运行配置与设置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

pub use config::{Configuration, ConfigurationArgs, DefaultSettings, ImportSettings};
pub use domain::{Issue, Journal, LocalizedText, Publication, Section, Submission};
pub use importer::{
    ArticleEntry, ArticleReport, ArticleStatus, ErrorClass, ImportDriver, ImportError,
    ImportResult, ImportSummary,
};
pub use parser::{ArticleParser, Dialect, ImportedArticle};
pub use repository::{PublishingStore, SqlitePublishingStore};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "期刊文章导入工具";
