// ==========================================
// 期刊文章导入 - 元数据解析层
// ==========================================
// 职责: 文档加载与路径查询、两种元数据方言的解析器
// 方言: A++（Springer）、JATS
// 探测: 文档类型不符 → UnsupportedFormat（调度器尝试下一个方言）
// ==========================================

pub mod aplusplus;
pub mod common;
pub mod document;
pub mod jats;
pub mod locale;
pub mod xpath;

use crate::domain::{Issue, Publication, Section, Submission};
use crate::importer::error::{ImportError, ImportResult};
use common::ParserSession;
use document::DocTypeIdentity;
use serde::Serialize;
use std::collections::BTreeMap;

pub use aplusplus::APlusPlusParser;
pub use jats::JatsParser;

// ==========================================
// Dialect - 元数据方言
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dialect {
    APlusPlus,
    Jats,
}

impl Dialect {
    /// 配置中使用的名称
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::APlusPlus => "aplusplus",
            Dialect::Jats => "jats",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "aplusplus" => Some(Dialect::APlusPlus),
            "jats" => Some(Dialect::Jats),
            _ => None,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 导入成功的文章
#[derive(Debug, Clone, Serialize)]
pub struct ImportedArticle {
    pub dialect: Dialect,
    pub submission_id: i64,
    pub publication_id: i64,
    pub issue_id: i64,
    pub section_id: i64,
}

/// 单个方言的执行结果
#[derive(Debug)]
pub enum ProbeOutcome {
    /// 文档类型匹配且导入成功
    Matched(ImportedArticle),
    /// 文档类型不属于该方言
    UnsupportedFormat(String),
    /// 文档类型匹配但导入失败（已回滚）
    Failed(ImportError),
}

// ==========================================
// ArticleParser - 方言解析器接口
// ==========================================
// get_publication 内部按需触发 get_submission → get_section → get_issue，
// 各环节结果在会话内只计算一次
pub trait ArticleParser {
    fn dialect(&self) -> Dialect;

    /// 可接受的文档类型身份
    fn doc_types(&self) -> Vec<DocTypeIdentity>;

    /// 读取并校验元数据文档
    fn load_document(&mut self) -> ImportResult<()>;

    fn session(&self) -> &ParserSession<'_>;

    /// 公共标识符（类型 → 值）
    fn get_public_ids(&mut self) -> ImportResult<BTreeMap<String, String>>;

    fn get_issue(&mut self) -> ImportResult<Issue>;

    fn get_section(&mut self) -> ImportResult<Section>;

    fn get_submission(&mut self) -> ImportResult<Submission>;

    /// 构建并落库出版物（含作者、关键词、galley）
    fn get_publication(&mut self) -> ImportResult<Publication>;

    /// 删除本次执行创建的实体
    fn rollback(&mut self);

    /// 执行一次导入: 加载 → 重复检查 → 出版物；失败时回滚
    fn execute(&mut self) -> ProbeOutcome {
        match self.load_document() {
            Ok(()) => {}
            Err(ImportError::InvalidDocType(message)) => {
                return ProbeOutcome::UnsupportedFormat(message)
            }
            Err(e) => return ProbeOutcome::Failed(e),
        }

        match self.import() {
            Ok(article) => ProbeOutcome::Matched(article),
            Err(e) => {
                self.rollback();
                ProbeOutcome::Failed(e)
            }
        }
    }

    fn import(&mut self) -> ImportResult<ImportedArticle> {
        let ids = self.get_public_ids()?;
        self.session().ensure_not_exists(&ids)?;
        let publication = self.get_publication()?;
        let dialect = self.dialect();
        self.session().imported(dialect, publication.id)
    }
}

/// 按方言构造解析器
pub fn build_parser<'a>(
    dialect: Dialect,
    session: ParserSession<'a>,
) -> Box<dyn ArticleParser + 'a> {
    match dialect {
        Dialect::APlusPlus => Box::new(APlusPlusParser::new(session)),
        Dialect::Jats => Box::new(JatsParser::new(session)),
    }
}
