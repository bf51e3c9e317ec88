// ==========================================
// 期刊文章导入 - 方言调度器
// ==========================================
// 规则: 按配置顺序逐个尝试方言解析器
//   - 文档类型不符 → 尝试下一个
//   - 其他失败 → 立即返回（不再尝试其他方言）
//   - 全部不符 → NoSuitableParser（按跳过计）
// ==========================================

use crate::config::Configuration;
use crate::importer::cache::RunCache;
use crate::importer::entry::ArticleEntry;
use crate::importer::error::{ImportError, ImportResult};
use crate::parser::common::ParserSession;
use crate::parser::{build_parser, ImportedArticle, ProbeOutcome};
use crate::repository::publishing_store::PublishingStore;
use tracing::{debug, instrument};

pub struct DialectDispatcher<'a> {
    store: &'a dyn PublishingStore,
    config: &'a Configuration,
}

impl<'a> DialectDispatcher<'a> {
    pub fn new(store: &'a dyn PublishingStore, config: &'a Configuration) -> Self {
        Self { store, config }
    }

    /// 导入一个条目
    ///
    /// # 参数
    /// - entry: 文章条目
    /// - cache: 本次运行的缓存
    ///
    /// # 返回
    /// - Ok: 匹配方言的导入结果
    /// - Err(NoSuitableParser): 没有方言接受该文档
    /// - Err: 匹配方言的导入失败（已回滚）
    #[instrument(skip(self, entry, cache), fields(entry = %entry.label()))]
    pub fn process(
        &self,
        entry: &ArticleEntry,
        cache: &mut RunCache,
    ) -> ImportResult<ImportedArticle> {
        for dialect in self.config.dialects() {
            let session = ParserSession::new(self.store, self.config, &mut *cache, entry);
            let mut parser = build_parser(*dialect, session);
            match parser.execute() {
                ProbeOutcome::Matched(article) => {
                    debug!(dialect = %dialect, submission_id = article.submission_id, "方言匹配");
                    return Ok(article);
                }
                ProbeOutcome::UnsupportedFormat(doc_type) => {
                    debug!(dialect = %dialect, doc_type = %doc_type, "文档类型不符，尝试下一个方言");
                }
                ProbeOutcome::Failed(e) => return Err(e),
            }
        }
        Err(ImportError::NoSuitableParser)
    }
}
