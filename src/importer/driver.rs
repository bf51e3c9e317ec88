// ==========================================
// 期刊文章导入 - 导入驱动
// ==========================================
// 流程: 条目发现 → 逐条调度（不提前终止）→ 计数 → 有导入成功则重排期
// 计数: imported / skipped（ErrorClass::Skipped）/ failed（其余）
//       结构不合法的目录按失败计，先于条目报告
// 期重排失败记入汇总，不丢弃已提交文章的报告
// ==========================================

use crate::config::Configuration;
use crate::importer::cache::RunCache;
use crate::importer::discovery::discover_entries;
use crate::importer::dispatcher::DialectDispatcher;
use crate::importer::error::{ErrorClass, ImportError, ImportResult};
use crate::importer::resequence::resequence_issues;
use crate::parser::ImportedArticle;
use crate::repository::publishing_store::PublishingStore;
use serde::Serialize;
use std::time::Instant;
use tracing::{error, info, warn};

/// 单篇文章的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArticleStatus {
    Imported,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleReport {
    /// "卷-期-文章"（结构错误时为目录路径）
    pub label: String,
    pub status: ArticleStatus,
    /// 跳过/失败原因
    pub message: Option<String>,
    pub article: Option<ImportedArticle>,
}

/// 一次导入运行的汇总
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub count: usize,
    pub imported: usize,
    pub failed: usize,
    pub skipped: usize,
    pub reports: Vec<ArticleReport>,
    /// 期重排失败原因
    pub resequence_error: Option<String>,
}

impl ImportSummary {
    fn record_success(&mut self, label: String, article: ImportedArticle) {
        self.imported += 1;
        self.reports.push(ArticleReport {
            label,
            status: ArticleStatus::Imported,
            message: None,
            article: Some(article),
        });
    }

    fn record_error(&mut self, label: String, error: &ImportError) {
        let status = match error.class() {
            ErrorClass::Skipped => {
                self.skipped += 1;
                ArticleStatus::Skipped
            }
            ErrorClass::Configuration | ErrorClass::Failed => {
                self.failed += 1;
                ArticleStatus::Failed
            }
        };
        self.reports.push(ArticleReport {
            label,
            status,
            message: Some(error.to_string()),
            article: None,
        });
    }
}

// ==========================================
// ImportDriver
// ==========================================
pub struct ImportDriver<'a> {
    store: &'a dyn PublishingStore,
    config: &'a Configuration,
    cache: RunCache,
}

impl<'a> ImportDriver<'a> {
    pub fn new(store: &'a dyn PublishingStore, config: &'a Configuration) -> Self {
        Self {
            store,
            config,
            cache: RunCache::new(),
        }
    }

    /// 执行一次完整导入
    ///
    /// # 返回
    /// - Ok(ImportSummary): 运行完成（单篇失败不影响整体）
    /// - Err: 导入根目录无法读取
    pub fn run(&mut self) -> ImportResult<ImportSummary> {
        let start_time = Instant::now();
        let root = self.config.import_root();
        info!(root = %root.display(), journal = %self.config.journal().path, "开始导入");

        let discovered = discover_entries(root)?;
        let mut summary = ImportSummary {
            count: discovered.count(),
            ..Default::default()
        };
        info!(count = summary.count, "条目发现完成");

        for rejected in discovered.rejected {
            error!(folder = %rejected.folder, error = %rejected.error, "目录结构错误");
            summary.record_error(rejected.folder, &rejected.error);
        }

        let dispatcher = DialectDispatcher::new(self.store, self.config);
        for entry in &discovered.entries {
            let label = entry.label();
            match dispatcher.process(entry, &mut self.cache) {
                Ok(article) => {
                    info!(
                        article = %label,
                        dialect = %article.dialect,
                        submission_id = article.submission_id,
                        "文章已导入"
                    );
                    summary.record_success(label, article);
                }
                Err(e) if e.class() == ErrorClass::Skipped => {
                    warn!(article = %label, reason = %e, "文章已跳过");
                    summary.record_error(label, &e);
                }
                Err(e) => {
                    error!(article = %label, error = %e, "文章导入失败");
                    summary.record_error(label, &e);
                }
            }
        }

        if summary.imported > 0 {
            if let Err(e) = resequence_issues(self.store, self.config.context_id()) {
                error!(error = %e, "期重排失败");
                summary.resequence_error = Some(e.to_string());
            }
        }

        info!(
            count = summary.count,
            imported = summary.imported,
            failed = summary.failed,
            skipped = summary.skipped,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "导入结束"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_classification() {
        let mut summary = ImportSummary::default();
        summary.record_error("1-1-1".to_string(), &ImportError::NoSuitableParser);
        summary.record_error("1-1-2".to_string(), &ImportError::MissingTitle);
        summary.record_error(
            "1-1-3".to_string(),
            &ImportError::MissingGenre("IMAGE".to_string()),
        );

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.imported, 0);
        assert_eq!(summary.reports[0].status, ArticleStatus::Skipped);
        assert_eq!(summary.reports[2].status, ArticleStatus::Failed);
        assert!(summary.reports[1].message.is_some());
    }
}
