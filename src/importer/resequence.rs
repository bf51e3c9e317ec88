// ==========================================
// 期刊文章导入 - 期重新排序
// ==========================================
// 规则: 清空自定义期排序 → 读取已发布的期 → 按 (卷, 期号) 降序稳定排序
//       → 依次写入 1..N → 第一个（最新）设为当前期
// ==========================================

use crate::importer::discovery::natural_cmp;
use crate::importer::error::ImportResult;
use crate::repository::publishing_store::PublishingStore;
use tracing::info;

/// 重新排序期刊的已发布期
///
/// # 返回
/// - Ok(Some(id)): 新的当前期
/// - Ok(None): 期刊没有已发布的期
pub fn resequence_issues(store: &dyn PublishingStore, context_id: i64) -> ImportResult<Option<i64>> {
    store.delete_custom_issue_orders(context_id)?;

    let mut issues = store.list_published_issues(context_id)?;
    issues.sort_by(|a, b| {
        natural_cmp(&b.volume, &a.volume).then_with(|| natural_cmp(&b.number, &a.number))
    });

    for (index, issue) in issues.iter().enumerate() {
        store.insert_custom_issue_order(context_id, issue.id, index as i64 + 1)?;
    }

    let current = issues.first().map(|issue| issue.id);
    if let Some(issue_id) = current {
        store.set_current_issue(context_id, issue_id)?;
    }
    info!(context_id, issues = issues.len(), current_issue_id = ?current, "期排序已更新");
    Ok(current)
}
