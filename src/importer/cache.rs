// ==========================================
// 期刊文章导入 - 运行期缓存
// ==========================================
// 作用域: 一次导入运行（由导入驱动持有，传给每次解析）
// 内容: 期 (期刊, 卷, 期号) / 栏目 (期刊, locale, 标题)
//       期内栏目排序 / 依附文件分类 (期刊, 扩展名)
// 约束: 回滚删除的实体必须从缓存移除
// ==========================================

use crate::domain::{Issue, Section};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct RunCache {
    issues: HashMap<(i64, String, String), Issue>,
    sections: HashMap<(i64, String, String), Section>,
    section_orders: HashMap<i64, Vec<i64>>,
    genres: HashMap<(i64, String), i64>,
}

impl RunCache {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== 期 =====

    pub fn issue(&self, context_id: i64, volume: &str, number: &str) -> Option<&Issue> {
        self.issues
            .get(&(context_id, volume.to_string(), number.to_string()))
    }

    pub fn remember_issue(&mut self, issue: &Issue) {
        self.issues.insert(
            (issue.context_id, issue.volume.clone(), issue.number.clone()),
            issue.clone(),
        );
    }

    /// 移除已删除的期（及其栏目排序记录）
    pub fn evict_issue(&mut self, issue_id: i64) {
        self.issues.retain(|_, issue| issue.id != issue_id);
        self.section_orders.remove(&issue_id);
        debug!(issue_id, "缓存移除期");
    }

    // ===== 栏目 =====

    pub fn section(&self, context_id: i64, locale: &str, title: &str) -> Option<&Section> {
        self.sections
            .get(&(context_id, locale.to_string(), title.to_string()))
    }

    pub fn remember_section(&mut self, context_id: i64, locale: &str, title: &str, section: &Section) {
        self.sections.insert(
            (context_id, locale.to_string(), title.to_string()),
            section.clone(),
        );
    }

    /// 移除已删除的栏目（含各期排序中的引用）
    pub fn evict_section(&mut self, section_id: i64) {
        self.sections.retain(|_, section| section.id != section_id);
        for sections in self.section_orders.values_mut() {
            sections.retain(|id| *id != section_id);
        }
        debug!(section_id, "缓存移除栏目");
    }

    // ===== 期内栏目排序 =====

    /// 记录栏目进入期的排序
    ///
    /// # 返回
    /// - Some(seq): 本次运行首次看到该 (期, 栏目)，seq = 该期已记录的栏目数
    /// - None: 已记录过
    pub fn include_section(&mut self, issue_id: i64, section_id: i64) -> Option<i64> {
        let sections = self.section_orders.entry(issue_id).or_default();
        if sections.contains(&section_id) {
            return None;
        }
        sections.push(section_id);
        Some(sections.len() as i64)
    }

    // ===== 文件分类 =====

    pub fn genre(&self, context_id: i64, extension: &str) -> Option<i64> {
        self.genres
            .get(&(context_id, extension.to_string()))
            .copied()
    }

    pub fn remember_genre(&mut self, context_id: i64, extension: &str, genre_id: i64) {
        self.genres
            .insert((context_id, extension.to_string()), genre_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LocalizedText;
    use chrono::NaiveDate;

    fn issue(id: i64, volume: &str, number: &str) -> Issue {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut issue = Issue::new_published(1, volume, number, date);
        issue.id = id;
        issue
    }

    #[test]
    fn test_issue_remember_and_evict() {
        let mut cache = RunCache::new();
        cache.remember_issue(&issue(7, "1", "2"));
        assert_eq!(cache.issue(1, "1", "2").map(|i| i.id), Some(7));
        assert!(cache.issue(2, "1", "2").is_none());

        assert_eq!(cache.include_section(7, 3), Some(1));
        cache.evict_issue(7);
        assert!(cache.issue(1, "1", "2").is_none());
        assert_eq!(cache.include_section(7, 3), Some(1));
    }

    #[test]
    fn test_section_order_sequence() {
        let mut cache = RunCache::new();
        assert_eq!(cache.include_section(1, 10), Some(1));
        assert_eq!(cache.include_section(1, 11), Some(2));
        assert_eq!(cache.include_section(1, 10), None);
        assert_eq!(cache.include_section(2, 10), Some(1));
    }

    #[test]
    fn test_section_evict_all_keys() {
        let mut cache = RunCache::new();
        let mut section = crate::domain::Section::new_with_titles(
            1,
            &[("fr_CA".to_string(), "Articles".to_string())],
        );
        section.id = 5;
        section.policy = LocalizedText::single("fr_CA", "policy");
        cache.remember_section(1, "fr_CA", "Articles", &section);
        cache.remember_section(1, "en_US", "Papers", &section);
        cache.include_section(9, 5);

        cache.evict_section(5);
        assert!(cache.section(1, "fr_CA", "Articles").is_none());
        assert!(cache.section(1, "en_US", "Papers").is_none());
        assert_eq!(cache.include_section(9, 6), Some(1));
    }
}
