// ==========================================
// 期刊文章导入 - 期刊/用户领域模型
// ==========================================
// 用途: 配置阶段从目标系统读取，导入期间只读
// ==========================================

use crate::domain::types::LocalizedText;
use serde::{Deserialize, Serialize};

// ==========================================
// Journal - 期刊（导入上下文）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journal {
    pub id: i64,
    pub path: String,             // URL 路径（CLI 第一个参数）
    pub name: LocalizedText,      // 期刊名称（默认作者的名字来源）
    pub primary_locale: String,   // 主语言，如 "en_US"
}

impl Journal {
    /// 读取期刊名称（优先指定 locale，其次主语言，最后任意值）
    pub fn display_name(&self, locale: &str) -> String {
        self.name
            .get(locale)
            .or_else(|| self.name.get(&self.primary_locale))
            .or_else(|| self.name.iter().map(|(_, v)| v).next())
            .unwrap_or(&self.path)
            .to_string()
    }
}

// ==========================================
// User - 用户（导入人 / 编辑）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

// ==========================================
// Genre - 提交文件分类
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub context_id: i64,
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallback() {
        let journal = Journal {
            id: 1,
            path: "demo".to_string(),
            name: LocalizedText::single("en_US", "Demo Journal"),
            primary_locale: "en_US".to_string(),
        };
        assert_eq!(journal.display_name("fr_CA"), "Demo Journal");

        let unnamed = Journal { name: LocalizedText::new(), ..journal };
        assert_eq!(unnamed.display_name("en_US"), "demo");
    }
}
