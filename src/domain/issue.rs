// ==========================================
// 期刊文章导入 - 期/栏目领域模型
// ==========================================
// 唯一性: Issue = (context, volume, number)
//         Section = (context, locale, title)
// ==========================================

use crate::domain::types::{AccessStatus, LocalizedText};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Issue - 期
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: i64, // 0 = 尚未落库
    pub context_id: i64,
    pub volume: String,
    pub number: String,
    pub year: i32,
    pub published: bool,
    pub current: bool,
    pub date_published: NaiveDateTime,
    pub access_status: AccessStatus,
    pub show_volume: bool,
    pub show_number: bool,
    pub show_year: bool,
    pub show_title: bool,
    pub cover_image: LocalizedText, // locale → 公共文件名
}

impl Issue {
    /// 新建一个已发布、开放获取的期（未落库）
    pub fn new_published(
        context_id: i64,
        volume: impl Into<String>,
        number: impl Into<String>,
        date_published: NaiveDateTime,
    ) -> Self {
        use chrono::Datelike;
        Self {
            id: 0,
            context_id,
            volume: volume.into(),
            number: number.into(),
            year: date_published.year(),
            published: true,
            current: false,
            date_published,
            access_status: AccessStatus::Open,
            show_volume: true,
            show_number: true,
            show_year: true,
            show_title: false,
            cover_image: LocalizedText::new(),
        }
    }
}

// ==========================================
// Section - 栏目
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: i64,
    pub context_id: i64,
    pub title: LocalizedText,
    pub abbrev: LocalizedText,
    pub policy: LocalizedText,
    pub abstracts_not_required: bool,
    pub meta_indexed: bool,
    pub meta_reviewed: bool,
    pub editor_restricted: bool,
    pub hide_title: bool,
    pub hide_author: bool,
}

impl Section {
    /// 依据 (locale, title) 列表新建栏目，缩写取标题前 3 个字符大写
    pub fn new_with_titles(context_id: i64, titles: &[(String, String)]) -> Self {
        let mut title = LocalizedText::new();
        let mut abbrev = LocalizedText::new();
        for (locale, value) in titles {
            title.set(locale, value.clone());
            abbrev.set(locale, value.chars().take(3).collect::<String>().to_uppercase());
        }
        Self {
            id: 0,
            context_id,
            title,
            abbrev,
            policy: LocalizedText::new(),
            abstracts_not_required: true,
            meta_indexed: true,
            meta_reviewed: false,
            editor_restricted: true,
            hide_title: false,
            hide_author: false,
        }
    }
}
