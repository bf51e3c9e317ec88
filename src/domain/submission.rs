// ==========================================
// 期刊文章导入 - 提交/出版领域模型
// ==========================================
// 约束: Submission 先落库，再建 Publication，最后回写 current_publication_id
// 约束: Publication 落库前至少有一种语言的非空标题
// ==========================================

use crate::domain::types::{
    AccessStatus, FileAssoc, FileStage, LocalizedText, PublicationStatus, WorkflowStage,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// Submission - 提交
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub context_id: i64,
    pub section_id: i64,
    pub status: PublicationStatus,
    pub stage: WorkflowStage,
    pub locale: String,
    pub date_submitted: NaiveDateTime,
    pub current_publication_id: Option<i64>,
}

// ==========================================
// CoverImage - 出版物封面
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverImage {
    pub upload_name: String,
    pub stored_name: String,
    pub alt_text: String,
    pub date_uploaded: NaiveDateTime,
}

// ==========================================
// Publication - 出版物（提交的当前版本）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publication {
    pub id: i64,
    pub submission_id: i64,
    pub status: PublicationStatus,
    pub version: i32,
    pub seq: i64,
    pub access_status: AccessStatus,
    pub date_published: NaiveDateTime,
    pub section_id: i64,
    pub issue_id: i64,
    pub pages: Option<String>,
    pub title: LocalizedText,
    pub subtitle: LocalizedText,
    pub abstract_text: LocalizedText,
    pub locale: Option<String>,
    pub language: Option<String>,
    pub copyright_holder: LocalizedText,
    pub copyright_notice: LocalizedText,
    pub copyright_year: Option<String>,
    pub license_url: Option<String>,
    pub citations_raw: Option<String>,
    pub cover_image: BTreeMap<String, CoverImage>,
    pub pub_ids: BTreeMap<String, String>, // 类型（doi/publisher-id/...）→ 值
    pub primary_contact_id: Option<i64>,
}

impl Publication {
    /// 新建版本 1 的已发布出版物骨架
    pub fn new_published(
        submission: &Submission,
        issue_id: i64,
        date_published: NaiveDateTime,
        access_status: AccessStatus,
    ) -> Self {
        Self {
            id: 0,
            submission_id: submission.id,
            status: PublicationStatus::Published,
            version: 1,
            seq: submission.id,
            access_status,
            date_published,
            section_id: submission.section_id,
            issue_id,
            pages: None,
            title: LocalizedText::new(),
            subtitle: LocalizedText::new(),
            abstract_text: LocalizedText::new(),
            locale: None,
            language: None,
            copyright_holder: LocalizedText::new(),
            copyright_notice: LocalizedText::new(),
            copyright_year: None,
            license_url: None,
            citations_raw: None,
            cover_image: BTreeMap::new(),
            pub_ids: BTreeMap::new(),
            primary_contact_id: None,
        }
    }
}

// ==========================================
// Author - 作者
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub publication_id: i64,
    pub given_name: LocalizedText,
    pub family_name: LocalizedText,
    pub affiliation: LocalizedText,
    pub email: String,
    pub url: Option<String>,
    pub seq: i32,
    pub include_in_browse: bool,
    pub primary_contact: bool,
    pub user_group_id: Option<i64>,
}

// ==========================================
// Galley - 全文表现形式（PDF/HTML）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Galley {
    pub id: i64,
    pub publication_id: i64,
    pub name: LocalizedText,
    pub seq: i32,
    pub label: String,
    pub locale: String,
    pub submission_file_id: Option<i64>,
}

// ==========================================
// SubmissionFile - 提交文件
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionFile {
    pub id: i64,
    pub submission_id: i64,
    pub stored_path: String,     // 目标系统文件区内的相对路径
    pub genre_id: i64,
    pub file_stage: FileStage,
    pub uploader_user_id: i64,
    pub assoc: Option<FileAssoc>,
    pub name: LocalizedText,
    pub file_type: String,       // 扩展名或 MIME
    pub file_size: u64,
}
