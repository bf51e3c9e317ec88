// ==========================================
// 期刊文章导入 - 领域类型定义
// ==========================================
// 职责: 目标出版系统数据模型中的共享值类型
// 约束: 枚举与数据库存储值一一对应（to_db_str / from_db_str）
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// LocalizedText - 多语言文本
// ==========================================
// 用途: 标题/摘要/姓名等按 locale 存储的字段
// 存储: JSON 对象 {"en_US": "...", "fr_CA": "..."}
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<String, String>);

impl LocalizedText {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以单一 locale 构造
    pub fn single(locale: &str, value: impl Into<String>) -> Self {
        let mut text = Self::new();
        text.set(locale, value);
        text
    }

    /// 设置（覆盖）某个 locale 的值
    pub fn set(&mut self, locale: &str, value: impl Into<String>) {
        self.0.insert(locale.to_string(), value.into());
    }

    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0.get(locale).map(String::as_str)
    }

    /// 是否至少有一个非空值
    pub fn has_value(&self) -> bool {
        self.0.values().any(|v| !v.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn from_json(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }
}

// ==========================================
// 发布状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublicationStatus {
    Queued,
    Scheduled,
    Published,
}

impl PublicationStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PublicationStatus::Queued => "QUEUED",
            PublicationStatus::Scheduled => "SCHEDULED",
            PublicationStatus::Published => "PUBLISHED",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "PUBLISHED" => PublicationStatus::Published,
            "SCHEDULED" => PublicationStatus::Scheduled,
            _ => PublicationStatus::Queued,
        }
    }
}

// ==========================================
// 访问状态
// ==========================================
// 文章级: OPEN = 开放获取, ISSUE_DEFAULT = 跟随期的访问策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessStatus {
    IssueDefault,
    Open,
}

impl AccessStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AccessStatus::IssueDefault => "ISSUE_DEFAULT",
            AccessStatus::Open => "OPEN",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "OPEN" => AccessStatus::Open,
            _ => AccessStatus::IssueDefault,
        }
    }
}

// ==========================================
// 工作流阶段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowStage {
    Submission,
    Review,
    Editing,
    Production,
}

impl WorkflowStage {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WorkflowStage::Submission => "SUBMISSION",
            WorkflowStage::Review => "REVIEW",
            WorkflowStage::Editing => "EDITING",
            WorkflowStage::Production => "PRODUCTION",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "REVIEW" => WorkflowStage::Review,
            "EDITING" => WorkflowStage::Editing,
            "PRODUCTION" => WorkflowStage::Production,
            _ => WorkflowStage::Submission,
        }
    }
}

// ==========================================
// 角色
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Manager,
    Author,
}

impl Role {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Role::Manager => "MANAGER",
            Role::Author => "AUTHOR",
        }
    }
}

// ==========================================
// 文件阶段
// ==========================================
// PROOF: 校样（galley 文件）
// PRODUCTION_READY: 排版就绪（归档的元数据 XML）
// DEPENDENT: 依附文件（图片/多媒体资源）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStage {
    Proof,
    ProductionReady,
    Dependent,
}

impl FileStage {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            FileStage::Proof => "PROOF",
            FileStage::ProductionReady => "PRODUCTION_READY",
            FileStage::Dependent => "DEPENDENT",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "PROOF" => FileStage::Proof,
            "DEPENDENT" => FileStage::Dependent,
            _ => FileStage::ProductionReady,
        }
    }
}

// ==========================================
// 文件关联对象
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileAssoc {
    /// 关联到 galley
    Galley(i64),
    /// 依附于另一个提交文件
    SubmissionFile(i64),
}

impl FileAssoc {
    pub fn to_db_parts(&self) -> (&'static str, i64) {
        match self {
            FileAssoc::Galley(id) => ("GALLEY", *id),
            FileAssoc::SubmissionFile(id) => ("SUBMISSION_FILE", *id),
        }
    }

    pub fn from_db_parts(kind: &str, id: i64) -> Option<Self> {
        match kind {
            "GALLEY" => Some(FileAssoc::Galley(id)),
            "SUBMISSION_FILE" => Some(FileAssoc::SubmissionFile(id)),
            _ => None,
        }
    }
}

/// 文件类型分类（genre）键
pub mod genre_keys {
    pub const SUBMISSION: &str = "SUBMISSION";
    pub const DOCUMENT: &str = "DOCUMENT";
    pub const IMAGE: &str = "IMAGE";
    pub const MULTIMEDIA: &str = "MULTIMEDIA";
}
