// ==========================================
// 期刊文章导入 - 文章条目
// ==========================================
// 标识: (卷, 期, 文章) 三元组，来自三级目录名中的数字
// 文件: 文章目录下的全部文件；按文件名模式分类
//   - 提交文件 *.pdf          恰好 1 个
//   - 元数据   *.meta / *.xml 恰好 1 个
//   - HTML     *.html         0 或 1 个
//   - 封面     article_cover.xxx 0 或 1 个
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const SUBMISSION_PATTERN: &str = r"(?i)\.pdf$";
const METADATA_PATTERN: &str = r"(?i)\.(meta|xml)$";
const HTML_PATTERN: &str = r"(?i)\.html$";
const COVER_PATTERN: &str = r"(?i)^article_cover\.[a-z]{3}$";

/// 文件分类正则（进程内只编译一次）
struct FilePatterns {
    submission: Regex,
    metadata: Regex,
    html: Regex,
    cover: Regex,
}

static FILE_PATTERNS: OnceLock<FilePatterns> = OnceLock::new();

impl FilePatterns {
    fn get() -> ImportResult<&'static Self> {
        if let Some(patterns) = FILE_PATTERNS.get() {
            return Ok(patterns);
        }
        let compile =
            |pattern: &str| Regex::new(pattern).map_err(|e| ImportError::InternalError(e.to_string()));
        let patterns = Self {
            submission: compile(SUBMISSION_PATTERN)?,
            metadata: compile(METADATA_PATTERN)?,
            html: compile(HTML_PATTERN)?,
            cover: compile(COVER_PATTERN)?,
        };
        Ok(FILE_PATTERNS.get_or_init(|| patterns))
    }
}

#[derive(Debug, Clone)]
pub struct ArticleEntry {
    volume: u32,
    issue: u32,
    article: u32,
    files: Vec<PathBuf>,
}

impl ArticleEntry {
    pub fn new(volume: u32, issue: u32, article: u32) -> Self {
        Self {
            volume,
            issue,
            article,
            files: Vec::new(),
        }
    }

    pub fn add_file(&mut self, file: PathBuf) {
        self.files.push(file);
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn volume(&self) -> u32 {
        self.volume
    }

    pub fn issue(&self) -> u32 {
        self.issue
    }

    pub fn article(&self) -> u32 {
        self.article
    }

    /// 报告用标签 "卷-期-文章"
    pub fn label(&self) -> String {
        format!("{}-{}-{}", self.volume, self.issue, self.article)
    }

    /// 主稿 PDF（恰好一个）
    pub fn submission_file(&self) -> ImportResult<&Path> {
        self.exactly_one(&FilePatterns::get()?.submission, "submission")
    }

    /// 元数据文件（恰好一个）
    pub fn metadata_file(&self) -> ImportResult<&Path> {
        self.exactly_one(&FilePatterns::get()?.metadata, "metadata")
    }

    /// HTML 全文（可选，至多一个）
    pub fn html_file(&self) -> ImportResult<Option<&Path>> {
        self.at_most_one(&FilePatterns::get()?.html, "html")
    }

    /// 文章封面图（可选，至多一个）
    pub fn cover_file(&self) -> ImportResult<Option<&Path>> {
        self.at_most_one(&FilePatterns::get()?.cover, "cover")
    }

    /// 文章目录（主稿所在目录）
    pub fn submission_dir(&self) -> ImportResult<&Path> {
        let file = self.submission_file()?;
        file.parent()
            .ok_or_else(|| ImportError::InternalError(format!("文件没有上级目录: {}", file.display())))
    }

    /// 期目录（文章目录的上级）
    pub fn issue_dir(&self) -> ImportResult<&Path> {
        let dir = self.submission_dir()?;
        dir.parent()
            .ok_or_else(|| ImportError::InternalError(format!("目录没有上级目录: {}", dir.display())))
    }

    fn matching(&self, re: &Regex) -> Vec<&Path> {
        self.files
            .iter()
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .map_or(false, |name| re.is_match(name))
            })
            .map(PathBuf::as_path)
            .collect()
    }

    fn exactly_one(&self, re: &Regex, kind: &'static str) -> ImportResult<&Path> {
        let found = self.matching(re);
        match found.as_slice() {
            [single] => Ok(*single),
            _ => Err(self.count_error(kind, "1", found.len())),
        }
    }

    fn at_most_one(&self, re: &Regex, kind: &'static str) -> ImportResult<Option<&Path>> {
        let found = self.matching(re);
        match found.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(*single)),
            _ => Err(self.count_error(kind, "0..1", found.len())),
        }
    }

    fn count_error(&self, kind: &'static str, expected: &'static str, count: usize) -> ImportError {
        ImportError::UnexpectedFileCount {
            folder: self.label(),
            kind,
            expected,
            count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with(files: &[&str]) -> ArticleEntry {
        let mut entry = ArticleEntry::new(1, 2, 3);
        for file in files {
            entry.add_file(PathBuf::from(format!("/import/v1/i2/a3/{}", file)));
        }
        entry
    }

    #[test]
    fn test_single_files_resolved() {
        let entry = entry_with(&["article.PDF", "article.xml", "article_cover.png"]);
        assert!(entry.submission_file().unwrap().ends_with("article.PDF"));
        assert!(entry.metadata_file().unwrap().ends_with("article.xml"));
        assert!(entry.cover_file().unwrap().is_some());
        assert!(entry.html_file().unwrap().is_none());
        assert_eq!(entry.submission_dir().unwrap(), Path::new("/import/v1/i2/a3"));
        assert_eq!(entry.issue_dir().unwrap(), Path::new("/import/v1/i2"));
        assert_eq!(entry.label(), "1-2-3");
    }

    #[test]
    fn test_two_pdfs_is_count_error() {
        let entry = entry_with(&["a.pdf", "b.pdf", "a.xml"]);
        match entry.submission_file() {
            Err(ImportError::UnexpectedFileCount { kind, count, .. }) => {
                assert_eq!(kind, "submission");
                assert_eq!(count, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_metadata_is_count_error() {
        let entry = entry_with(&["a.pdf"]);
        assert!(matches!(
            entry.metadata_file(),
            Err(ImportError::UnexpectedFileCount { count: 0, .. })
        ));
        let meta = entry_with(&["a.pdf", "a.meta"]);
        assert!(meta.metadata_file().is_ok());
    }

    #[test]
    fn test_optional_html_cardinality() {
        assert!(entry_with(&["a.html"]).html_file().unwrap().is_some());
        assert!(entry_with(&["a.html", "b.HTML"]).html_file().is_err());
    }

    #[test]
    fn test_cover_pattern_requires_three_letter_extension() {
        assert!(entry_with(&["article_cover.jpeg"]).cover_file().unwrap().is_none());
        assert!(entry_with(&["ARTICLE_COVER.JPG"]).cover_file().unwrap().is_some());
        assert!(entry_with(&["cover.jpg"]).cover_file().unwrap().is_none());
    }

    #[test]
    fn test_file_patterns_compiled_once() {
        let first = FilePatterns::get().unwrap();
        let second = FilePatterns::get().unwrap();
        assert!(std::ptr::eq(first, second));
    }
}
