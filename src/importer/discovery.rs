// ==========================================
// 期刊文章导入 - 条目发现
// ==========================================
// 目录约定: <根>/<卷目录>/<期目录>/<文章目录>/<文件>
// 规则: 仅收集第 4 层的文件，更深的目录忽略
//       三级目录名各取第一段数字；无数字的目录记为结构错误（按条目失败处理）
//       不同目录解析出相同编号（如 01/ 与 1/）时，后出现的目录记为结构错误
// 排序: 按 "卷-期-文章" 自然排序
// ==========================================

use crate::importer::entry::ArticleEntry;
use crate::importer::error::{ImportError, ImportResult};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// 文件相对导入根的深度
const FILE_DEPTH: usize = 4;

/// 结构不合法的文章目录
#[derive(Debug)]
pub struct RejectedFolder {
    pub folder: String,
    pub error: ImportError,
}

/// 发现结果
#[derive(Debug, Default)]
pub struct DiscoveredEntries {
    /// 按自然顺序排列的条目
    pub entries: Vec<ArticleEntry>,
    /// 无法解析编号的目录（每个目录一条）
    pub rejected: Vec<RejectedFolder>,
}

impl DiscoveredEntries {
    /// 发现的条目总数（含结构错误的目录）
    pub fn count(&self) -> usize {
        self.entries.len() + self.rejected.len()
    }
}

/// 遍历导入根目录，按 (卷, 期, 文章) 分组文件
///
/// # 返回
/// - Err: 根目录本身无法读取
pub fn discover_entries(root: &Path) -> ImportResult<DiscoveredEntries> {
    let digits = Regex::new(r"\d+").map_err(|e| ImportError::InternalError(e.to_string()))?;

    let mut grouped: BTreeMap<(u32, u32, u32), ArticleEntry> = BTreeMap::new();
    let mut folders: BTreeMap<(u32, u32, u32), PathBuf> = BTreeMap::new();
    let mut rejected: BTreeMap<String, ImportError> = BTreeMap::new();

    let walker = WalkDir::new(root)
        .min_depth(FILE_DEPTH)
        .max_depth(FILE_DEPTH)
        .sort_by_file_name();

    for item in walker {
        let item = match item {
            Ok(item) => item,
            Err(e) if e.depth() == 0 => return Err(ImportError::file_read(root, e)),
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                warn!(path = %path.display(), error = %e, "目录读取失败");
                rejected
                    .entry(path.display().to_string())
                    .or_insert_with(|| ImportError::file_read(&path, &e));
                continue;
            }
        };
        if !item.file_type().is_file() {
            continue;
        }

        let file = item.into_path();
        let folder = file.parent().map(Path::to_path_buf).unwrap_or_default();
        match folder_numbers(&digits, &file) {
            Ok(key) => {
                let existing = folders.entry(key).or_insert_with(|| folder.clone());
                if *existing != folder {
                    let error = ImportError::DuplicateEntryFolder {
                        folder: folder.display().to_string(),
                        existing: existing.display().to_string(),
                        label: format!("{}-{}-{}", key.0, key.1, key.2),
                    };
                    rejected.entry(folder.display().to_string()).or_insert(error);
                    continue;
                }
                grouped
                    .entry(key)
                    .or_insert_with(|| ArticleEntry::new(key.0, key.1, key.2))
                    .add_file(file);
            }
            Err(error) => {
                rejected.entry(folder.display().to_string()).or_insert(error);
            }
        }
    }

    let mut entries: Vec<ArticleEntry> = grouped.into_values().collect();
    entries.sort_by(|a, b| natural_cmp(&a.label(), &b.label()));

    debug!(
        entries = entries.len(),
        rejected = rejected.len(),
        root = %root.display(),
        "条目发现完成"
    );

    Ok(DiscoveredEntries {
        entries,
        rejected: rejected
            .into_iter()
            .map(|(folder, error)| RejectedFolder { folder, error })
            .collect(),
    })
}

/// 从文件的三级上级目录提取 (卷, 期, 文章)
fn folder_numbers(digits: &Regex, file: &Path) -> ImportResult<(u32, u32, u32)> {
    let article_dir = file.parent();
    let issue_dir = article_dir.and_then(Path::parent);
    let volume_dir = issue_dir.and_then(Path::parent);

    let article = folder_number(digits, file, article_dir)?;
    let issue = folder_number(digits, file, issue_dir)?;
    let volume = folder_number(digits, file, volume_dir)?;
    Ok((volume, issue, article))
}

fn folder_number(digits: &Regex, file: &Path, folder: Option<&Path>) -> ImportResult<u32> {
    let invalid = || {
        ImportError::InvalidFolderName(
            file.parent()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| file.display().to_string()),
        )
    };
    let name = folder
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .ok_or_else(invalid)?;
    let found = digits.find(name).ok_or_else(invalid)?;
    found.as_str().parse::<u32>().map_err(|_| invalid())
}

// ==========================================
// 自然排序
// ==========================================
// 连续数字按数值比较，其余字符逐个比较
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                let ordering = compare_digit_runs(&l_run, &r_run);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
        .then_with(|| a.len().cmp(&b.len()))
}
