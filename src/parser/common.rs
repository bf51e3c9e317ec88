// ==========================================
// 期刊文章导入 - 解析器公共部分
// ==========================================
// 职责: 两种方言共用的会话状态与辅助操作
//   - 文档加载与查询、语言区域、日期解析、摘要标记转换
//   - 期/栏目的查找或创建、提交创建与编辑指派
//   - 作者、关键词、PDF galley、依附文件、文件分类
//   - 回滚（只删除本次创建的提交/期/栏目）
// ==========================================

use crate::config::Configuration;
use crate::domain::{
    genre_keys, Author, FileAssoc, FileStage, Galley, Issue, LocalizedText, Section, Submission,
    SubmissionFile, WorkflowStage,
};
use crate::i18n;
use crate::importer::cache::RunCache;
use crate::importer::entry::ArticleEntry;
use crate::importer::error::{ImportError, ImportResult};
use crate::parser::document::{DocTypeIdentity, Document, DocumentContext, NodeId, NodeKind};
use crate::parser::locale::resolve_locale;
use crate::parser::{Dialect, ImportedArticle};
use crate::repository::publishing_store::PublishingStore;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

// ==========================================
// 纯函数
// ==========================================

/// 读取前导整数（无数字时为 0）
fn leading_int(raw: &str) -> i64 {
    let raw = raw.trim();
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|v| v * sign).unwrap_or(0)
}

/// 由年/月/日文本构造日期
///
/// # 规则
/// - 年为空 → None
/// - 年不超过当前年；月、日缺省为 1
/// - 两位数年份补全为当前世纪，若超过当前年则退一个世纪
/// - 非法日期（如 4 月 31 日、13 月）→ None
pub fn resolve_date(year: &str, month: &str, day: &str, today: NaiveDate) -> Option<NaiveDate> {
    if year.trim().is_empty() {
        return None;
    }
    let current_year = i64::from(today.year());
    let mut year = leading_int(year).min(current_year);
    let month = leading_int(month).max(1);
    let day = leading_int(day).max(1);

    if year < 100 {
        year += (current_year / 100) * 100;
        if year > current_year {
            year -= 100;
        }
    }

    NaiveDate::from_ymd_opt(
        i32::try_from(year).ok()?,
        u32::try_from(month).ok()?,
        u32::try_from(day).ok()?,
    )
}

/// 日期 → 当天零点
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

/// 文本节点转义（& < >）
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// 递归拼接节点文本；元素由 transform 决定如何包裹子内容
pub fn text_content<F>(doc: &Document, node: NodeId, transform: &F) -> String
where
    F: Fn(&Document, NodeId, String) -> String,
{
    match doc.kind(node) {
        NodeKind::Text(text) => escape_text(text),
        NodeKind::Attribute { .. } => String::new(),
        NodeKind::Document | NodeKind::Element(_) => {
            let content: String = doc
                .children(node)
                .iter()
                .map(|child| text_content(doc, *child, transform))
                .collect();
            if doc.is_element(node) {
                transform(doc, node, content)
            } else {
                content
            }
        }
    }
}

/// XPath 字符串字面量
pub fn xpath_literal(value: &str) -> String {
    if value.contains('\'') {
        format!("\"{}\"", value.replace('"', ""))
    } else {
        format!("'{}'", value)
    }
}

/// 每个单词首字母大写，其余小写
pub fn title_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            result.push(c);
        } else if at_word_start {
            result.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            result.extend(c.to_lowercase());
        }
    }
    result
}

/// 栏目名按第一个 "/" 拆成主语言标题与英文标题
pub fn split_section_name(name: &str) -> (String, Option<String>) {
    match name.split_once('/') {
        Some((first, second)) => (first.trim().to_string(), Some(second.trim().to_string())),
        None => (name.trim().to_string(), None),
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_lowercase()
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string()
}

/// 元数据中读出的作者信息
#[derive(Debug, Clone, Default)]
pub struct AuthorData {
    pub given_name: String,
    pub family_name: String,
    pub affiliation: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
}

// ==========================================
// ParserSession - 单次解析会话
// ==========================================
pub struct ParserSession<'a> {
    pub(super) store: &'a dyn PublishingStore,
    pub(super) config: &'a Configuration,
    pub(super) cache: &'a mut RunCache,
    pub(super) entry: &'a ArticleEntry,
    document: Option<DocumentContext>,
    pub(super) issue: Option<Issue>,
    issue_owner: bool,
    pub(super) section: Option<Section>,
    section_owner: bool,
    pub(super) submission: Option<Submission>,
    pub(super) publication_date: Option<NaiveDateTime>,
    author_count: i32,
    public_files: Vec<String>,
}

impl<'a> ParserSession<'a> {
    pub fn new(
        store: &'a dyn PublishingStore,
        config: &'a Configuration,
        cache: &'a mut RunCache,
        entry: &'a ArticleEntry,
    ) -> Self {
        Self {
            store,
            config,
            cache,
            entry,
            document: None,
            issue: None,
            issue_owner: false,
            section: None,
            section_owner: false,
            submission: None,
            publication_date: None,
            author_count: 0,
            public_files: Vec::new(),
        }
    }

    // ===== 文档 =====

    /// 读取元数据文件并校验文档类型
    pub fn load_document(&mut self, accepted: &[DocTypeIdentity]) -> ImportResult<()> {
        let path = self.entry.metadata_file()?;
        let document = DocumentContext::load(path)?;
        document.validate_doc_type(accepted)?;
        self.document = Some(document);
        Ok(())
    }

    pub fn doc(&self) -> ImportResult<&DocumentContext> {
        self.document
            .as_ref()
            .ok_or_else(|| ImportError::InternalError("元数据文档尚未加载".to_string()))
    }

    pub fn text(&self, expr: &str, context: Option<NodeId>) -> ImportResult<String> {
        self.doc()?.select_text(expr, context)
    }

    /// 节点属性值（不存在时为空串）
    pub fn attribute(&self, node: NodeId, name: &str) -> ImportResult<String> {
        Ok(self
            .doc()?
            .document()
            .attribute(node, name)
            .unwrap_or_default()
            .to_string())
    }

    /// 节点下 year/month/day 子元素构成的日期
    pub fn date_from_node(
        &self,
        node: Option<NodeId>,
        names: (&str, &str, &str),
    ) -> ImportResult<Option<NaiveDateTime>> {
        let node = match node {
            Some(node) => node,
            None => return Ok(None),
        };
        let year = self.text(names.0, Some(node))?;
        let month = self.text(names.1, Some(node))?;
        let day = self.text(names.2, Some(node))?;
        Ok(resolve_date(&year, &month, &day, self.config.today().date()).map(start_of_day))
    }

    /// 摘要类富文本：按 transform 转换已知标签，其余标签只保留文本
    pub fn rich_text<F>(&self, node: NodeId, transform: &F) -> ImportResult<String>
    where
        F: Fn(&Document, NodeId, String) -> String,
    {
        Ok(text_content(self.doc()?.document(), node, transform)
            .trim()
            .to_string())
    }

    // ===== 上下文 =====

    pub fn context_id(&self) -> i64 {
        self.config.context_id()
    }

    pub fn primary_locale(&self) -> &str {
        &self.config.journal().primary_locale
    }

    pub fn locale(&self, raw: Option<&str>) -> String {
        resolve_locale(raw, self.primary_locale())
    }

    /// 由节点的语言属性解析 locale
    pub fn node_locale(&self, node: NodeId, attribute: &str) -> ImportResult<String> {
        let raw = self.attribute(node, attribute)?;
        Ok(self.locale(Some(raw.as_str())))
    }

    /// 重复检查：期刊内已有相同公共标识符的提交则跳过
    pub fn ensure_not_exists(&self, ids: &BTreeMap<String, String>) -> ImportResult<()> {
        for (pub_id_type, value) in ids {
            if self
                .store
                .submission_exists_by_pub_id(self.context_id(), pub_id_type, value)?
            {
                return Err(ImportError::AlreadyExists {
                    pub_id_type: pub_id_type.clone(),
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    // ===== 期 =====

    /// 先查运行期缓存，再查存储
    pub fn find_issue(&mut self, volume: &str, number: &str) -> ImportResult<Option<Issue>> {
        let context_id = self.context_id();
        if let Some(issue) = self.cache.issue(context_id, volume, number) {
            debug!(issue_id = issue.id, volume, number, "期命中缓存");
            let issue = issue.clone();
            self.issue = Some(issue.clone());
            return Ok(Some(issue));
        }
        if let Some(issue) = self.store.find_issue(context_id, volume, number)? {
            debug!(issue_id = issue.id, volume, number, "复用已有期");
            self.cache.remember_issue(&issue);
            self.issue = Some(issue.clone());
            return Ok(Some(issue));
        }
        Ok(None)
    }

    /// 新建期（本次解析成为所有者），并应用期目录下的封面
    pub fn create_issue(
        &mut self,
        volume: &str,
        number: &str,
        date_published: NaiveDateTime,
    ) -> ImportResult<Issue> {
        let mut issue = Issue::new_published(self.context_id(), volume, number, date_published);
        issue.id = self.store.insert_issue(&issue)?;
        self.issue = Some(issue.clone());
        self.issue_owner = true;
        debug!(issue_id = issue.id, volume, number, "新建期");

        self.apply_issue_cover(&mut issue)?;
        self.cache.remember_issue(&issue);
        self.issue = Some(issue.clone());
        Ok(issue)
    }

    /// 期封面：期目录下的 {basename}.{ext}，按扩展名顺序取第一个存在的文件
    fn apply_issue_cover(&mut self, issue: &mut Issue) -> ImportResult<()> {
        let issue_dir = self.entry.issue_dir()?;
        let cover = self
            .config
            .image_extensions()
            .iter()
            .map(|ext| issue_dir.join(format!("{}.{}", self.config.issue_cover_basename(), ext)))
            .find(|candidate| candidate.is_file());
        let cover = match cover {
            Some(cover) => cover,
            None => return Ok(()),
        };

        let locale = self.primary_locale().to_string();
        let target_name = format!(
            "cover_issue_{}_{}.{}",
            issue.id,
            locale,
            extension_of(&cover)
        );
        let stored = self.store_public_file(&cover, &target_name)?;
        issue.cover_image.set(&locale, stored);
        self.store.update_issue_cover(issue.id, &issue.cover_image)?;
        debug!(issue_id = issue.id, cover = %cover.display(), "期封面已设置");
        Ok(())
    }

    /// 复制文件到公共文件区，并记录以便回滚时删除
    pub fn store_public_file(&mut self, source: &Path, target_name: &str) -> ImportResult<String> {
        let stored = self
            .store
            .store_public_file(self.context_id(), source, target_name)?;
        self.public_files.push(stored.clone());
        Ok(stored)
    }

    // ===== 栏目 =====

    /// 栏目 (locale, 标题) 列表
    ///
    /// # 参数
    /// - name: 元数据中的栏目名（空则使用默认栏目名）
    /// - locale: 栏目名的语言
    /// - secondary_locale: "/" 之后标题的语言标记
    pub fn section_names(
        &self,
        name: &str,
        locale: &str,
        secondary_locale: &str,
    ) -> Vec<(String, String)> {
        let name = if name.trim().is_empty() {
            self.config.default_section_name()
        } else {
            name
        };
        let (primary, secondary) = split_section_name(name);
        let mut names = vec![(locale.to_string(), primary)];
        if let Some(secondary) = secondary {
            let secondary_locale = self.locale(Some(secondary_locale));
            match names.iter_mut().find(|(l, _)| *l == secondary_locale) {
                Some(existing) => existing.1 = secondary,
                None => names.push((secondary_locale, secondary)),
            }
        }
        names
    }

    /// 栏目查找或创建：缓存 → 存储 → 新建；随后加入期的栏目排序
    pub fn resolve_section(
        &mut self,
        issue_id: i64,
        names: &[(String, String)],
    ) -> ImportResult<Section> {
        let context_id = self.context_id();

        let mut section = names
            .iter()
            .find_map(|(locale, title)| self.cache.section(context_id, locale, title).cloned());
        if section.is_some() {
            debug!(?names, "栏目命中缓存");
        }

        if section.is_none() {
            for (locale, title) in names {
                if let Some(found) = self.store.find_section_by_title(context_id, title, locale)? {
                    debug!(section_id = found.id, title = %title, "复用已有栏目");
                    section = Some(found);
                    break;
                }
            }
        }

        let section = match section {
            Some(section) => section,
            None => {
                let mut created = Section::new_with_titles(context_id, names);
                created.policy = LocalizedText::single(
                    self.primary_locale(),
                    i18n::section_policy(),
                );
                created.id = self.store.insert_section(&created)?;
                self.section_owner = true;
                debug!(section_id = created.id, ?names, "新建栏目");
                created
            }
        };
        self.section = Some(section.clone());

        self.include_section(issue_id, section.id)?;
        for (locale, title) in names {
            self.cache.remember_section(context_id, locale, title, &section);
        }
        Ok(section)
    }

    /// 栏目加入期的自定义排序（本次运行首次遇到且存储中尚无记录时）
    fn include_section(&mut self, issue_id: i64, section_id: i64) -> ImportResult<()> {
        if let Some(seq) = self.cache.include_section(issue_id, section_id) {
            if !self.store.has_custom_section_order(issue_id, section_id)? {
                self.store
                    .insert_custom_section_order(issue_id, section_id, seq)?;
            }
        }
        Ok(())
    }

    // ===== 提交 =====

    /// 创建已发布的提交，并把编辑指派到出版阶段
    pub fn create_submission(
        &mut self,
        section_id: i64,
        locale: &str,
        date_submitted: NaiveDateTime,
    ) -> ImportResult<Submission> {
        let mut submission = Submission {
            id: 0,
            context_id: self.context_id(),
            section_id,
            status: crate::domain::PublicationStatus::Published,
            stage: WorkflowStage::Production,
            locale: locale.to_string(),
            date_submitted,
            current_publication_id: None,
        };
        submission.id = self.store.insert_submission(&submission)?;
        self.submission = Some(submission.clone());

        self.store.assign_stage(
            submission.id,
            self.config.editor_group_id(),
            self.config.editor().id,
            WorkflowStage::Production,
        )?;
        debug!(submission_id = submission.id, "新建提交");
        Ok(submission)
    }

    // ===== 作者 =====

    /// 姓名兜底：只有姓时作为名；都没有时使用期刊名称
    pub fn normalize_author_name(&self, given: &str, family: &str) -> (String, String) {
        let given = given.trim();
        let family = family.trim();
        if given.is_empty() && !family.is_empty() {
            (family.to_string(), String::new())
        } else if given.is_empty() {
            (
                self.config.journal().display_name(self.primary_locale()),
                String::new(),
            )
        } else {
            (given.to_string(), family.to_string())
        }
    }

    /// 写入一位作者；第一位为主要联系人
    pub fn insert_author(&mut self, publication_id: i64, data: AuthorData) -> ImportResult<Author> {
        let locale = self.primary_locale().to_string();
        let (given, family) = self.normalize_author_name(&data.given_name, &data.family_name);

        let mut author = Author {
            id: 0,
            publication_id,
            given_name: LocalizedText::single(&locale, given),
            family_name: if family.is_empty() {
                LocalizedText::new()
            } else {
                LocalizedText::single(&locale, family)
            },
            affiliation: data
                .affiliation
                .filter(|a| !a.is_empty())
                .map(|a| LocalizedText::single(&locale, a))
                .unwrap_or_default(),
            email: data
                .email
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| self.config.default_email().to_string()),
            url: data.url.filter(|u| !u.is_empty()),
            seq: self.author_count + 1,
            include_in_browse: true,
            primary_contact: self.author_count == 0,
            user_group_id: self.config.author_group_id(),
        };
        author.id = self.store.insert_author(&author)?;
        self.author_count += 1;
        Ok(author)
    }

    /// 元数据中没有作者时，以期刊名称生成默认作者
    pub fn create_default_author(&mut self, publication_id: i64) -> ImportResult<Author> {
        debug!(publication_id, "无作者，生成默认作者");
        self.insert_author(publication_id, AuthorData::default())
    }

    // ===== 关键词 =====

    /// 按 locale 合并后写入关键词
    pub fn save_keywords(
        &self,
        publication_id: i64,
        keywords: Vec<(String, String)>,
    ) -> ImportResult<()> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (locale, keyword) in keywords {
            if !keyword.is_empty() {
                grouped.entry(locale).or_default().push(keyword);
            }
        }
        for (locale, words) in &grouped {
            self.store.replace_keywords(publication_id, locale, words)?;
        }
        Ok(())
    }

    // ===== Galley 与文件 =====

    /// 新建 galley 并登记其文件
    ///
    /// # 返回
    /// - (galley_id, submission_file_id)
    pub fn insert_galley_with_file(
        &mut self,
        publication_id: i64,
        seq: i32,
        label: &str,
        file_name: &str,
        content: GalleyContent<'_>,
    ) -> ImportResult<(i64, i64)> {
        let submission_id = self.current_submission_id()?;
        let locale = self.primary_locale().to_string();

        let galley = Galley {
            id: 0,
            publication_id,
            name: LocalizedText::single(&locale, file_name),
            seq,
            label: label.to_string(),
            locale: locale.clone(),
            submission_file_id: None,
        };
        let galley_id = self.store.insert_galley(&galley)?;

        let file = SubmissionFile {
            id: 0,
            submission_id,
            stored_path: String::new(),
            genre_id: self.config.submission_genre().id,
            file_stage: FileStage::Proof,
            uploader_user_id: self.config.editor().id,
            assoc: Some(FileAssoc::Galley(galley_id)),
            name: LocalizedText::single(&locale, file_name),
            file_type: String::new(),
            file_size: 0,
        };
        let file_id = match content {
            GalleyContent::Path(source) => {
                let file = SubmissionFile {
                    file_type: extension_of(source),
                    ..file
                };
                self.store.store_submission_file(source, &file)?
            }
            GalleyContent::Bytes(bytes, extension) => {
                let file = SubmissionFile {
                    file_type: extension.to_string(),
                    ..file
                };
                self.store
                    .store_submission_file_content(bytes, extension, &file)?
            }
        };
        self.store.update_galley_file(galley_id, file_id)?;
        Ok((galley_id, file_id))
    }

    /// 主稿 PDF galley（seq = 1）
    pub fn insert_pdf_galley(&mut self, publication_id: i64, label: &str) -> ImportResult<i64> {
        let pdf = self.entry.submission_file()?;
        let (galley_id, _) = self.insert_galley_with_file(
            publication_id,
            1,
            label,
            &file_name_of(pdf),
            GalleyContent::Path(pdf),
        )?;
        Ok(galley_id)
    }

    /// 登记一个不挂 galley 的提交文件（例如归档的元数据 XML）
    pub fn store_plain_file(
        &mut self,
        source: &Path,
        genre_id: i64,
        stage: FileStage,
        uploader_user_id: i64,
    ) -> ImportResult<i64> {
        let file = SubmissionFile {
            id: 0,
            submission_id: self.current_submission_id()?,
            stored_path: String::new(),
            genre_id,
            file_stage: stage,
            uploader_user_id,
            assoc: None,
            name: LocalizedText::single(self.primary_locale(), file_name_of(source)),
            file_type: extension_of(source),
            file_size: 0,
        };
        Ok(self.store.store_submission_file(source, &file)?)
    }

    /// 依附文件（图片/多媒体），挂在父提交文件下
    pub fn create_dependent_file(&mut self, parent_file_id: i64, source: &Path) -> ImportResult<i64> {
        let extension = extension_of(source);
        let genre_id = self.genre_id(&extension)?;
        let file = SubmissionFile {
            id: 0,
            submission_id: self.current_submission_id()?,
            stored_path: String::new(),
            genre_id,
            file_stage: FileStage::Dependent,
            uploader_user_id: self.config.importer().id,
            assoc: Some(FileAssoc::SubmissionFile(parent_file_id)),
            name: LocalizedText::single(self.primary_locale(), file_name_of(source)),
            file_type: extension,
            file_size: 0,
        };
        Ok(self.store.store_submission_file(source, &file)?)
    }

    /// 依附文件分类：图片扩展名为 IMAGE，其余为 MULTIMEDIA
    pub fn genre_id(&mut self, extension: &str) -> ImportResult<i64> {
        let context_id = self.context_id();
        let extension = extension.to_lowercase();
        if let Some(id) = self.cache.genre(context_id, &extension) {
            return Ok(id);
        }
        let key = if self.config.is_image_extension(&extension) {
            genre_keys::IMAGE
        } else {
            genre_keys::MULTIMEDIA
        };
        let genre = self
            .store
            .find_genre_by_key(context_id, key)?
            .ok_or_else(|| ImportError::MissingGenre(key.to_string()))?;
        self.cache.remember_genre(context_id, &extension, genre.id);
        Ok(genre.id)
    }

    /// 按类型取 genre（不存在时报错）
    pub fn genre_by_key(&self, key: &str) -> ImportResult<i64> {
        self.store
            .find_genre_by_key(self.context_id(), key)?
            .map(|genre| genre.id)
            .ok_or_else(|| ImportError::MissingGenre(key.to_string()))
    }

    fn current_submission_id(&self) -> ImportResult<i64> {
        self.submission
            .as_ref()
            .map(|s| s.id)
            .ok_or_else(|| ImportError::InternalError("提交尚未创建".to_string()))
    }

    // ===== 结果与回滚 =====

    pub fn imported(&self, dialect: Dialect, publication_id: i64) -> ImportResult<ImportedArticle> {
        Ok(ImportedArticle {
            dialect,
            submission_id: self.current_submission_id()?,
            publication_id,
            issue_id: self.issue.as_ref().map(|i| i.id).unwrap_or_default(),
            section_id: self.section.as_ref().map(|s| s.id).unwrap_or_default(),
        })
    }

    /// 删除本次创建的实体：提交 → 期 → 栏目 → 公共文件；失败只记录日志
    pub fn rollback(&mut self) {
        if let Some(submission) = self.submission.take() {
            match self.store.delete_submission(submission.id) {
                Ok(()) => debug!(submission_id = submission.id, "回滚: 已删除提交"),
                Err(e) => warn!(submission_id = submission.id, error = %e, "回滚: 删除提交失败"),
            }
        }

        if self.issue_owner {
            if let Some(issue) = self.issue.take() {
                self.cache.evict_issue(issue.id);
                match self.store.delete_issue(issue.id) {
                    Ok(()) => debug!(issue_id = issue.id, "回滚: 已删除期"),
                    Err(e) => warn!(issue_id = issue.id, error = %e, "回滚: 删除期失败"),
                }
            }
            self.issue_owner = false;
        }

        if self.section_owner {
            if let Some(section) = self.section.take() {
                self.cache.evict_section(section.id);
                match self.store.delete_section(section.id) {
                    Ok(()) => debug!(section_id = section.id, "回滚: 已删除栏目"),
                    Err(e) => warn!(section_id = section.id, error = %e, "回滚: 删除栏目失败"),
                }
            }
            self.section_owner = false;
        }

        let context_id = self.context_id();
        for name in self.public_files.drain(..) {
            match self.store.delete_public_file(context_id, &name) {
                Ok(()) => debug!(file = %name, "回滚: 已删除公共文件"),
                Err(e) => warn!(file = %name, error = %e, "回滚: 删除公共文件失败"),
            }
        }
    }
}

/// galley 文件内容来源
pub enum GalleyContent<'p> {
    /// 直接复制源文件
    Path(&'p Path),
    /// 改写后的内容 + 扩展名
    Bytes(&'p [u8], &'p str),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[test]
    fn test_resolve_date_defaults_and_clamp() {
        assert_eq!(
            resolve_date("2019", "", "", today()),
            NaiveDate::from_ymd_opt(2019, 1, 1)
        );
        assert_eq!(
            resolve_date("2030", "02", "03", today()),
            NaiveDate::from_ymd_opt(2025, 2, 3)
        );
        assert_eq!(resolve_date("", "1", "1", today()), None);
    }

    #[test]
    fn test_resolve_two_digit_year() {
        assert_eq!(
            resolve_date("99", "", "", today()),
            NaiveDate::from_ymd_opt(1999, 1, 1)
        );
        assert_eq!(
            resolve_date("07", "5", "", today()),
            NaiveDate::from_ymd_opt(2007, 5, 1)
        );
    }

    #[test]
    fn test_resolve_invalid_date() {
        assert_eq!(resolve_date("2020", "13", "1", today()), None);
        assert_eq!(resolve_date("2020", "4", "31", today()), None);
        assert_eq!(resolve_date("2020", "0", "0", today()), NaiveDate::from_ymd_opt(2020, 1, 1));
    }

    #[test]
    fn test_text_content_transform() {
        let xml = "<Abstract><Heading>Abstract</Heading><Para>A &amp; <Emphasis>b</Emphasis><Unknown>c</Unknown></Para></Abstract>";
        let doc = Document::parse(xml, "test.xml").unwrap();
        let root = doc.root_element().unwrap();
        let html = text_content(&doc, root, &|doc: &Document, node: NodeId, content: String| {
            match doc.name(node) {
                "Heading" if doc.parent(node) == Some(root) => String::new(),
                "Para" => format!("<p>{}</p>", content),
                "Emphasis" => format!("<em>{}</em>", content),
                _ => content,
            }
        });
        assert_eq!(html, "<p>A &amp; <em>b</em>c</p>");
    }

    #[test]
    fn test_title_case_and_split() {
        assert_eq!(title_case("ORIGINAL ARTICLE / research"), "Original Article / Research");
        assert_eq!(
            split_section_name("Artigos Originais / Original Articles"),
            ("Artigos Originais".to_string(), Some("Original Articles".to_string()))
        );
        assert_eq!(split_section_name("Editorial"), ("Editorial".to_string(), None));
    }

    #[test]
    fn test_xpath_literal_quotes() {
        assert_eq!(xpath_literal("aff1"), "'aff1'");
        assert_eq!(xpath_literal("o'brien"), "\"o'brien\"");
    }
}
