// ==========================================
// 期刊文章导入 - JATS 方言解析器
// ==========================================
// 文档类型: article（EDP Publishing JATS v1.0 / NLM Archiving 3.0）
// 路径: 相对根元素 article，元数据位于 front/article-meta
// 卷/期号: 优先读元数据 volume/issue，缺省取目录编号
// 访问状态: 始终开放
// 额外产出: 原始 XML 归档（含资源依附文件）、HTML galley、文章封面、参考文献
// ==========================================

use crate::domain::{
    genre_keys, AccessStatus, CoverImage, FileStage, Issue, LocalizedText, Publication, Section,
    Submission,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::parser::common::{
    start_of_day, title_case, xpath_literal, AuthorData, GalleyContent, ParserSession,
};
use crate::parser::document::{DocTypeIdentity, Document, NodeId, NodeKind};
use crate::parser::locale::iso1_from_locale;
use crate::parser::{ArticleParser, Dialect};
use chrono::{Datelike, Duration, NaiveDateTime};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

const META: &str = "front/article-meta";

const DATE_PARTS: (&str, &str, &str) = ("year", "month", "day");

/// 次语言栏目标题的语言标记
const SECONDARY_SECTION_LOCALE: &str = "en";

const PDF_GALLEY_LABEL: &str = "Fulltext PDF";
const HTML_GALLEY_LABEL: &str = "Fulltext HTML";
const COVER_ALT_TEXT: &str = "Publication image";

/// 电子版出版日期的 pub-type
const ONLINE_PUB_TYPES: [&str; 2] = ["given-online-pub", "epub"];

pub struct JatsParser<'a> {
    session: ParserSession<'a>,
}

impl<'a> JatsParser<'a> {
    pub fn new(session: ParserSession<'a>) -> Self {
        Self { session }
    }

    fn meta(path: &str) -> String {
        format!("{}/{}", META, path)
    }

    fn node_date(&self, expr: &str) -> ImportResult<Option<NaiveDateTime>> {
        let node = self.session.doc()?.select_first(expr, None)?;
        self.session.date_from_node(node, DATE_PARTS)
    }

    /// 出版日期: 第一个电子版 pub-date，否则最后一个 pub-date
    fn publication_date(&mut self) -> ImportResult<NaiveDateTime> {
        if let Some(date) = self.session.publication_date {
            return Ok(date);
        }
        let doc = self.session.doc()?;
        let mut chosen = None;
        for node in doc.select(&Self::meta("pub-date"), None)? {
            chosen = Some(node);
            let pub_type = self.session.attribute(node, "pub-type")?;
            let format = self.session.attribute(node, "publication-format")?;
            if ONLINE_PUB_TYPES.contains(&pub_type.as_str()) || format == "electronic" {
                break;
            }
        }
        let date = self
            .session
            .date_from_node(chosen, DATE_PARTS)?
            .ok_or(ImportError::MissingPublicationDate)?;
        self.session.publication_date = Some(date);
        Ok(date)
    }

    fn abstracts(&self) -> ImportResult<Vec<(String, String)>> {
        let transform = |doc: &Document, node: NodeId, content: String| -> String {
            let tag = match doc.name(node) {
                "title" => "strong",
                "italic" => "em",
                "sub" => "sub",
                "sup" => "sup",
                "p" => "p",
                _ => return content,
            };
            format!("<{tag}>{content}</{tag}>", tag = tag, content = content)
        };

        let doc = self.session.doc()?;
        let mut values = Vec::new();
        for node in doc.select(
            &format!("{}|{}", Self::meta("abstract"), Self::meta("trans-abstract")),
            None,
        )? {
            let value = self.session.rich_text(node, &transform)?;
            if !value.is_empty() {
                values.push((self.session.node_locale(node, "xml:lang")?, value));
            }
        }
        Ok(values)
    }

    /// 参考文献: 每条 ref 的文本一行（忽略纯空白文本节点）
    fn citations(&self) -> ImportResult<Option<String>> {
        let doc = self.session.doc()?;
        let document = doc.document();
        let mut citations = String::new();
        for reference in doc.select("/article/back/ref-list/ref", None)? {
            let text: String = document
                .descendants(reference)
                .into_iter()
                .filter_map(|node| match document.kind(node) {
                    NodeKind::Text(text) if !text.trim().is_empty() => Some(text.as_str()),
                    _ => None,
                })
                .collect();
            citations.push_str(&text);
            citations.push('\n');
        }
        Ok(if citations.is_empty() {
            None
        } else {
            Some(citations)
        })
    }

    fn keywords(&self) -> ImportResult<Vec<(String, String)>> {
        let doc = self.session.doc()?;
        let mut keywords = Vec::new();
        for group in doc.select(&Self::meta("kwd-group"), None)? {
            let locale = self.session.node_locale(group, "xml:lang")?;
            for keyword in doc.select("kwd", Some(group))? {
                keywords.push((locale.clone(), doc.select_text(".", Some(keyword))?));
            }
        }
        Ok(keywords)
    }

    /// 文章封面: article_cover.xxx 复制到公共文件区
    fn cover_image(&mut self, submission_id: i64) -> ImportResult<Option<CoverImage>> {
        let entry = self.session.entry;
        let cover = match entry.cover_file()? {
            Some(cover) => cover,
            None => return Ok(None),
        };
        let upload_name = cover
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        let extension = cover
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_lowercase();
        let target_name = format!(
            "cover_article_{}_{}.{}",
            submission_id,
            self.session.primary_locale(),
            extension
        );
        let stored_name = self.session.store_public_file(cover, &target_name)?;
        Ok(Some(CoverImage {
            upload_name,
            stored_name,
            alt_text: COVER_ALT_TEXT.to_string(),
            date_uploaded: self.session.config.today(),
        }))
    }

    // ===== 作者 =====

    fn author_data(&self, contrib: NodeId) -> ImportResult<AuthorData> {
        let doc = self.session.doc()?;
        let mut data = AuthorData::default();

        if let Some(name) = doc.select_first("name|string-name", Some(contrib))? {
            data.given_name = doc.select_text("given-names", Some(name))?;
            data.family_name = doc.select_text("surname", Some(name))?;
        }

        let mut affiliations = Vec::new();
        let mut email = String::new();
        for xref in doc.select("xref", Some(contrib))? {
            let rid = xpath_literal(&self.session.attribute(xref, "rid")?);
            match self.session.attribute(xref, "ref-type")?.as_str() {
                "aff" => {
                    let mut affiliation = doc.select_text(
                        &format!("../aff[@id={}]//institution", rid),
                        Some(contrib),
                    )?;
                    if affiliation.is_empty() {
                        affiliation = doc.select_text(
                            &Self::meta(&format!("aff[@id={}]//institution", rid)),
                            None,
                        )?;
                    }
                    if !affiliation.is_empty() {
                        affiliations.push(affiliation);
                    }
                }
                "corresp" => {
                    email = doc.select_text(
                        &Self::meta(&format!("author-notes/corresp[@id={}]//email", rid)),
                        None,
                    )?;
                }
                _ => {}
            }
        }
        if email.is_empty() {
            email = doc.select_text("email", Some(contrib))?;
        }

        data.affiliation = Some(affiliations.join("; "));
        data.email = Some(email);
        Ok(data)
    }

    fn process_authors(&mut self, publication_id: i64) -> ImportResult<i64> {
        let expr = format!(
            "{}|{}",
            Self::meta("contrib-group[@content-type='authors']/contrib"),
            Self::meta("contrib-group/contrib[@contrib-type='author']")
        );
        let nodes = self.session.doc()?.select(&expr, None)?;

        let mut first_author = None;
        for node in nodes {
            let data = self.author_data(node)?;
            let author = self.session.insert_author(publication_id, data)?;
            first_author.get_or_insert(author.id);
        }
        match first_author {
            Some(id) => Ok(id),
            None => Ok(self.session.create_default_author(publication_id)?.id),
        }
    }

    // ===== 文件 =====

    /// 归档元数据 XML，并登记文档引用的同目录资源
    fn insert_xml_file(&mut self) -> ImportResult<i64> {
        let entry = self.session.entry;
        let metadata = entry.metadata_file()?;
        let genre_id = self.session.genre_by_key(genre_keys::DOCUMENT)?;
        let editor_id = self.session.config.editor().id;
        let xml_file_id =
            self.session
                .store_plain_file(metadata, genre_id, FileStage::ProductionReady, editor_id)?;

        let metadata_dir = metadata.parent().unwrap_or_else(|| Path::new("."));
        let doc = self.session.doc()?;
        let mut assets = Vec::new();
        for node in doc.select("//asset|//graphic", None)? {
            let href = self.session.attribute(node, "xlink:href")?;
            if href.is_empty() {
                continue;
            }
            let path = metadata_dir.join(&href);
            if path.is_file() {
                assets.push(path);
            } else {
                debug!(asset = %href, "资源文件不存在，跳过");
            }
        }
        for asset in assets {
            self.session.create_dependent_file(xml_file_id, &asset)?;
        }
        Ok(xml_file_id)
    }

    /// HTML galley（seq = 2）: 图片路径改写，images/ 目录下文件作为依附文件
    fn insert_html_galley(&mut self, publication_id: i64) -> ImportResult<Option<i64>> {
        let html = match self.session.entry.html_file()? {
            Some(html) => html,
            None => return Ok(None),
        };
        let raw = std::fs::read(html).map_err(|e| ImportError::file_read(html, e))?;
        // 按字节改写，保留 HTML 原有编码
        let images_src = regex::bytes::Regex::new(r#"src="images/"#)
            .map_err(|e| ImportError::InternalError(e.to_string()))?;
        let content = images_src.replace_all(&raw, &b"src=\""[..]).into_owned();
        let file_name = html
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();

        let (galley_id, html_file_id) = self.session.insert_galley_with_file(
            publication_id,
            2,
            HTML_GALLEY_LABEL,
            &file_name,
            GalleyContent::Bytes(&content, "html"),
        )?;

        let images_dir = html
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("images");
        if images_dir.is_dir() {
            let walker = WalkDir::new(&images_dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name();
            for item in walker {
                let item = item.map_err(|e| ImportError::file_read(&images_dir, e))?;
                if item.file_type().is_dir() {
                    return Err(ImportError::UnexpectedDirectory(
                        item.path().display().to_string(),
                    ));
                }
                self.session
                    .create_dependent_file(html_file_id, item.path())?;
            }
        }
        Ok(Some(galley_id))
    }
}

impl<'a> ArticleParser for JatsParser<'a> {
    fn dialect(&self) -> Dialect {
        Dialect::Jats
    }

    fn doc_types(&self) -> Vec<DocTypeIdentity> {
        vec![
            DocTypeIdentity::new(
                "article",
                "-//EDP//DTD EDP Publishing JATS v1.0 20130606//EN",
                "JATS-edppublishing1.dtd",
            ),
            DocTypeIdentity::new(
                "article",
                "-//NLM//DTD Journal Archiving with OASIS Tables v3.0 20080202//EN",
                "http://dtd.nlm.nih.gov/archiving/3.0/archive-oasis-article3.dtd",
            ),
        ]
    }

    fn load_document(&mut self) -> ImportResult<()> {
        let accepted = self.doc_types();
        self.session.load_document(&accepted)
    }

    fn session(&self) -> &ParserSession<'_> {
        &self.session
    }

    fn get_public_ids(&mut self) -> ImportResult<BTreeMap<String, String>> {
        let doc = self.session.doc()?;
        let mut ids = BTreeMap::new();
        for node in doc.select(&Self::meta("article-id"), None)? {
            let value = doc.select_text(".", Some(node))?;
            if value.is_empty() {
                continue;
            }
            let pub_id_type = self.session.attribute(node, "pub-id-type")?.to_lowercase();
            ids.insert(pub_id_type, value);
        }
        Ok(ids)
    }

    fn get_issue(&mut self) -> ImportResult<Issue> {
        if let Some(issue) = &self.session.issue {
            return Ok(issue.clone());
        }
        let entry = self.session.entry;
        let mut volume = self.session.text(&Self::meta("volume"), None)?;
        if volume.is_empty() {
            volume = entry.volume().to_string();
        }
        let mut number = self.session.text(&Self::meta("issue"), None)?;
        if number.is_empty() {
            number = entry.issue().to_string();
        }

        if let Some(issue) = self.session.find_issue(&volume, &number)? {
            return Ok(issue);
        }
        let date = match self.node_date(&Self::meta("pub-date[@pub-type='collection']"))? {
            Some(date) => date,
            None => self.publication_date()?,
        };
        self.session.create_issue(&volume, &number, date)
    }

    fn get_section(&mut self) -> ImportResult<Section> {
        if let Some(section) = &self.session.section {
            return Ok(section.clone());
        }

        let subject_group = self
            .session
            .doc()?
            .select_first(&Self::meta("article-categories/subj-group"), None)?;
        let (name, locale) = match subject_group {
            Some(node) => (
                title_case(&self.session.text("subject", Some(node))?),
                self.session.node_locale(node, "xml:lang")?,
            ),
            None => (String::new(), self.session.primary_locale().to_string()),
        };
        let names = self
            .session
            .section_names(&name, &locale, SECONDARY_SECTION_LOCALE);

        let issue = self.get_issue()?;
        self.session.resolve_section(issue.id, &names)
    }

    fn get_submission(&mut self) -> ImportResult<Submission> {
        if let Some(submission) = &self.session.submission {
            return Ok(submission.clone());
        }
        let section = self.get_section()?;
        let raw_locale = self
            .session
            .text(&Self::meta("title-group/trans-title-group/@xml:lang"), None)?;
        let locale = self.session.locale(Some(raw_locale.as_str()));

        let date_submitted =
            match self.node_date(&Self::meta("history/date[@date-type='received']"))? {
                Some(date) => date,
                None => {
                    let next_day = self.publication_date()?.date() + Duration::days(1);
                    start_of_day(next_day)
                }
            };
        self.session
            .create_submission(section.id, &locale, date_submitted)
    }

    fn get_publication(&mut self) -> ImportResult<Publication> {
        let date_published = self.publication_date()?;
        let submission = self.get_submission()?;
        let issue = self.get_issue()?;
        let primary_locale = self.session.primary_locale().to_string();

        let mut publication =
            Publication::new_published(&submission, issue.id, date_published, AccessStatus::Open);

        // 页码: 起止任一存在即写入
        let first_page = self.session.text(&Self::meta("fpage"), None)?;
        let last_page = self.session.text(&Self::meta("lpage"), None)?;
        if !first_page.is_empty() || !last_page.is_empty() {
            publication.pages = Some(if last_page.is_empty() {
                first_page
            } else {
                format!("{}-{}", first_page, last_page)
            });
        }

        let doc = self.session.doc()?;
        if let Some(node) = doc.select_first(&Self::meta("title-group/article-title"), None)? {
            let title = doc.select_text(".", Some(node))?;
            if !title.is_empty() {
                publication
                    .title
                    .set(&self.session.node_locale(node, "xml:lang")?, title);
            }
        }
        if let Some(node) = doc.select_first(&Self::meta("title-group/subtitle"), None)? {
            let subtitle = doc.select_text(".", Some(node))?;
            if !subtitle.is_empty() {
                publication
                    .subtitle
                    .set(&self.session.node_locale(node, "xml:lang")?, subtitle);
            }
        }
        for group in doc.select(&Self::meta("title-group/trans-title-group"), None)? {
            let locale = self.session.node_locale(group, "xml:lang")?;
            let title = doc.select_text("trans-title", Some(group))?;
            if !title.is_empty() {
                publication.title.set(&locale, title);
            }
            let subtitle = doc.select_text("trans-subtitle", Some(group))?;
            if !subtitle.is_empty() {
                publication.subtitle.set(&locale, subtitle);
            }
        }
        if !publication.title.has_value() {
            return Err(ImportError::MissingTitle);
        }

        publication.language = iso1_from_locale(&submission.locale).map(str::to_string);
        publication.locale = Some(submission.locale.clone());

        for (locale, value) in self.abstracts()? {
            publication.abstract_text.set(&locale, value);
        }

        publication.pub_ids = self.get_public_ids()?;

        let holder = self
            .session
            .text(&Self::meta("permissions/copyright-holder"), None)?;
        if !holder.is_empty() {
            publication.copyright_holder = LocalizedText::single(&primary_locale, holder);
        }
        let notice = self
            .session
            .text(&Self::meta("permissions/copyright-statement"), None)?;
        if !notice.is_empty() {
            publication.copyright_notice = LocalizedText::single(&primary_locale, notice);
        }
        let copyright_year = self
            .session
            .text(&Self::meta("permissions/copyright-year"), None)?;
        publication.copyright_year = Some(if copyright_year.is_empty() {
            date_published.year().to_string()
        } else {
            copyright_year
        });
        let license_url = self
            .session
            .text(&Self::meta("permissions/license/@xlink:href"), None)?;
        if !license_url.is_empty() {
            publication.license_url = Some(license_url);
        }

        publication.citations_raw = self.citations()?;
        if let Some(cover) = self.cover_image(submission.id)? {
            publication.cover_image.insert(primary_locale.clone(), cover);
        }

        let store = self.session.store;
        publication.id = store.insert_publication(&publication)?;
        store.update_current_publication(submission.id, publication.id)?;
        if let Some(submission) = self.session.submission.as_mut() {
            submission.current_publication_id = Some(publication.id);
        }

        let keywords = self.keywords()?;
        self.session.save_keywords(publication.id, keywords)?;
        publication.primary_contact_id = Some(self.process_authors(publication.id)?);

        self.session
            .insert_pdf_galley(publication.id, PDF_GALLEY_LABEL)?;
        self.insert_xml_file()?;
        if self.insert_html_galley(publication.id)?.is_none() {
            debug!(submission_id = submission.id, "无 HTML 全文");
        }

        store.update_publication(&publication)?;
        if publication.pub_ids.is_empty() {
            warn!(
                publication_id = publication.id,
                "出版物没有公共标识符，重复导入时无法识别"
            );
        }
        debug!(
            publication_id = publication.id,
            submission_id = submission.id,
            "JATS 出版物已发布"
        );
        Ok(publication)
    }

    fn rollback(&mut self) {
        self.session.rollback();
    }
}
