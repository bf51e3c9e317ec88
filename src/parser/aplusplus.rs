// ==========================================
// 期刊文章导入 - A++ 方言解析器
// ==========================================
// 文档类型: Publisher "-//Springer-Verlag//DTD A++ V2.4//EN"
// 路径: 相对根元素 Publisher，文章位于 Journal/Volume/Issue/Article
// 卷/期号: 取自目录（条目编号），不读元数据
// 访问状态: 存在非 OpenAccess 的 ArticleGrant → 跟随期，否则开放
// ==========================================

use crate::domain::{AccessStatus, Issue, LocalizedText, Publication, Section, Submission};
use crate::importer::error::{ImportError, ImportResult};
use crate::parser::common::{title_case, xpath_literal, AuthorData, ParserSession};
use crate::parser::document::{DocTypeIdentity, Document, NodeId};
use crate::parser::locale::iso1_from_locale;
use crate::parser::{ArticleParser, Dialect};
use chrono::{Datelike, NaiveDateTime};
use std::collections::BTreeMap;
use tracing::debug;

const ARTICLE: &str = "Journal/Volume/Issue/Article";
const ARTICLE_INFO: &str = "Journal/Volume/Issue/Article/ArticleInfo";
const ARTICLE_HEADER: &str = "Journal/Volume/Issue/Article/ArticleHeader";
const ISSUE_HISTORY: &str = "Journal/Volume/Issue/IssueInfo/IssueHistory";

/// 日期节点子元素名
const DATE_PARTS: (&str, &str, &str) = ("Year", "Month", "Day");

/// 次语言栏目标题的 locale
const SECONDARY_SECTION_LOCALE: &str = "en_US";

const PDF_GALLEY_LABEL: &str = "PDF";

pub struct APlusPlusParser<'a> {
    session: ParserSession<'a>,
}

impl<'a> APlusPlusParser<'a> {
    pub fn new(session: ParserSession<'a>) -> Self {
        Self { session }
    }

    fn node_date(&self, expr: &str) -> ImportResult<Option<NaiveDateTime>> {
        let node = self.session.doc()?.select_first(expr, None)?;
        self.session.date_from_node(node, DATE_PARTS)
    }

    /// 文章在线日期（ArticleHistory/OnlineDate）
    fn article_online_date(&self) -> ImportResult<Option<NaiveDateTime>> {
        self.node_date(&format!("{}/ArticleHistory/OnlineDate", ARTICLE_INFO))
    }

    /// 出版日期: 文章在线日期，否则期的出版日期
    fn publication_date(&mut self) -> ImportResult<NaiveDateTime> {
        if let Some(date) = self.session.publication_date {
            return Ok(date);
        }
        let date = match self.article_online_date()? {
            Some(date) => date,
            None => self.get_issue()?.date_published,
        };
        self.session.publication_date = Some(date);
        Ok(date)
    }

    /// 新建期的出版日期: 期在线日期 → 封面日期 → 文章在线日期
    fn issue_date(&self) -> ImportResult<NaiveDateTime> {
        if let Some(date) = self.node_date(&format!("{}/OnlineDate", ISSUE_HISTORY))? {
            return Ok(date);
        }
        if let Some(date) = self.node_date(&format!("{}/CoverDate", ISSUE_HISTORY))? {
            return Ok(date);
        }
        self.article_online_date()?
            .ok_or(ImportError::MissingPublicationDate)
    }

    fn access_status(&self) -> ImportResult<AccessStatus> {
        let restricted = self.session.doc()?.select_number(
            &format!("count({}/ArticleGrants/*[@Grant!='OpenAccess'])", ARTICLE_INFO),
            None,
        )?;
        Ok(if restricted > 0.0 {
            AccessStatus::IssueDefault
        } else {
            AccessStatus::Open
        })
    }

    /// 同一路径下按 Language 属性收集的多语言文本
    fn localized_nodes(&self, expr: &str) -> ImportResult<Vec<(String, String)>> {
        let doc = self.session.doc()?;
        let mut values = Vec::new();
        for node in doc.select(expr, None)? {
            let locale = self.session.node_locale(node, "Language")?;
            values.push((locale, doc.select_text(".", Some(node))?));
        }
        Ok(values)
    }

    fn abstracts(&self) -> ImportResult<Vec<(String, String)>> {
        let doc = self.session.doc()?;
        let mut values = Vec::new();
        for abstract_node in doc.select(&format!("{}/Abstract", ARTICLE_HEADER), None)? {
            let transform = |doc: &Document, node: NodeId, content: String| -> String {
                match doc.name(node) {
                    "Heading" if doc.parent(node) == Some(abstract_node) => String::new(),
                    "Heading" => format!("<p><strong>{}</strong></p>", content),
                    "Emphasis" => format!("<em>{}</em>", content),
                    "Subscript" => format!("<sub>{}</sub>", content),
                    "Superscript" => format!("<sup>{}</sup>", content),
                    "Para" => format!("<p>{}</p>", content),
                    _ => content,
                }
            };
            let value = self.session.rich_text(abstract_node, &transform)?;
            if !value.is_empty() {
                let locale = self.session.node_locale(abstract_node, "Language")?;
                values.push((locale, value));
            }
        }
        Ok(values)
    }

    fn keywords(&self) -> ImportResult<Vec<(String, String)>> {
        let doc = self.session.doc()?;
        let mut keywords = Vec::new();
        for group in doc.select(&format!("{}/KeywordGroup", ARTICLE_HEADER), None)? {
            let locale = self.session.node_locale(group, "Language")?;
            for keyword in doc.select("Keyword", Some(group))? {
                keywords.push((locale.clone(), doc.select_text(".", Some(keyword))?));
            }
        }
        Ok(keywords)
    }

    // ===== 作者 =====

    fn author_data(&self, author_node: NodeId) -> ImportResult<AuthorData> {
        let doc = self.session.doc()?;
        let mut data = AuthorData::default();

        if let Some(name_node) = doc.select_first("AuthorName", Some(author_node))? {
            let given: Vec<String> = doc
                .select("GivenName", Some(name_node))?
                .into_iter()
                .map(|node| doc.select_text(".", Some(node)))
                .collect::<ImportResult<_>>()?;
            data.given_name = given.join(" ");

            let family: Vec<String> = [
                doc.select_text("Particle", Some(name_node))?,
                doc.select_text("FamilyName", Some(name_node))?,
            ]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect();
            data.family_name = family.join(" ");
        }

        let corresponding = self
            .session
            .attribute(author_node, "CorrespondingAffiliationID")?;
        let affiliation_id = if corresponding.is_empty() {
            self.session
                .attribute(author_node, "AffiliationIDS")?
                .split(' ')
                .next()
                .unwrap_or_default()
                .to_string()
        } else {
            corresponding
        };
        if !affiliation_id.is_empty() {
            data.affiliation = Some(doc.select_text(
                &format!(
                    "{}/AuthorGroup/Affiliation[@ID={}]/OrgName",
                    ARTICLE_HEADER,
                    xpath_literal(&affiliation_id)
                ),
                None,
            )?);
        }

        data.email = Some(doc.select_text("Contact/Email", Some(author_node))?);
        data.url = Some(doc.select_text("Contact/URL", Some(author_node))?);
        Ok(data)
    }

    /// 写入全部作者，返回主要联系人
    fn process_authors(&mut self, publication_id: i64) -> ImportResult<i64> {
        let nodes = self
            .session
            .doc()?
            .select(&format!("{}/AuthorGroup/Author", ARTICLE_HEADER), None)?;

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
}

impl<'a> ArticleParser for APlusPlusParser<'a> {
    fn dialect(&self) -> Dialect {
        Dialect::APlusPlus
    }

    fn doc_types(&self) -> Vec<DocTypeIdentity> {
        vec![DocTypeIdentity::new(
            "Publisher",
            "-//Springer-Verlag//DTD A++ V2.4//EN",
            "http://devel.springer.de/A++/V2.4/DTD/A++V2.4.dtd",
        )]
    }

    fn load_document(&mut self) -> ImportResult<()> {
        let accepted = self.doc_types();
        self.session.load_document(&accepted)
    }

    fn session(&self) -> &ParserSession<'_> {
        &self.session
    }

    fn get_public_ids(&mut self) -> ImportResult<BTreeMap<String, String>> {
        let mut ids = BTreeMap::new();
        let publisher_id = self.session.text(&format!("{}/@ID", ARTICLE), None)?;
        if !publisher_id.is_empty() {
            ids.insert("publisher-id".to_string(), publisher_id);
        }
        let doi = self.session.text(&format!("{}/ArticleDOI", ARTICLE_INFO), None)?;
        if !doi.is_empty() {
            ids.insert("doi".to_string(), doi);
        }
        Ok(ids)
    }

    fn get_issue(&mut self) -> ImportResult<Issue> {
        if let Some(issue) = &self.session.issue {
            return Ok(issue.clone());
        }
        let entry = self.session.entry;
        let volume = entry.volume().to_string();
        let number = entry.issue().to_string();

        if let Some(issue) = self.session.find_issue(&volume, &number)? {
            return Ok(issue);
        }
        let date = self.issue_date()?;
        self.session.create_issue(&volume, &number, date)
    }

    fn get_section(&mut self) -> ImportResult<Section> {
        if let Some(section) = &self.session.section {
            return Ok(section.clone());
        }

        let category = self
            .session
            .doc()?
            .select_first(&format!("{}/ArticleCategory", ARTICLE_INFO), None)?;
        let (name, locale) = match category {
            Some(node) => (
                title_case(&self.session.text(".", Some(node))?),
                self.session.node_locale(node, "Language")?,
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
        let date_submitted = match self.node_date(&format!(
            "{}/ArticleHistory/RegistrationDate",
            ARTICLE_INFO
        ))? {
            Some(date) => date,
            None => self.publication_date()?,
        };
        let locale = self.session.primary_locale().to_string();
        self.session
            .create_submission(section.id, &locale, date_submitted)
    }

    fn get_publication(&mut self) -> ImportResult<Publication> {
        let date_published = self.publication_date()?;
        let submission = self.get_submission()?;
        let issue = self.get_issue()?;
        let primary_locale = self.session.primary_locale().to_string();

        let mut publication =
            Publication::new_published(&submission, issue.id, date_published, self.access_status()?);

        // 页码: 起止都存在时才写入
        let first_page = self
            .session
            .text(&format!("{}/ArticleFirstPage", ARTICLE_INFO), None)?;
        let last_page = self
            .session
            .text(&format!("{}/ArticleLastPage", ARTICLE_INFO), None)?;
        if !first_page.is_empty() && !last_page.is_empty() {
            publication.pages = Some(format!("{}-{}", first_page, last_page));
        }

        // 标题: 第一个标题的语言即出版物语言
        let titles = self.localized_nodes(&format!("{}/ArticleTitle", ARTICLE_INFO))?;
        for (locale, title) in &titles {
            if !title.is_empty() {
                publication.title.set(locale, title.clone());
            }
        }
        if !publication.title.has_value() {
            return Err(ImportError::MissingTitle);
        }
        let publication_locale = titles
            .first()
            .map(|(locale, _)| locale.clone())
            .unwrap_or_else(|| primary_locale.clone());
        publication.language = iso1_from_locale(&publication_locale).map(str::to_string);
        publication.locale = Some(publication_locale);

        for (locale, subtitle) in self.localized_nodes(&format!("{}/ArticleSubTitle", ARTICLE_INFO))? {
            if !subtitle.is_empty() {
                publication.subtitle.set(&locale, subtitle);
            }
        }
        for (locale, value) in self.abstracts()? {
            publication.abstract_text.set(&locale, value);
        }

        publication.pub_ids = self.get_public_ids()?;

        let holder = self.session.text(
            &format!("{}/ArticleCopyright/CopyrightHolderName", ARTICLE_INFO),
            None,
        )?;
        if !holder.is_empty() {
            publication.copyright_holder = LocalizedText::single(&primary_locale, holder);
        }
        let copyright_year = self
            .session
            .text(&format!("{}/ArticleCopyright/CopyrightYear", ARTICLE_INFO), None)?;
        publication.copyright_year = Some(if copyright_year.is_empty() {
            date_published.year().to_string()
        } else {
            copyright_year
        });

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

        store.update_publication(&publication)?;
        debug!(
            publication_id = publication.id,
            submission_id = submission.id,
            "A++ 出版物已发布"
        );
        Ok(publication)
    }

    fn rollback(&mut self) {
        self.session.rollback();
    }
}
