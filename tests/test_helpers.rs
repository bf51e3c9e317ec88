// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时出版系统（期刊/用户/用户组/文件分类）、导入目录与 XML 样例
// ==========================================
#![allow(dead_code)]

use article_importer::config::{Configuration, ConfigurationArgs};
use article_importer::domain::{genre_keys, LocalizedText, Role, WorkflowStage};
use article_importer::importer::{ImportDriver, ImportSummary};
use article_importer::repository::SqlitePublishingStore;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const JOURNAL_PATH: &str = "demo";
pub const JOURNAL_NAME: &str = "Demo Journal";
pub const DEFAULT_EMAIL: &str = "imports@example.org";

/// 测试环境（TempDir 需要保持存活）
pub struct TestEnv {
    pub dir: TempDir,
    pub store: SqlitePublishingStore,
    pub journal_id: i64,
    pub importer_id: i64,
    pub editor_id: i64,
    pub editor_group_id: i64,
    pub author_group_id: i64,
}

/// 创建带完整基础数据的出版系统
pub fn setup() -> TestEnv {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("publishing.db");
    let store =
        SqlitePublishingStore::new(db_path.to_str().unwrap(), dir.path().join("files")).unwrap();
    store.init_schema().unwrap();

    let journal_id = store
        .create_journal(
            JOURNAL_PATH,
            &LocalizedText::single("en_US", JOURNAL_NAME),
            "en_US",
        )
        .unwrap();
    let importer_id = store.create_user("importer", "importer@example.org").unwrap();
    let editor_id = store.create_user("editor", "editor@example.org").unwrap();
    let editor_group_id = store
        .create_user_group(
            journal_id,
            Role::Manager,
            "Journal manager",
            &[WorkflowStage::Production],
        )
        .unwrap();
    let author_group_id = store
        .create_user_group(journal_id, Role::Author, "Author", &[])
        .unwrap();
    for key in [
        genre_keys::SUBMISSION,
        genre_keys::DOCUMENT,
        genre_keys::IMAGE,
        genre_keys::MULTIMEDIA,
    ] {
        store.create_genre(journal_id, key).unwrap();
    }

    fs::create_dir_all(dir.path().join("import")).unwrap();

    TestEnv {
        dir,
        store,
        journal_id,
        importer_id,
        editor_id,
        editor_group_id,
        author_group_id,
    }
}

/// 固定的运行日期
pub fn today() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 15)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

impl TestEnv {
    pub fn import_root(&self) -> PathBuf {
        self.dir.path().join("import")
    }

    pub fn args(&self) -> ConfigurationArgs {
        ConfigurationArgs {
            journal_path: JOURNAL_PATH.to_string(),
            username: "importer".to_string(),
            editor_username: "editor".to_string(),
            default_email: DEFAULT_EMAIL.to_string(),
            import_path: self.import_root(),
            today: Some(today()),
        }
    }

    pub fn config(&self) -> Configuration {
        Configuration::new(&self.store, self.args()).unwrap()
    }

    /// 完整运行一次导入
    pub fn run(&self) -> ImportSummary {
        let config = self.config();
        ImportDriver::new(&self.store, &config).run().unwrap()
    }

    /// 文章目录 vol{v}/issue{i}/art{a}（不存在时创建）
    pub fn article_dir(&self, volume: u32, issue: u32, article: u32) -> PathBuf {
        let dir = self
            .import_root()
            .join(format!("vol{}", volume))
            .join(format!("issue{}", issue))
            .join(format!("art{}", article));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub fn issue_dir(&self, volume: u32, issue: u32) -> PathBuf {
        let dir = self
            .import_root()
            .join(format!("vol{}", volume))
            .join(format!("issue{}", issue));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// 写入一篇文章：PDF + 元数据 XML
    pub fn write_article(&self, volume: u32, issue: u32, article: u32, xml: &str) -> PathBuf {
        let dir = self.article_dir(volume, issue, article);
        write_file(&dir.join("article.pdf"), b"%PDF-1.4 test");
        write_file(&dir.join("article.xml"), xml.as_bytes());
        dir
    }
}

/// 目录下的文件名（目录不存在时为空）
pub fn list_dir(dir: &Path) -> Vec<String> {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

pub fn write_file(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

// ==========================================
// A++ 样例
// ==========================================

/// A++ 文章样例
#[derive(Debug, Clone)]
pub struct APlusPlusSample {
    pub id: String,
    pub doi: String,
    pub title: String,
    pub category: String,
    /// 文章在线日期 (年, 月, 日)
    pub online_date: Option<(i32, u32, u32)>,
    /// 期封面日期 (年, 月)
    pub cover_date: Option<(i32, u32)>,
    pub restricted: bool,
    /// (名, 姓, 邮箱)
    pub authors: Vec<(String, String, String)>,
}

impl APlusPlusSample {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            doi: format!("10.1007/{}", id),
            title: format!("Article {}", id),
            category: "original paper".to_string(),
            online_date: Some((2020, 2, 1)),
            cover_date: Some((2020, 3)),
            restricted: false,
            authors: vec![(
                "Ana".to_string(),
                "Silva".to_string(),
                "ana@example.org".to_string(),
            )],
        }
    }

    pub fn to_xml(&self) -> String {
        let title = if self.title.is_empty() {
            String::new()
        } else {
            format!(r#"<ArticleTitle Language="En">{}</ArticleTitle>"#, self.title)
        };
        let online = self
            .online_date
            .map(|(y, m, d)| {
                format!(
                    "<OnlineDate><Year>{}</Year><Month>{}</Month><Day>{}</Day></OnlineDate>",
                    y, m, d
                )
            })
            .unwrap_or_default();
        let cover = self
            .cover_date
            .map(|(y, m)| format!("<CoverDate><Year>{}</Year><Month>{}</Month></CoverDate>", y, m))
            .unwrap_or_default();
        let grant = if self.restricted {
            "Restricted"
        } else {
            "OpenAccess"
        };
        let authors: String = self
            .authors
            .iter()
            .map(|(given, family, email)| {
                format!(
                    r#"<Author AffiliationIDS="Aff1 Aff2"><AuthorName><GivenName>{}</GivenName><FamilyName>{}</FamilyName></AuthorName><Contact><Email>{}</Email></Contact></Author>"#,
                    given, family, email
                )
            })
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE Publisher PUBLIC "-//Springer-Verlag//DTD A++ V2.4//EN" "http://devel.springer.de/A++/V2.4/DTD/A++V2.4.dtd">
<Publisher>
  <PublisherInfo><PublisherName>Springer</PublisherName></PublisherInfo>
  <Journal>
    <Volume>
      <Issue>
        <IssueInfo><IssueHistory>{cover}</IssueHistory></IssueInfo>
        <Article ID="{id}">
          <ArticleInfo Language="En">
            <ArticleDOI>{doi}</ArticleDOI>
            <ArticleCategory Language="En">{category}</ArticleCategory>
            {title}
            <ArticleFirstPage>1</ArticleFirstPage>
            <ArticleLastPage>10</ArticleLastPage>
            <ArticleHistory>{online}</ArticleHistory>
            <ArticleCopyright><CopyrightHolderName>Springer Nature</CopyrightHolderName></ArticleCopyright>
            <ArticleGrants>
              <MetadataGrant Grant="OpenAccess"/>
              <BodyPDFGrant Grant="{grant}"/>
            </ArticleGrants>
          </ArticleInfo>
          <ArticleHeader>
            <AuthorGroup>
              {authors}
              <Affiliation ID="Aff1"><OrgName>University of Somewhere</OrgName></Affiliation>
              <Affiliation ID="Aff2"><OrgName>Other Institute</OrgName></Affiliation>
            </AuthorGroup>
            <Abstract Language="En"><Heading>Abstract</Heading><Para>Plain text with <Emphasis>emphasis</Emphasis>.</Para></Abstract>
            <KeywordGroup Language="En"><Heading>Keywords</Heading><Keyword>alpha</Keyword><Keyword>beta</Keyword></KeywordGroup>
          </ArticleHeader>
        </Article>
      </Issue>
    </Volume>
  </Journal>
</Publisher>
"#,
            cover = cover,
            id = self.id,
            doi = self.doi,
            category = self.category,
            title = title,
            online = online,
            grant = grant,
            authors = authors,
        )
    }
}

// ==========================================
// JATS 样例
// ==========================================

/// JATS 文章样例
#[derive(Debug, Clone)]
pub struct JatsSample {
    pub doi: String,
    pub title: String,
    pub subject: String,
    pub volume: String,
    pub issue: String,
    pub with_authors: bool,
    pub with_graphic: bool,
}

impl JatsSample {
    pub fn new(doi: &str) -> Self {
        Self {
            doi: doi.to_string(),
            title: format!("JATS article {}", doi),
            subject: "research article".to_string(),
            volume: "7".to_string(),
            issue: "2".to_string(),
            with_authors: true,
            with_graphic: false,
        }
    }

    pub fn to_xml(&self) -> String {
        let contribs = if self.with_authors {
            r#"<contrib-group>
          <contrib contrib-type="author">
            <name><surname>Doe</surname><given-names>Jane</given-names></name>
            <xref ref-type="aff" rid="aff1"/>
            <xref ref-type="corresp" rid="cor1"/>
          </contrib>
          <contrib contrib-type="author">
            <name><surname>Roe</surname><given-names>Rick</given-names></name>
            <xref ref-type="aff" rid="aff1"/>
            <xref ref-type="aff" rid="aff2"/>
          </contrib>
          <aff id="aff1"><institution>Institute A</institution></aff>
        </contrib-group>
        <aff id="aff2"><institution>Institute B</institution></aff>
        <author-notes><corresp id="cor1"><email>jane@example.org</email></corresp></author-notes>"#
        } else {
            ""
        };
        let body = if self.with_graphic {
            r#"<body><fig id="f1"><graphic xlink:href="fig1.png"/></fig><fig id="f2"><graphic xlink:href="missing.png"/></fig></body>"#
        } else {
            "<body/>"
        };

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE article PUBLIC "-//NLM//DTD Journal Archiving with OASIS Tables v3.0 20080202//EN" "http://dtd.nlm.nih.gov/archiving/3.0/archive-oasis-article3.dtd">
<article xmlns:xlink="http://www.w3.org/1999/xlink" article-type="research-article" xml:lang="en">
  <front>
    <article-meta>
      <article-id pub-id-type="doi">{doi}</article-id>
      <article-id pub-id-type="publisher-id"></article-id>
      <article-categories><subj-group xml:lang="en"><subject>{subject}</subject></subj-group></article-categories>
      <title-group><article-title xml:lang="en">{title}</article-title></title-group>
      {contribs}
      <pub-date pub-type="collection"><year>2021</year></pub-date>
      <pub-date pub-type="epub"><day>5</day><month>4</month><year>2021</year></pub-date>
      <volume>{volume}</volume>
      <issue>{issue}</issue>
      <fpage>11</fpage>
      <permissions>
        <copyright-statement>Copyright EDP Sciences</copyright-statement>
        <copyright-year>2021</copyright-year>
        <copyright-holder>EDP Sciences</copyright-holder>
        <license xlink:href="https://creativecommons.org/licenses/by/4.0/"><license-p>CC BY</license-p></license>
      </permissions>
      <abstract xml:lang="en"><title>Abstract</title><p>Some <italic>italic</italic> text.</p></abstract>
      <kwd-group xml:lang="en"><kwd>first</kwd><kwd>second</kwd></kwd-group>
    </article-meta>
  </front>
  {body}
  <back>
    <ref-list>
      <ref id="r1"><mixed-citation>Smith J. <italic>Old results</italic>. 2019</mixed-citation></ref>
      <ref id="r2"><mixed-citation>Brown K. New results. 2020</mixed-citation></ref>
    </ref-list>
  </back>
</article>
"#,
            doi = self.doi,
            subject = self.subject,
            title = self.title,
            contribs = contribs,
            volume = self.volume,
            issue = self.issue,
            body = body,
        )
    }
}
