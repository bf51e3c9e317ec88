// ==========================================
// A++ 导入集成测试
// ==========================================
// 测试目标: 目录 → A++ 解析 → 出版系统数据模型的完整流程
// ==========================================

mod test_helpers;

use article_importer::domain::{AccessStatus, PublicationStatus, WorkflowStage};
use article_importer::importer::{ArticleStatus, ImportError};
use article_importer::logging;
use article_importer::parser::Dialect;
use article_importer::repository::{IssueRepository, SectionRepository, SubmissionRepository};
use test_helpers::{date, setup, APlusPlusSample, DEFAULT_EMAIL, JOURNAL_NAME};

#[test]
fn test_import_single_article() {
    logging::init_test();
    let env = setup();
    env.write_article(1, 1, 1, &APlusPlusSample::new("s1").to_xml());

    let summary = env.run();
    assert_eq!(summary.count, 1);
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.skipped, 0);

    let report = &summary.reports[0];
    assert_eq!(report.label, "1-1-1");
    assert_eq!(report.status, ArticleStatus::Imported);
    let article = report.article.clone().unwrap();
    assert_eq!(article.dialect, Dialect::APlusPlus);

    // 出版物
    let publication = env
        .store
        .find_publication(article.publication_id)
        .unwrap()
        .unwrap();
    assert_eq!(publication.title.get("en_US"), Some("Article s1"));
    assert_eq!(publication.pages.as_deref(), Some("1-10"));
    assert_eq!(publication.status, PublicationStatus::Published);
    assert_eq!(publication.access_status, AccessStatus::Open);
    assert_eq!(publication.date_published, date(2020, 2, 1));
    assert_eq!(publication.locale.as_deref(), Some("en_US"));
    assert_eq!(publication.language.as_deref(), Some("en"));
    assert_eq!(publication.copyright_year.as_deref(), Some("2020"));
    assert_eq!(
        publication.copyright_holder.get("en_US"),
        Some("Springer Nature")
    );
    assert_eq!(
        publication.pub_ids.get("doi").map(String::as_str),
        Some("10.1007/s1")
    );
    assert_eq!(
        publication.pub_ids.get("publisher-id").map(String::as_str),
        Some("s1")
    );

    let abstract_text = publication.abstract_text.get("en_US").unwrap();
    assert!(abstract_text.contains("<em>emphasis</em>"));
    assert!(abstract_text.starts_with("<p>"));
    assert!(!abstract_text.contains("Abstract"));

    // 关键词
    assert_eq!(
        env.store
            .list_keywords(publication.id, "en_US")
            .unwrap(),
        vec!["alpha".to_string(), "beta".to_string()]
    );

    // 作者
    let authors = env.store.list_authors(publication.id).unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0].given_name.get("en_US"), Some("Ana"));
    assert_eq!(authors[0].family_name.get("en_US"), Some("Silva"));
    assert_eq!(authors[0].email, "ana@example.org");
    assert_eq!(
        authors[0].affiliation.get("en_US"),
        Some("University of Somewhere")
    );
    assert!(authors[0].primary_contact);
    assert_eq!(authors[0].seq, 1);
    assert_eq!(authors[0].user_group_id, Some(env.author_group_id));
    assert_eq!(publication.primary_contact_id, Some(authors[0].id));

    // Galley
    let galleys = env.store.list_galleys(publication.id).unwrap();
    assert_eq!(galleys.len(), 1);
    assert_eq!(galleys[0].label, "PDF");
    assert_eq!(galleys[0].seq, 1);
    assert!(galleys[0].submission_file_id.is_some());

    // 提交
    let submission = env
        .store
        .find_submission(article.submission_id)
        .unwrap()
        .unwrap();
    assert_eq!(submission.stage, WorkflowStage::Production);
    assert_eq!(submission.status, PublicationStatus::Published);
    assert_eq!(submission.date_submitted, date(2020, 2, 1));
    assert_eq!(submission.current_publication_id, Some(publication.id));
    assert_eq!(
        env.store.list_stage_assignments(submission.id).unwrap(),
        vec![(env.editor_group_id, env.editor_id, WorkflowStage::Production)]
    );

    // 期与栏目
    let issue = env
        .store
        .find_issue(env.journal_id, "1", "1")
        .unwrap()
        .unwrap();
    assert_eq!(issue.id, article.issue_id);
    assert_eq!(issue.date_published, date(2020, 3, 1));
    assert!(issue.published);
    assert_eq!(env.store.current_issue_id(env.journal_id).unwrap(), Some(issue.id));
    assert_eq!(env.store.custom_issue_seq(issue.id).unwrap(), Some(1));

    let section = env
        .store
        .find_section_by_title(env.journal_id, "Original Paper", "en_US")
        .unwrap()
        .unwrap();
    assert_eq!(section.id, article.section_id);
    assert!(section.policy.has_value());
}

#[test]
fn test_restricted_grant_follows_issue_access() {
    let env = setup();
    let mut sample = APlusPlusSample::new("s2");
    sample.restricted = true;
    env.write_article(1, 1, 1, &sample.to_xml());

    let summary = env.run();
    let article = summary.reports[0].article.clone().unwrap();
    let publication = env
        .store
        .find_publication(article.publication_id)
        .unwrap()
        .unwrap();
    assert_eq!(publication.access_status, AccessStatus::IssueDefault);
}

#[test]
fn test_missing_title_rolls_back() {
    let env = setup();
    let mut sample = APlusPlusSample::new("s3");
    sample.title = String::new();
    env.write_article(1, 1, 1, &sample.to_xml());
    test_helpers::write_file(&env.issue_dir(1, 1).join("cover.png"), b"png-bytes");

    let summary = env.run();
    assert_eq!(summary.imported, 0);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.reports[0].status, ArticleStatus::Failed);
    assert_eq!(
        summary.reports[0].message.as_deref(),
        Some(ImportError::MissingTitle.to_string().as_str())
    );

    // 本次创建的提交、期、栏目全部删除
    assert!(env.store.list_submissions(env.journal_id).unwrap().is_empty());
    assert_eq!(env.store.count_publications(env.journal_id).unwrap(), 0);
    assert_eq!(env.store.count_issues(env.journal_id).unwrap(), 0);
    assert_eq!(env.store.count_sections(env.journal_id).unwrap(), 0);

    // 期封面随期一起删除
    assert!(test_helpers::list_dir(&env.store.public_dir(env.journal_id)).is_empty());
}

#[test]
fn test_failed_article_keeps_shared_issue() {
    let env = setup();
    env.write_article(1, 1, 1, &APlusPlusSample::new("ok").to_xml());
    let mut broken = APlusPlusSample::new("broken");
    broken.title = String::new();
    env.write_article(1, 1, 2, &broken.to_xml());

    let summary = env.run();
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.failed, 1);

    // 第二篇复用了第一篇创建的期和栏目，回滚不能删除它们
    assert_eq!(env.store.count_issues(env.journal_id).unwrap(), 1);
    assert_eq!(env.store.count_sections(env.journal_id).unwrap(), 1);
    assert_eq!(env.store.count_publications(env.journal_id).unwrap(), 1);
}

#[test]
fn test_default_author_from_journal_name() {
    let env = setup();
    let mut sample = APlusPlusSample::new("s4");
    sample.authors.clear();
    env.write_article(1, 1, 1, &sample.to_xml());

    let summary = env.run();
    let article = summary.reports[0].article.clone().unwrap();
    let authors = env.store.list_authors(article.publication_id).unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0].given_name.get("en_US"), Some(JOURNAL_NAME));
    assert!(authors[0].family_name.is_empty());
    assert_eq!(authors[0].email, DEFAULT_EMAIL);
    assert!(authors[0].primary_contact);
}

#[test]
fn test_issue_date_falls_back_to_online_date() {
    let env = setup();
    let mut sample = APlusPlusSample::new("s5");
    sample.cover_date = None;
    sample.online_date = Some((2019, 11, 20));
    env.write_article(4, 2, 1, &sample.to_xml());

    env.run();
    let issue = env
        .store
        .find_issue(env.journal_id, "4", "2")
        .unwrap()
        .unwrap();
    assert_eq!(issue.date_published, date(2019, 11, 20));
    assert_eq!(issue.year, 2019);
}

#[test]
fn test_missing_every_date_fails() {
    let env = setup();
    let mut sample = APlusPlusSample::new("s6");
    sample.cover_date = None;
    sample.online_date = None;
    env.write_article(1, 1, 1, &sample.to_xml());

    let summary = env.run();
    assert_eq!(summary.failed, 1);
    assert_eq!(env.store.count_issues(env.journal_id).unwrap(), 0);
}

#[test]
fn test_reimport_is_skipped() {
    let env = setup();
    env.write_article(1, 1, 1, &APlusPlusSample::new("s7").to_xml());

    let first = env.run();
    assert_eq!(first.imported, 1);

    let second = env.run();
    assert_eq!(second.imported, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(second.reports[0].status, ArticleStatus::Skipped);
    assert!(second.reports[0].message.as_deref().unwrap().contains("10.1007/s7"));
    assert_eq!(env.store.count_publications(env.journal_id).unwrap(), 1);
}

#[test]
fn test_issue_and_section_reused_within_and_across_runs() {
    let env = setup();
    env.write_article(1, 1, 1, &APlusPlusSample::new("a").to_xml());
    env.write_article(1, 1, 2, &APlusPlusSample::new("b").to_xml());
    let mut review = APlusPlusSample::new("c");
    review.category = "REVIEW".to_string();
    env.write_article(1, 1, 3, &review.to_xml());

    let summary = env.run();
    assert_eq!(summary.imported, 3);
    assert_eq!(env.store.count_issues(env.journal_id).unwrap(), 1);
    assert_eq!(env.store.count_sections(env.journal_id).unwrap(), 2);

    let issue_id = summary.reports[0].article.as_ref().unwrap().issue_id;
    let first_section = summary.reports[0].article.as_ref().unwrap().section_id;
    let review_section = summary.reports[2].article.as_ref().unwrap().section_id;
    assert_eq!(
        env.store.list_custom_section_orders(issue_id).unwrap(),
        vec![(first_section, 1), (review_section, 2)]
    );
    assert!(env
        .store
        .find_section_by_title(env.journal_id, "Review", "en_US")
        .unwrap()
        .is_some());

    // 第二次运行：新文章复用已存在的期和栏目
    env.write_article(1, 1, 4, &APlusPlusSample::new("d").to_xml());
    let again = env.run();
    assert_eq!(again.imported, 1);
    assert_eq!(again.skipped, 3);
    assert_eq!(env.store.count_issues(env.journal_id).unwrap(), 1);
    assert_eq!(env.store.count_sections(env.journal_id).unwrap(), 2);
    let article = again
        .reports
        .iter()
        .find_map(|r| r.article.clone())
        .unwrap();
    assert_eq!(article.issue_id, issue_id);
    assert_eq!(article.section_id, first_section);
    assert_eq!(
        env.store.list_custom_section_orders(issue_id).unwrap().len(),
        2
    );
}

#[test]
fn test_issue_cover_applied_once() {
    let env = setup();
    let issue_dir = env.issue_dir(1, 1);
    test_helpers::write_file(&issue_dir.join("cover.png"), b"png-bytes");
    env.write_article(1, 1, 1, &APlusPlusSample::new("c1").to_xml());

    env.run();
    let issue = env
        .store
        .find_issue(env.journal_id, "1", "1")
        .unwrap()
        .unwrap();
    let expected = format!("cover_issue_{}_en_US.png", issue.id);
    assert_eq!(issue.cover_image.get("en_US"), Some(expected.as_str()));
    assert!(env
        .store
        .public_dir(env.journal_id)
        .join(&expected)
        .is_file());
}

#[test]
fn test_section_matched_by_secondary_title() {
    let env = setup();
    env.write_article(1, 1, 1, &APlusPlusSample::new("en-only").to_xml());
    let first = env.run();
    let section_id = first.reports[0].article.as_ref().unwrap().section_id;

    // 新运行（缓存为空）：德文主标题不存在，按 "/" 之后的英文标题命中已有栏目
    let mut german = APlusPlusSample::new("bilingual");
    german.category = "Originalarbeit / Original Paper".to_string();
    let xml = german.to_xml().replace(
        r#"<ArticleCategory Language="En">"#,
        r#"<ArticleCategory Language="De">"#,
    );
    env.write_article(1, 1, 2, &xml);

    let second = env.run();
    assert_eq!(second.imported, 1, "{:?}", second.reports);
    let article = second
        .reports
        .iter()
        .find_map(|r| r.article.clone())
        .unwrap();
    assert_eq!(article.section_id, section_id);
    assert_eq!(env.store.count_sections(env.journal_id).unwrap(), 1);
    assert!(env
        .store
        .find_section_by_title(env.journal_id, "Originalarbeit", "de_DE")
        .unwrap()
        .is_none());
}

#[test]
fn test_latin1_metadata_decoded_by_declaration() {
    let env = setup();
    let mut sample = APlusPlusSample::new("latin1");
    sample.title = "Caf\u{e9}".to_string();
    let xml = sample
        .to_xml()
        .replace(r#"encoding="UTF-8""#, r#"encoding="ISO-8859-1""#);
    let latin1: Vec<u8> = xml
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap())
        .collect();
    let dir = env.write_article(1, 1, 1, "");
    test_helpers::write_file(&dir.join("article.xml"), &latin1);

    let summary = env.run();
    assert_eq!(summary.imported, 1, "{:?}", summary.reports);
    let article = summary.reports[0].article.clone().unwrap();
    let publication = env
        .store
        .find_publication(article.publication_id)
        .unwrap()
        .unwrap();
    assert_eq!(publication.title.get("en_US"), Some("Caf\u{e9}"));
}

#[test]
fn test_metadata_not_matching_encoding_fails() {
    let env = setup();
    let mut raw = APlusPlusSample::new("broken-bytes").to_xml().into_bytes();
    let pos = raw.windows(6).position(|w| w == b"<Para>").unwrap() + 6;
    raw.insert(pos, 0xE9);
    let dir = env.write_article(1, 1, 1, "");
    test_helpers::write_file(&dir.join("article.xml"), &raw);

    let summary = env.run();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.reports[0].status, ArticleStatus::Failed);
}
