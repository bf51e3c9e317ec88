// ==========================================
// 导入运行集成测试
// ==========================================
// 测试目标: 配置校验、方言调度、目录结构错误、期重新排序
// ==========================================

mod test_helpers;

use article_importer::config::{config_keys, Configuration};
use article_importer::importer::{ArticleStatus, ErrorClass, ImportDriver, ImportError};
use article_importer::repository::IssueRepository;
use test_helpers::{setup, write_file, APlusPlusSample, JatsSample};

// ===== 配置 =====

#[test]
fn test_unknown_journal_is_configuration_error() {
    let env = setup();
    let mut args = env.args();
    args.journal_path = "missing".to_string();

    let err = Configuration::new(&env.store, args).unwrap_err();
    assert!(matches!(err, ImportError::UnknownJournal(_)));
    assert_eq!(err.class(), ErrorClass::Configuration);
}

#[test]
fn test_unknown_users_and_bad_email_rejected() {
    let env = setup();

    let mut args = env.args();
    args.editor_username = "ghost".to_string();
    assert!(matches!(
        Configuration::new(&env.store, args).unwrap_err(),
        ImportError::UnknownUser(_)
    ));

    let mut args = env.args();
    args.default_email = "not-an-email".to_string();
    assert!(matches!(
        Configuration::new(&env.store, args).unwrap_err(),
        ImportError::InvalidEmail(_)
    ));

    let mut args = env.args();
    args.import_path = env.dir.path().join("nowhere");
    assert!(matches!(
        Configuration::new(&env.store, args).unwrap_err(),
        ImportError::ImportPathNotFound(_)
    ));
}

#[test]
fn test_unknown_parser_setting_rejected() {
    let env = setup();
    env.store
        .set_setting(config_keys::PARSERS, "jats,crossref")
        .unwrap();

    let err = Configuration::new(&env.store, env.args()).unwrap_err();
    assert!(matches!(err, ImportError::UnknownParser(name) if name == "crossref"));
}

// ===== 方言调度 =====

#[test]
fn test_mixed_dialects_in_one_run() {
    let env = setup();
    env.write_article(1, 1, 1, &APlusPlusSample::new("m1").to_xml());
    env.write_article(1, 1, 2, &JatsSample::new("10.1051/mixed").to_xml());

    let summary = env.run();
    assert_eq!(summary.imported, 2, "{:?}", summary.reports);
}

#[test]
fn test_unknown_doctype_is_skipped() {
    let env = setup();
    env.write_article(
        1,
        1,
        1,
        r#"<?xml version="1.0"?>
<!DOCTYPE rss PUBLIC "-//Example//DTD RSS//EN" "rss.dtd">
<rss><channel/></rss>"#,
    );
    env.write_article(1, 1, 2, "<article><front/></article>");

    let summary = env.run();
    assert_eq!(summary.count, 2);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.imported, 0);
    assert!(summary
        .reports
        .iter()
        .all(|r| r.status == ArticleStatus::Skipped));
    assert_eq!(env.store.count_issues(env.journal_id).unwrap(), 0);
}

#[test]
fn test_parser_order_from_settings() {
    let env = setup();
    env.store.set_setting(config_keys::PARSERS, "jats").unwrap();
    env.write_article(1, 1, 1, &APlusPlusSample::new("only-jats").to_xml());

    let summary = env.run();
    assert_eq!(summary.skipped, 1);
}

#[test]
fn test_malformed_xml_fails() {
    let env = setup();
    env.write_article(1, 1, 1, "<Publisher><Journal>");

    let summary = env.run();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.reports[0].status, ArticleStatus::Failed);
}

// ===== 目录结构 =====

#[test]
fn test_structural_errors_reported_per_folder() {
    let env = setup();
    env.write_article(1, 1, 1, &APlusPlusSample::new("good").to_xml());

    // 两个 PDF
    let dir = env.write_article(1, 1, 2, &APlusPlusSample::new("two-pdfs").to_xml());
    write_file(&dir.join("second.pdf"), b"%PDF");

    // 缺少元数据
    let dir = env.article_dir(1, 1, 3);
    write_file(&dir.join("article.pdf"), b"%PDF");

    // 目录名没有数字
    let dir = env.import_root().join("vol1").join("issue1").join("extras");
    write_file(&dir.join("notes.pdf"), b"%PDF");

    let summary = env.run();
    assert_eq!(summary.count, 4);
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.failed, 3);
    assert_eq!(summary.skipped, 0);

    // 目录结构错误先于文章报告
    assert_eq!(summary.reports[0].status, ArticleStatus::Failed);
    assert!(summary.reports[0].label.ends_with("extras"));
}

#[test]
fn test_empty_import_root() {
    let env = setup();
    let summary = env.run();
    assert_eq!(summary.count, 0);
    assert!(summary.reports.is_empty());
    assert_eq!(env.store.current_issue_id(env.journal_id).unwrap(), None);
}

// ===== 期排序 =====

#[test]
fn test_issues_resequenced_newest_first() {
    let env = setup();
    env.write_article(1, 1, 1, &APlusPlusSample::new("v1n1").to_xml());
    env.write_article(1, 2, 1, &APlusPlusSample::new("v1n2").to_xml());
    env.write_article(2, 1, 1, &APlusPlusSample::new("v2n1").to_xml());

    let summary = env.run();
    assert_eq!(summary.imported, 3);

    let issue_id = |volume: &str, number: &str| {
        env.store
            .find_issue(env.journal_id, volume, number)
            .unwrap()
            .unwrap()
            .id
    };
    let v2n1 = issue_id("2", "1");
    let v1n2 = issue_id("1", "2");
    let v1n1 = issue_id("1", "1");

    assert_eq!(env.store.custom_issue_seq(v2n1).unwrap(), Some(1));
    assert_eq!(env.store.custom_issue_seq(v1n2).unwrap(), Some(2));
    assert_eq!(env.store.custom_issue_seq(v1n1).unwrap(), Some(3));
    assert_eq!(env.store.current_issue_id(env.journal_id).unwrap(), Some(v2n1));

    let ordered: Vec<i64> = env
        .store
        .list_published_issues(env.journal_id)
        .unwrap()
        .iter()
        .map(|issue| issue.id)
        .collect();
    assert_eq!(ordered, vec![v2n1, v1n2, v1n1]);
}

#[test]
fn test_volume_order_is_numeric() {
    let env = setup();
    env.write_article(9, 1, 1, &APlusPlusSample::new("v9").to_xml());
    env.write_article(10, 1, 1, &APlusPlusSample::new("v10").to_xml());

    let summary = env.run();
    // 文章按自然顺序处理
    assert_eq!(summary.reports[0].label, "9-1-1");
    assert_eq!(summary.reports[1].label, "10-1-1");

    let v10 = env
        .store
        .find_issue(env.journal_id, "10", "1")
        .unwrap()
        .unwrap();
    assert_eq!(env.store.current_issue_id(env.journal_id).unwrap(), Some(v10.id));
    assert_eq!(env.store.custom_issue_seq(v10.id).unwrap(), Some(1));
}

#[test]
fn test_no_resequence_without_imports() {
    let env = setup();
    env.write_article(1, 1, 1, &APlusPlusSample::new("once").to_xml());
    env.run();

    let config = env.config();
    let issue = env
        .store
        .find_issue(env.journal_id, "1", "1")
        .unwrap()
        .unwrap();
    env.store.delete_custom_issue_orders(env.journal_id).unwrap();

    // 全部跳过时不会重新写入排序
    let summary = ImportDriver::new(&env.store, &config).run().unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(env.store.custom_issue_seq(issue.id).unwrap(), None);
}

#[test]
fn test_resequence_failure_keeps_reports() {
    let env = setup();
    env.write_article(1, 1, 1, &APlusPlusSample::new("kept").to_xml());

    // 另开连接加触发器，使期排序写入失败
    let conn = rusqlite::Connection::open(env.dir.path().join("publishing.db")).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER block_issue_order BEFORE INSERT ON custom_issue_orders
         BEGIN SELECT RAISE(ABORT, 'issue ordering locked'); END;",
    )
    .unwrap();

    let summary = env.run();
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.reports.len(), 1);
    assert_eq!(summary.reports[0].status, ArticleStatus::Imported);
    assert!(summary.resequence_error.is_some());
    assert_eq!(env.store.count_publications(env.journal_id).unwrap(), 1);
}
