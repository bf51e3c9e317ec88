// ==========================================
// 命令行集成测试
// ==========================================
// 测试目标: 参数缺失的用法提示、配置错误的报告与退出码
// ==========================================

use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn importer() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_article-importer"));
    command.env_remove("ARTICLE_IMPORTER_DB_PATH");
    command
}

#[test]
fn test_missing_arguments_print_usage() {
    let dir = TempDir::new().unwrap();
    let output = importer()
        .args(["--locale", "en", "--database"])
        .arg(dir.path().join("publishing.db"))
        .args(["demo", "importer"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage:"));
    assert!(output.stdout.is_empty());
    assert!(!dir.path().join("publishing.db").exists());
}

#[test]
fn test_configuration_error_reported_with_success_status() {
    let dir = TempDir::new().unwrap();
    let import_dir = dir.path().join("import");
    fs::create_dir_all(&import_dir).unwrap();

    let output = importer()
        .args(["--locale", "en", "--database"])
        .arg(dir.path().join("publishing.db"))
        .args(["missing", "importer", "editor", "imports@example.org"])
        .arg(&import_dir)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "Import started");
    assert!(lines[1].starts_with("Import aborted: "));
    assert_eq!(lines[2], "0 articles, 0 imported, 0 failed, 0 skipped");
}
