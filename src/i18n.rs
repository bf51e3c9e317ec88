// ==========================================
// 期刊文章导入 - 国际化 (i18n)
// ==========================================
// 使用 rust-i18n，支持中文（默认）和英文
// 负责: 导入报告行、汇总行、自动创建栏目的说明文字
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use crate::importer::{ArticleReport, ArticleStatus, ImportSummary};

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"zh-CN" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数，占位符形如 `%{name}`）
///
/// # 示例
/// ```no_run
/// use article_importer::i18n::t_with_args;
/// let msg = t_with_args("import.article_imported", &[("article", "1-1-1")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

// ===== 导入报告 =====

/// 单篇文章（或目录结构错误）的报告行
pub fn report_line(report: &ArticleReport) -> String {
    let message = report.message.as_deref().unwrap_or_default();
    match report.status {
        ArticleStatus::Imported => {
            t_with_args("import.article_imported", &[("article", &report.label)])
        }
        ArticleStatus::Skipped => t_with_args(
            "import.article_skipped",
            &[("article", &report.label), ("message", message)],
        ),
        ArticleStatus::Failed => t_with_args(
            "import.article_failed",
            &[("article", &report.label), ("message", message)],
        ),
    }
}

/// 运行汇总行（四个计数）
pub fn status_line(summary: &ImportSummary) -> String {
    t_with_args(
        "import.status",
        &[
            ("count", &summary.count.to_string()),
            ("imported", &summary.imported.to_string()),
            ("failed", &summary.failed.to_string()),
            ("skipped", &summary.skipped.to_string()),
        ],
    )
}

/// 运行结束时的报告：逐篇行、期排序失败（如有）、结束行
pub fn summary_lines(summary: &ImportSummary) -> Vec<String> {
    let mut lines: Vec<String> = summary.reports.iter().map(report_line).collect();
    if let Some(message) = &summary.resequence_error {
        lines.push(t_with_args("import.resequence_failed", &[("message", message)]));
    }
    lines.push(t("import.end"));
    lines.push(status_line(summary));
    lines
}

/// 自动创建栏目的政策说明
pub fn section_policy() -> String {
    t("section.default_policy")
}
