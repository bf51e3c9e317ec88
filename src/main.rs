// ==========================================
// 期刊文章导入工具 - 命令行入口
// ==========================================
// 用法: article-importer <期刊路径> <导入用户名> <编辑用户名> <默认邮箱> <导入目录>
// 输出: stdout 为导入报告，日志写 stderr（RUST_LOG 控制级别）
// 退出码: 参数缺失为 2，其余（含配置错误、单篇失败）为 0
// ==========================================

use anyhow::{Context, Result};
use article_importer::config::{Configuration, ConfigurationArgs};
use article_importer::i18n::{self, t, t_with_args};
use article_importer::importer::{ImportDriver, ImportSummary};
use article_importer::logging::{self, LogFormat};
use article_importer::repository::SqlitePublishingStore;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "article-importer", version, about = "期刊文章批量导入工具")]
struct Cli {
    /// 期刊 URL 路径
    journal_path: Option<String>,
    /// 导入用户（作者默认账号）
    username: Option<String>,
    /// 编辑用户（分配到制作阶段）
    editor_username: Option<String>,
    /// 无邮箱作者的默认邮箱
    default_email: Option<String>,
    /// 卷/期/文章 目录的根
    import_path: Option<PathBuf>,

    /// 出版系统数据库文件
    #[arg(long, env = "ARTICLE_IMPORTER_DB_PATH")]
    database: Option<PathBuf>,

    /// 存储文件目录（默认: 数据库同级的 files 目录）
    #[arg(long)]
    files_dir: Option<PathBuf>,

    /// 报告语言（zh-CN / en）
    #[arg(long, default_value = "zh-CN")]
    locale: String,

    /// 以 JSON 格式输出日志
    #[arg(long)]
    json_log: bool,
}

impl Cli {
    fn import_args(&self) -> Option<ConfigurationArgs> {
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let import_path = self
            .import_path
            .clone()
            .filter(|p| !p.as_os_str().is_empty())?;

        Some(ConfigurationArgs {
            journal_path: non_empty(&self.journal_path)?,
            username: non_empty(&self.username)?,
            editor_username: non_empty(&self.editor_username)?,
            default_email: non_empty(&self.default_email)?,
            import_path,
            today: None,
        })
    }
}

/// 默认数据库路径（用户数据目录下）
fn default_db_path() -> PathBuf {
    match dirs::data_dir() {
        Some(data_dir) => data_dir.join("article-importer").join("publishing.db"),
        None => PathBuf::from("./publishing.db"),
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    logging::init(if cli.json_log {
        LogFormat::Json
    } else {
        LogFormat::Text
    });
    i18n::set_locale(&cli.locale);

    let Some(args) = cli.import_args() else {
        eprintln!("{}", t("import.usage"));
        return Ok(ExitCode::from(2));
    };

    let db_path = cli.database.clone().unwrap_or_else(default_db_path);
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("无法创建数据库目录: {}", parent.display()))?;
    }
    let files_dir = cli.files_dir.clone().unwrap_or_else(|| {
        db_path
            .parent()
            .map(|p| p.join("files"))
            .unwrap_or_else(|| PathBuf::from("files"))
    });
    tracing::info!(
        "{} v{} 使用数据库: {}",
        article_importer::APP_NAME,
        article_importer::VERSION,
        db_path.display()
    );

    let store = SqlitePublishingStore::new(&db_path.to_string_lossy(), files_dir)
        .with_context(|| format!("无法打开数据库: {}", db_path.display()))?;
    store.init_schema().context("数据库初始化失败")?;

    println!("{}", t("import.start"));

    let outcome = Configuration::new(&store, args)
        .and_then(|config| ImportDriver::new(&store, &config).run());

    match outcome {
        Ok(summary) => {
            for line in i18n::summary_lines(&summary) {
                println!("{}", line);
            }
        }
        Err(e) => {
            tracing::error!(error = %e, class = ?e.class(), "导入中止");
            println!(
                "{}",
                t_with_args("import.error", &[("message", &e.to_string())])
            );
            println!("{}", i18n::status_line(&ImportSummary::default()));
        }
    }
    Ok(ExitCode::SUCCESS)
}
