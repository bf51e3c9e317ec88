// ==========================================
// 期刊文章导入 - 配置层
// ==========================================
// 职责: 运行配置（构造即校验）与导入参数读取
// 存储: config_kv 表
// ==========================================

pub mod configuration;
pub mod settings;

pub use configuration::{Configuration, ConfigurationArgs};
pub use settings::{config_keys, DefaultSettings, ImportSettings};
