// ==========================================
// 期刊文章导入 - 导入参数读取 Trait
// ==========================================
// 职责: 定义导入运行所需的可调参数读取接口（不包含实现）
// 实现者: SqlitePublishingStore（从 config_kv 表读取）、DefaultSettings（纯默认值）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::error::RepositoryResult;

/// 配置键
pub mod config_keys {
    pub const DEFAULT_SECTION_NAME: &str = "import.default_section_name";
    pub const ISSUE_COVER_BASENAME: &str = "import.issue_cover_basename";
    pub const IMAGE_EXTENSIONS: &str = "import.image_extensions";
    pub const PARSERS: &str = "import.parsers";
}

/// 默认值
pub mod defaults {
    pub const DEFAULT_SECTION_NAME: &str = "Articles";
    pub const ISSUE_COVER_BASENAME: &str = "cover";
    pub const IMAGE_EXTENSIONS: &str = "tif,tiff,png,jpg,jpeg";
    pub const PARSERS: &str = "aplusplus,jats";
}

/// 逗号分隔列表 → 去空白、小写、去空项
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

// ==========================================
// ImportSettings Trait
// ==========================================
pub trait ImportSettings {
    /// 读取原始配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_setting(&self, key: &str) -> RepositoryResult<Option<String>>;

    /// 读取配置值，空白或缺失时使用默认值
    fn get_setting_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_setting(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    /// 元数据未给出栏目时使用的栏目名
    ///
    /// # 默认值
    /// - "Articles"
    fn get_default_section_name(&self) -> RepositoryResult<String> {
        self.get_setting_or_default(config_keys::DEFAULT_SECTION_NAME, defaults::DEFAULT_SECTION_NAME)
    }

    /// 期封面文件名（不含扩展名），位于期目录下
    ///
    /// # 默认值
    /// - "cover"
    fn get_issue_cover_basename(&self) -> RepositoryResult<String> {
        self.get_setting_or_default(config_keys::ISSUE_COVER_BASENAME, defaults::ISSUE_COVER_BASENAME)
    }

    /// 图片扩展名（按优先级），用于期封面查找与依附文件分类
    ///
    /// # 默认值
    /// - ["tif", "tiff", "png", "jpg", "jpeg"]
    fn get_image_extensions(&self) -> RepositoryResult<Vec<String>> {
        let raw =
            self.get_setting_or_default(config_keys::IMAGE_EXTENSIONS, defaults::IMAGE_EXTENSIONS)?;
        Ok(split_list(&raw))
    }

    /// 解析器名称列表（按尝试顺序）
    ///
    /// # 默认值
    /// - ["aplusplus", "jats"]
    fn get_parser_names(&self) -> RepositoryResult<Vec<String>> {
        let raw = self.get_setting_or_default(config_keys::PARSERS, defaults::PARSERS)?;
        Ok(split_list(&raw))
    }
}

/// 纯默认值实现（无配置存储时使用）
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSettings;

impl ImportSettings for DefaultSettings {
    fn get_setting(&self, _key: &str) -> RepositoryResult<Option<String>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapSettings(HashMap<&'static str, &'static str>);

    impl ImportSettings for MapSettings {
        fn get_setting(&self, key: &str) -> RepositoryResult<Option<String>> {
            Ok(self.0.get(key).map(|v| v.to_string()))
        }
    }

    #[test]
    fn test_defaults() {
        let settings = DefaultSettings;
        assert_eq!(settings.get_default_section_name().unwrap(), "Articles");
        assert_eq!(settings.get_issue_cover_basename().unwrap(), "cover");
        assert_eq!(
            settings.get_image_extensions().unwrap(),
            vec!["tif", "tiff", "png", "jpg", "jpeg"]
        );
        assert_eq!(settings.get_parser_names().unwrap(), vec!["aplusplus", "jats"]);
    }

    #[test]
    fn test_overrides_and_blank_values() {
        let settings = MapSettings(HashMap::from([
            (config_keys::PARSERS, " JATS , "),
            (config_keys::DEFAULT_SECTION_NAME, "   "),
            (config_keys::IMAGE_EXTENSIONS, "png,,GIF"),
        ]));
        assert_eq!(settings.get_parser_names().unwrap(), vec!["jats"]);
        assert_eq!(settings.get_default_section_name().unwrap(), "Articles");
        assert_eq!(settings.get_image_extensions().unwrap(), vec!["png", "gif"]);
    }
}
