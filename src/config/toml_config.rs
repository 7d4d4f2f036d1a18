use crate::config::EpgConfig;
use crate::utils::error::{EpgError, Result};
use regex::Regex;
use std::path::Path;

impl EpgConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置，未列出的欄位使用預設值
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EpgError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }
}

/// 替換環境變數 (例如 ${EPG_API_URL})，未定義的變數保持原樣
fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EpgError::ConfigError {
        message: format!("invalid substitution pattern: {}", e),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceMode;
    use crate::core::output::Compression;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_partial_toml_config() {
        let toml_content = r#"
[source]
mode = "feed"
playlist_path = "channels.m3u"

[fetch]
workers = 4
first_offset = 0
last_offset = 1

[output]
path = "guide.xml"
compression = "never"
gzip_copy = true
"#;

        let config = EpgConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.source.mode, SourceMode::Feed);
        assert_eq!(config.source.playlist_path, "channels.m3u");
        assert_eq!(config.fetch.workers, 4);
        assert_eq!(config.fetch.day_offsets(), vec![0, 1]);
        // untouched fields keep their defaults
        assert_eq!(config.fetch.max_attempts, 3);
        assert_eq!(config.render.utc_offset, "+0530");
        assert_eq!(config.output.compression, Compression::Never);
        assert!(config.output.gzip_copy);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("EPG_TEST_ENDPOINT", "https://schedule.example.com/get");

        let toml_content = r#"
[source]
api_endpoint = "${EPG_TEST_ENDPOINT}"
feed_url = "${EPG_TEST_UNDEFINED_VAR}"
"#;

        let config = EpgConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.source.api_endpoint, "https://schedule.example.com/get");
        assert_eq!(config.source.feed_url, "${EPG_TEST_UNDEFINED_VAR}");

        std::env::remove_var("EPG_TEST_ENDPOINT");
    }

    #[test]
    fn test_custom_headers_replace_defaults() {
        let toml_content = r#"
[fetch.headers]
"User-Agent" = "epg-builder/0.1"
"#;

        let config = EpgConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.fetch.headers.len(), 1);
        assert_eq!(config.fetch.headers["User-Agent"], "epg-builder/0.1");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = EpgConfig::from_toml_str("[fetch\nworkers = ").unwrap_err();
        assert!(matches!(err, EpgError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[render]\nutc_offset = \"+0100\"\ntimestamp_mode = \"convert\"\n")
            .unwrap();

        let config = EpgConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.render.utc_offset, "+0100");
    }
}
