use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use ::config::{Config, ConfigError, File, FileFormat};
use anyhow::{Result, Context, anyhow, bail};
use log::{debug, info};

use crate::utils::file_utils;
use super::types::{AppConfig, CourseConfig, CourseKind, LoginConfig, PortalSettings};

/// Section holding every setting
pub const CONFIG_SECTION: &str = "config";

/// Reads credentials, courses, and portal settings out of an INI file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// Where the document was read from, if it came from disk
    path: Option<PathBuf>,

    /// Entries of `[config]` keyed by lower-cased name, `None` when the section is absent
    section: Option<HashMap<String, String>>,
}

impl ConfigManager {
    /// Load and parse a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = file_utils::read_file_to_string(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?;

        let mut manager = Self::from_content(&content)
            .with_context(|| format!("Failed to load config {}", path.display()))?;
        manager.path = Some(path.to_path_buf());

        info!("Loaded config from {}", path.display());
        Ok(manager)
    }

    /// Parse config text held in memory
    pub fn from_content(content: &str) -> Result<Self> {
        // Windows editors like to save a BOM in front of the first section
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let document = Config::builder()
            .add_source(File::from_str(content, FileFormat::Ini))
            .build()
            .context("Failed to parse config")?;

        let section = match document.get_table(CONFIG_SECTION) {
            Ok(table) => {
                let entries = table
                    .into_iter()
                    .map(|(key, value)| -> Result<(String, String), ConfigError> {
                        Ok((key.to_lowercase(), value.into_string()?))
                    })
                    .collect::<Result<HashMap<_, _>, _>>()
                    .with_context(|| format!("Config section [{}] holds a value that is not text", CONFIG_SECTION))?;
                debug!("Read {} keys from [{}]", entries.len(), CONFIG_SECTION);
                Some(entries)
            }
            Err(ConfigError::NotFound(_)) => None,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read config section [{}]", CONFIG_SECTION));
            }
        };

        Ok(Self { path: None, section })
    }

    /// Path the config was loaded from
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Credentials and semester
    pub fn login_config(&self) -> Result<LoginConfig> {
        Ok(LoginConfig {
            username: self.required("username")?.to_string(),
            password: self.required("password")?.to_string(),
            semester: self.required("time")?.to_string(),
        })
    }

    /// Optional portal settings, falling back to defaults
    pub fn settings(&self) -> Result<PortalSettings> {
        let mut settings = PortalSettings::default();

        if let Some(base_url) = self.optional("base_url") {
            settings.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(interval) = self.optional_number::<u64>("interval_ms")? {
            settings.retry_interval = Duration::from_millis(interval);
        }
        if let Some(path) = self.optional("captcha_path") {
            settings.captcha_path = PathBuf::from(path);
        }
        if let Some(agent) = self.optional("user_agent") {
            settings.user_agent = agent.to_string();
        }
        if let Some(timeout) = self.optional_number::<u64>("timeout_secs")? {
            settings.request_timeout = Some(Duration::from_secs(timeout));
        }
        if let Some(attempts) = self.optional_number::<u32>("max_attempts")? {
            if attempts == 0 {
                bail!("Config key `max_attempts` must be at least 1; leave it out to retry forever");
            }
            settings.max_attempts = Some(attempts);
        }

        Ok(settings)
    }

    /// Courses to enroll in: all public electives, then all required courses
    pub fn course_configs(&self) -> Result<Vec<CourseConfig>> {
        let login = self.login_config()?;
        let settings = self.settings()?;
        self.courses_for(&login, &settings)
    }

    /// The whole configuration
    pub fn app_config(&self) -> Result<AppConfig> {
        let login = self.login_config()?;
        let settings = self.settings()?;
        let courses = self.courses_for(&login, &settings)?;

        debug!(
            "Config has {} public and {} required courses",
            courses.iter().filter(|c| c.kind == CourseKind::Public).count(),
            courses.iter().filter(|c| c.kind == CourseKind::Required).count()
        );

        Ok(AppConfig { login, courses, settings })
    }

    fn courses_for(&self, login: &LoginConfig, settings: &PortalSettings) -> Result<Vec<CourseConfig>> {
        let mut courses = Vec::new();

        let public = self.optional_number::<usize>("num1")?.unwrap_or(0);
        for i in 1..=public {
            let id = self.required(&format!("id{}", i))?;
            courses.push(CourseConfig::new(id, CourseKind::Public, &settings.base_url, &login.semester));
        }

        let required = self.optional_number::<usize>("num2")?.unwrap_or(0);
        for i in 1..=required {
            let id = self.required(&format!("id_{}", i))?;
            courses.push(CourseConfig::new(id, CourseKind::Required, &settings.base_url, &login.semester));
        }

        Ok(courses)
    }

    fn section(&self) -> Result<&HashMap<String, String>> {
        self.section
            .as_ref()
            .ok_or_else(|| anyhow!("Config is missing the [{}] section", CONFIG_SECTION))
    }

    fn required(&self, key: &str) -> Result<&str> {
        self.section()?
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| anyhow!("Config key `{}` is missing from [{}]", key, CONFIG_SECTION))
    }

    fn optional(&self, key: &str) -> Option<&str> {
        self.section
            .as_ref()?
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    fn optional_number<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.optional(key) {
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .with_context(|| format!("Config key `{}` must be a number, got {:?}", key, raw)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
[config]
username = 8208190101
password = secret
time = 202420252
num1 = 2
id1 = 000101
id2 = 000102
num2 = 1
id_1 = 000901
";

    #[test]
    fn reads_login_and_courses_in_order() -> Result<()> {
        let config = ConfigManager::from_content(SAMPLE)?.app_config()?;

        assert_eq!(config.login, LoginConfig {
            username: "8208190101".to_string(),
            password: "secret".to_string(),
            semester: "202420252".to_string(),
        });

        let ids: Vec<_> = config.courses.iter().map(|c| (c.course_id.as_str(), c.kind)).collect();
        assert_eq!(ids, vec![
            ("000101", CourseKind::Public),
            ("000102", CourseKind::Public),
            ("000901", CourseKind::Required),
        ]);
        assert!(config.courses[2].url.contains("bxqjhxkOper?jx0404id=202420252000901"));
        assert_eq!(config.settings, PortalSettings::default());
        Ok(())
    }

    #[test]
    fn counts_default_to_zero() -> Result<()> {
        let manager = ConfigManager::from_content("[config]\nusername=a\npassword=b\ntime=c\n")?;
        assert!(manager.course_configs()?.is_empty());
        Ok(())
    }

    #[test]
    fn optional_settings_override_defaults() -> Result<()> {
        let manager = ConfigManager::from_content(&format!(
            "{}base_url = http://127.0.0.1:9000/\ninterval_ms = 20\ntimeout_secs = 3\nmax_attempts = 7\ncaptcha_path = out/c.jpg\n",
            SAMPLE
        ))?;
        let config = manager.app_config()?;

        assert_eq!(config.settings.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.settings.retry_interval, Duration::from_millis(20));
        assert_eq!(config.settings.request_timeout, Some(Duration::from_secs(3)));
        assert_eq!(config.settings.max_attempts, Some(7));
        assert_eq!(config.settings.captcha_path, PathBuf::from("out/c.jpg"));
        assert!(config.courses[0].url.starts_with("http://127.0.0.1:9000/jsxsd/"));
        Ok(())
    }

    #[test]
    fn missing_id_is_reported_by_key() {
        let manager = ConfigManager::from_content("[config]\nusername=a\npassword=b\ntime=c\nnum1=2\nid1=1\n").unwrap();
        let err = manager.course_configs().unwrap_err();
        assert!(err.to_string().contains("id2"), "{}", err);
    }

    #[test]
    fn non_numeric_count_is_rejected() {
        let manager = ConfigManager::from_content("[config]\nusername=a\npassword=b\ntime=c\nnum1=two\n").unwrap();
        let err = manager.course_configs().unwrap_err();
        assert!(err.to_string().contains("num1"), "{}", err);
    }

    #[test]
    fn missing_section_and_credentials_are_errors() {
        let manager = ConfigManager::from_content("[other]\na=1\n").unwrap();
        assert!(manager.login_config().unwrap_err().to_string().contains("[config]"));

        let manager = ConfigManager::from_content("[config]\nusername=a\ntime=c\n").unwrap();
        assert!(manager.login_config().unwrap_err().to_string().contains("password"));
    }

    #[test]
    fn zero_max_attempts_is_rejected() {
        let manager = ConfigManager::from_content(&format!("{}max_attempts = 0\n", SAMPLE)).unwrap();
        let err = manager.settings().unwrap_err();
        assert!(err.to_string().contains("max_attempts"), "{}", err);
        assert!(manager.app_config().is_err());
    }

    #[test]
    fn bom_comments_and_key_case_are_tolerated() -> Result<()> {
        let manager = ConfigManager::from_content(
            "\u{feff}; saved by notepad\n[config]\n# account\nUserName = 8208190101\nPassword: secret\nTIME = 202420252\n",
        )?;

        let login = manager.login_config()?;
        assert_eq!(login.username, "8208190101");
        assert_eq!(login.password, "secret");
        assert_eq!(login.semester, "202420252");
        Ok(())
    }
}
