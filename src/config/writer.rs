use std::path::Path;
use anyhow::Result;
use log::info;

use crate::utils::file_utils;
use super::loader::CONFIG_SECTION;
use super::types::{AppConfig, CourseKind, PortalSettings};

/// Render a config as INI text that `ConfigManager` reads back unchanged
pub fn render_ini(config: &AppConfig) -> String {
    let mut out = String::new();
    let defaults = PortalSettings::default();
    let settings = &config.settings;

    out.push_str(&format!("[{}]\n", CONFIG_SECTION));
    out.push_str(&format!("username = {}\n", config.login.username));
    out.push_str(&format!("password = {}\n", config.login.password));
    out.push_str(&format!("time = {}\n", config.login.semester));

    let public: Vec<_> = config.courses_of(CourseKind::Public).collect();
    out.push_str("\n# public electives\n");
    out.push_str(&format!("num1 = {}\n", public.len()));
    for (i, course) in public.iter().enumerate() {
        out.push_str(&format!("id{} = {}\n", i + 1, course.course_id));
    }

    let required: Vec<_> = config.courses_of(CourseKind::Required).collect();
    out.push_str("\n# required courses\n");
    out.push_str(&format!("num2 = {}\n", required.len()));
    for (i, course) in required.iter().enumerate() {
        out.push_str(&format!("id_{} = {}\n", i + 1, course.course_id));
    }

    if settings != &defaults {
        out.push_str("\n# portal settings\n");
    }
    if settings.base_url != defaults.base_url {
        out.push_str(&format!("base_url = {}\n", settings.base_url));
    }
    if settings.retry_interval != defaults.retry_interval {
        out.push_str(&format!("interval_ms = {}\n", settings.retry_interval.as_millis()));
    }
    if settings.captcha_path != defaults.captcha_path {
        out.push_str(&format!("captcha_path = {}\n", settings.captcha_path.display()));
    }
    if settings.user_agent != defaults.user_agent {
        out.push_str(&format!("user_agent = {}\n", settings.user_agent));
    }
    if let Some(timeout) = settings.request_timeout {
        out.push_str(&format!("timeout_secs = {}\n", timeout.as_secs()));
    }
    if let Some(attempts) = settings.max_attempts {
        out.push_str(&format!("max_attempts = {}\n", attempts));
    }

    out
}

/// Write a config to disk
pub fn save_config(config: &AppConfig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    file_utils::write_string_to_file(path, &render_ini(config))?;
    info!("Wrote config with {} courses to {}", config.courses.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use crate::config::{ConfigManager, CourseConfig, LoginConfig};

    fn sample() -> AppConfig {
        let mut settings = PortalSettings::default();
        settings.base_url = "http://localhost:1234".to_string();
        settings.retry_interval = Duration::from_millis(50);
        settings.max_attempts = Some(3);

        let login = LoginConfig {
            username: "u".to_string(),
            password: "p".to_string(),
            semester: "202420252".to_string(),
        };
        let courses = vec![
            CourseConfig::new("1", CourseKind::Public, &settings.base_url, &login.semester),
            CourseConfig::new("2", CourseKind::Required, &settings.base_url, &login.semester),
            CourseConfig::new("3", CourseKind::Public, &settings.base_url, &login.semester),
        ];

        AppConfig { login, courses, settings }
    }

    #[test]
    fn saved_config_loads_back() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.ini");
        let config = sample();

        save_config(&config, &path)?;
        let loaded = ConfigManager::load(&path)?.app_config()?;

        // Loading groups public courses before required ones
        let mut expected = config.clone();
        expected.courses.sort_by_key(|c| c.kind == CourseKind::Required);
        assert_eq!(loaded, expected);
        Ok(())
    }

    #[test]
    fn default_settings_are_not_written() {
        let mut config = sample();
        config.settings = PortalSettings::default();

        let text = render_ini(&config);
        assert!(!text.contains("base_url"));
        assert!(!text.contains("portal settings"));
        assert!(text.contains("num1 = 2"));
        assert!(text.contains("id_1 = 2"));
    }
}
