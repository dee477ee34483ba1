#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use course_grabber::config::{ConfigManager, CourseKind, save_config};

    #[test]
    fn test_config_file_parsing() -> Result<()> {
        // Create a temporary config file
        let temp_dir = tempdir()?;
        let file_path = temp_dir.path().join("config.ini");

        let content = "\u{feff}; saved by notepad
[config]
Username = 8208220101
password = p@ss = word
time = 202420252

# public electives
num1 = 2
id1 = 000101
id2 = 000102
num2 = 0
";
        fs::write(&file_path, content)?;

        let manager = ConfigManager::load(&file_path)?;
        assert_eq!(manager.path(), Some(file_path.as_path()));

        let login = manager.login_config()?;
        assert_eq!(login.username, "8208220101");
        assert_eq!(login.password, "p@ss = word");

        let ids: Vec<_> = manager.course_configs()?.into_iter().map(|c| c.course_id).collect();
        assert_eq!(ids, vec!["000101".to_string(), "000102".to_string()]);

        Ok(())
    }

    #[test]
    fn test_config_manager_integration() -> Result<()> {
        let temp_dir = tempdir()?;
        let file_path = temp_dir.path().join("config.ini");

        fs::write(&file_path, "\
[config]
username = 8208220101
password = secret
time = 202420252
num1 = 1
id1 = 000101
num2 = 2
id_1 = 000900
id_2 = 000901
base_url = http://portal.test/
interval_ms = 250
max_attempts = 40
")?;

        let config = ConfigManager::load(&file_path)?.app_config()?;

        assert_eq!(config.login.semester, "202420252");
        assert_eq!(config.settings.base_url, "http://portal.test");
        assert_eq!(config.settings.retry_interval, Duration::from_millis(250));
        assert_eq!(config.settings.max_attempts, Some(40));

        let kinds: Vec<_> = config.courses.iter().map(|c| (c.course_id.as_str(), c.kind)).collect();
        assert_eq!(kinds, vec![
            ("000101", CourseKind::Public),
            ("000900", CourseKind::Required),
            ("000901", CourseKind::Required),
        ]);
        assert_eq!(
            config.courses[1].url,
            "http://portal.test/jsxsd/xsxkkc/bxqjhxkOper?jx0404id=202420252000900&xkzy=&trjf="
        );

        // Written back out and read again, nothing changes
        let copy = temp_dir.path().join("copy.ini");
        save_config(&config, &copy)?;
        assert_eq!(ConfigManager::load(&copy)?.app_config()?, config);

        Ok(())
    }

    #[test]
    fn test_missing_course_id_is_reported() -> Result<()> {
        let err = ConfigManager::from_content("\
[config]
username = a
password = b
time = 202420252
num1 = 2
id1 = 000101
")?
        .app_config()
        .unwrap_err();

        assert!(err.to_string().contains("id2"), "{}", err);
        Ok(())
    }
}
