use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Result;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use crate::config::{ConfigManager, CourseKind, save_config};
use crate::finder::{CatalogStorage, CourseCatalog, Teacher, generate_config, parse_teacher_list, parse_timetable};

// Helper function to write a config file into a test directory
fn write_config(dir: &Path, content: &str) -> Result<PathBuf> {
    let path = dir.join("config.ini");
    fs::write(&path, content)?;
    Ok(path)
}

const TEACHER_PAGE: &str = r#"
<form>
  <select name="jg0101id">
    <option value="">--请选择--</option>
    <option value="0000197">宋力</option>
    <option value="0000350">陈静</option>
  </select>
</form>"#;

const SONG_TIMETABLE: &str = r#"
<table id="kbtable">
  <tr><th>&nbsp;</th><th>星期一</th><th>星期二</th><th>星期三</th><th>星期四</th><th>星期五</th><th>星期六</th><th>星期日</th></tr>
  <tr>
    <td>第一大节</td>
    <td><div class="kbcontent"><a href="javascript:void(0)" onclick="xk('jx0404id=202420252000301')"></a>数据结构<br>(88人)<br>计科2201<br>4.0学分<br>A座305</div></td>
    <td></td><td></td><td></td><td></td><td></td><td></td>
  </tr>
  <tr>
    <td>第五大节</td>
    <td></td><td></td><td></td><td></td><td></td><td></td>
    <td><div class="kbcontent" data-jx0404id="202420252000411">人工智能导论<br>(200人)<br>全校公选<br>2学分<br>网络教学</div></td>
  </tr>
</table>"#;

#[test]
fn scraped_online_course_lands_in_generated_config() -> Result<()> {
    let test_dir = tempdir()?;

    // Existing config with credentials and one required course
    let config_path = write_config(test_dir.path(), "\
[config]
username = 8208220101
password = secret
time = 202420252
num1 = 1
id1 = 000001
num2 = 1
id_1 = 000900
")?;

    // Scrape: teacher list, then one timetable
    let teachers = parse_teacher_list(TEACHER_PAGE);
    assert_eq!(teachers, vec![Teacher::new("0000197", "宋力"), Teacher::new("0000350", "陈静")]);

    let courses = parse_timetable(SONG_TIMETABLE, &teachers[0]);
    assert_eq!(courses.len(), 2);
    assert_eq!(courses[0].jx0404id.as_deref(), Some("202420252000301"));
    assert_eq!(courses[0].credit_hours, Some(4.0));
    assert_eq!(courses[1].weekday, 7);
    assert_eq!(courses[1].enrollment, Some(200));
    assert!(courses[1].is_online());

    let mut catalog = CourseCatalog::new("2024-2025-2");
    catalog.courses = courses;
    let storage = CatalogStorage::new(test_dir.path().join("all_courses.json"));
    storage.save(&catalog)?;

    // Regenerate and reload
    let base = ConfigManager::load(&config_path)?.app_config()?;
    let generated = generate_config(&storage.load()?, &base);
    let output = test_dir.path().join("generated.ini");
    save_config(&generated.config, &output)?;

    let reloaded = ConfigManager::load(&output)?.app_config()?;
    let ids: Vec<_> = reloaded.courses.iter().map(|c| (c.course_id.as_str(), c.kind)).collect();
    assert_eq!(ids, vec![("000411", CourseKind::Public), ("000900", CourseKind::Required)]);
    assert_eq!(reloaded.login, base.login);
    assert!(reloaded.courses[0].url.ends_with("ggxxkxkOper?jx0404id=202420252000411&xkzy=&trjf="));

    Ok(())
}

#[test]
fn grabber_refuses_config_without_courses() -> Result<()> {
    let config = ConfigManager::from_content("[config]\nusername=a\npassword=b\ntime=c\nnum1=0\n")?.app_config()?;

    let err = crate::portal::Grabber::new(config).unwrap_err();
    assert!(err.to_string().contains("No course ids configured"));
    Ok(())
}
