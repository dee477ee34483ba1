use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::utils::file_utils;
use super::query::group_by_teacher;
use super::types::ScrapedCourse;

const CSV_HEADER: &str = "course_name,teacher_name,teacher_id,weekday,period,room,class_name,enrollment,credit_hours,jx0404id";

/// Write courses as a pretty JSON array
pub fn save_to_json(courses: &[ScrapedCourse], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(courses).context("Failed to serialize courses")?;
    file_utils::write_string_to_file(path, &json)?;
    info!("Saved {} courses to {}", courses.len(), path.display());
    Ok(())
}

/// Write courses as CSV with a header row
pub fn save_to_csv(courses: &[ScrapedCourse], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    file_utils::write_string_to_file(path, &to_csv(courses))?;
    info!("Saved {} courses to {}", courses.len(), path.display());
    Ok(())
}

/// Render courses as CSV
pub fn to_csv(courses: &[ScrapedCourse]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for course in courses {
        let fields = [
            course.course_name.clone(),
            course.teacher_name.clone(),
            course.teacher_id.clone(),
            course.weekday.to_string(),
            course.period.clone(),
            course.room.clone().unwrap_or_default(),
            course.class_name.clone().unwrap_or_default(),
            course.enrollment.map(|n| n.to_string()).unwrap_or_default(),
            course.credit_hours.map(|h| h.to_string()).unwrap_or_default(),
            course.jx0404id.clone().unwrap_or_default(),
        ];
        let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Human-readable listing of courses
pub fn format_course_info(courses: &[ScrapedCourse]) -> String {
    if courses.is_empty() {
        return "No courses found.\n".to_string();
    }

    let mut out = String::new();
    for (i, course) in courses.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, course.course_name));
        out.push_str(&format!("   teacher:    {} ({})\n", course.teacher_name, course.teacher_id));
        out.push_str(&format!("   time:       {} {}\n", course.weekday_label(), course.period));
        if let Some(room) = &course.room {
            out.push_str(&format!("   room:       {}\n", room));
        }
        if let Some(class_name) = &course.class_name {
            out.push_str(&format!("   class:      {}\n", class_name));
        }
        if let Some(enrollment) = course.enrollment {
            out.push_str(&format!("   enrollment: {}\n", enrollment));
        }
        if let Some(hours) = course.credit_hours {
            out.push_str(&format!("   credits:    {}\n", hours));
        }
        if let Some(id) = &course.jx0404id {
            out.push_str(&format!("   jx0404id:   {}\n", id));
        }
    }
    out
}

/// Tab-separated summary of the online courses, one per line
pub fn online_summary(courses: &[ScrapedCourse]) -> String {
    let mut out = String::from("jx0404id\tcourse\tteacher\troom\tenrollment\n");
    for course in courses.iter().filter(|c| c.is_online()) {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\n",
            course.jx0404id.as_deref().unwrap_or("-"),
            course.course_name,
            course.teacher_name,
            course.room.as_deref().unwrap_or("-"),
            course.enrollment.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string()),
        ));
    }
    out
}

/// Write the online course summary
pub fn save_summary(courses: &[ScrapedCourse], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    file_utils::write_string_to_file(path, &online_summary(courses))?;
    info!("Saved online course summary to {}", path.display());
    Ok(())
}

/// Write one `teacher_<name>_courses.json` per teacher into `dir`
pub fn save_per_teacher(courses: &[ScrapedCourse], dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    file_utils::ensure_dir_exists(dir)?;

    let mut written = Vec::new();
    for (teacher, group) in group_by_teacher(courses) {
        let owned: Vec<ScrapedCourse> = group.into_iter().cloned().collect();
        let path = dir.join(format!("teacher_{}_courses.json", file_utils::sanitize_file_component(teacher)));
        save_to_json(&owned, &path)?;
        written.push(path);
    }
    Ok(written)
}
