use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::types::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};

/// Room markers of courses that are taught online
const ONLINE_MARKERS: [&str; 5] = ["网络", "在线", "线上", "慕课", "mooc"];

const WEEKDAYS: [&str; 7] = ["星期一", "星期二", "星期三", "星期四", "星期五", "星期六", "星期日"];

/// A teacher listed on the timetable lookup page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Teacher {
    /// Portal id (`jg0101id`)
    pub id: String,

    /// Display name
    pub name: String,
}

impl Teacher {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }
}

/// One course slot scraped from a teacher's timetable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedCourse {
    /// Name of the course
    pub course_name: String,

    /// Number of enrolled students, if shown
    pub enrollment: Option<u32>,

    /// Day of week, 1 = Monday
    pub weekday: u8,

    /// Period label from the row header
    pub period: String,

    /// Classroom, or the online platform for online courses
    pub room: Option<String>,

    /// Credit hours, if shown
    pub credit_hours: Option<f64>,

    /// Class the course is taught to
    pub class_name: Option<String>,

    pub teacher_name: String,
    pub teacher_id: String,

    /// Teaching class id used by the enrollment endpoints
    #[serde(default)]
    pub jx0404id: Option<String>,
}

impl ScrapedCourse {
    /// Whether the room marks this as an online course
    pub fn is_online(&self) -> bool {
        self.room.as_deref().is_some_and(|room| {
            let room = room.to_lowercase();
            ONLINE_MARKERS.iter().any(|marker| room.contains(marker))
        })
    }

    /// Chinese weekday name, or the raw number when out of range
    pub fn weekday_label(&self) -> String {
        match self.weekday {
            1..=7 => WEEKDAYS[usize::from(self.weekday) - 1].to_string(),
            other => other.to_string(),
        }
    }
}

/// Everything scraped for one semester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseCatalog {
    /// Semester the timetables belong to, e.g. `2024-2025-2`
    pub semester: String,

    /// When the scrape finished
    pub fetched_at: DateTime<Utc>,

    pub courses: Vec<ScrapedCourse>,
}

impl CourseCatalog {
    /// Create an empty catalog stamped with the current time
    pub fn new(semester: impl Into<String>) -> Self {
        Self {
            semester: semester.into(),
            fetched_at: Utc::now(),
            courses: Vec::new(),
        }
    }

    /// Courses taught online
    pub fn online_courses(&self) -> impl Iterator<Item = &ScrapedCourse> {
        self.courses.iter().filter(|c| c.is_online())
    }
}

/// Settings for scraping timetables
#[derive(Debug, Clone)]
pub struct FinderOptions {
    /// Scheme and host of the portal
    pub base_url: String,

    /// Semester to look up, e.g. `2024-2025-2`
    pub semester: String,

    /// Raw `Cookie` header copied from a browser session
    pub cookie: Option<String>,

    /// Timetables fetched at the same time
    pub concurrency: usize,

    pub user_agent: String,

    pub request_timeout: Option<Duration>,
}

impl FinderOptions {
    /// Options for one semester with everything else defaulted
    pub fn new(semester: impl Into<String>) -> Self {
        Self {
            semester: semester.into(),
            ..Self::default()
        }
    }
}

impl Default for FinderOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            semester: String::new(),
            cookie: None,
            concurrency: std::cmp::max(2, num_cpus::get() * 2),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// Statistics about one scrape
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinderStats {
    /// Teachers listed on the lookup page
    pub total_teachers: usize,

    /// Timetables downloaded
    pub fetched_timetables: usize,

    /// Timetables without any course
    pub empty_timetables: usize,

    /// Teachers whose timetable could not be fetched
    pub failed_teachers: Vec<Teacher>,

    /// Course slots found
    pub total_courses: usize,
}

impl FinderStats {
    /// Percentage of teachers whose timetable was fetched
    pub fn success_rate(&self) -> f64 {
        if self.total_teachers == 0 {
            return 0.0;
        }

        (self.fetched_timetables as f64 / self.total_teachers as f64) * 100.0
    }
}

/// Result of a scrape
#[derive(Debug, Clone)]
pub struct FinderResult {
    pub catalog: CourseCatalog,
    pub stats: FinderStats,
}

#[cfg(test)]
pub(crate) fn sample_course(name: &str, teacher: &str, room: Option<&str>) -> ScrapedCourse {
    ScrapedCourse {
        course_name: name.to_string(),
        enrollment: Some(30),
        weekday: 1,
        period: "第一大节".to_string(),
        room: room.map(str::to_string),
        credit_hours: Some(2.0),
        class_name: Some("计科2101".to_string()),
        teacher_name: teacher.to_string(),
        teacher_id: format!("id-{}", teacher),
        jx0404id: None,
    }
}
