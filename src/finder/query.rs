use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use anyhow::{Result, bail};
use serde::Serialize;

use super::types::ScrapedCourse;

/// Field to order query results by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Teacher,
    Enrollment,
    Credits,
    Weekday,
}

impl FromStr for SortField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(SortField::Name),
            "teacher" => Ok(SortField::Teacher),
            "enrollment" => Ok(SortField::Enrollment),
            "credits" => Ok(SortField::Credits),
            "weekday" => Ok(SortField::Weekday),
            other => bail!("Unknown sort field: {} (expected name, teacher, enrollment, credits, or weekday)", other),
        }
    }
}

/// Options for querying scraped courses
#[derive(Debug, Clone, Default)]
pub struct CourseQuery {
    /// Substring of the course name
    pub name: Option<String>,

    /// Substring of the teacher name
    pub teacher: Option<String>,

    /// Keep courses with strictly more credit hours than this
    pub min_credit_hours: Option<f64>,

    /// Substring of the room
    pub location: Option<String>,

    /// Keep only online courses
    pub online_only: bool,

    /// Sort results by this field
    pub sort_by: Option<SortField>,

    /// Sort in descending order
    pub descending: bool,

    /// Maximum number of results to return
    pub limit: Option<usize>,
}

impl CourseQuery {
    fn matches(&self, course: &ScrapedCourse) -> bool {
        if let Some(name) = &self.name {
            if !course.course_name.contains(name.as_str()) {
                return false;
            }
        }

        if let Some(teacher) = &self.teacher {
            if !course.teacher_name.contains(teacher.as_str()) {
                return false;
            }
        }

        if let Some(min) = self.min_credit_hours {
            if !course.credit_hours.is_some_and(|hours| hours > min) {
                return false;
            }
        }

        if let Some(location) = &self.location {
            if !course.room.as_deref().is_some_and(|room| room.contains(location.as_str())) {
                return false;
            }
        }

        !self.online_only || course.is_online()
    }
}

/// Run a query over scraped courses
pub fn query<'a>(courses: &'a [ScrapedCourse], options: &CourseQuery) -> Vec<&'a ScrapedCourse> {
    let mut results: Vec<&ScrapedCourse> = courses.iter().filter(|c| options.matches(c)).collect();

    if let Some(sort_by) = options.sort_by {
        results.sort_by(|a, b| {
            let ordering = match sort_by {
                SortField::Name => a.course_name.cmp(&b.course_name),
                SortField::Teacher => a.teacher_name.cmp(&b.teacher_name),
                SortField::Enrollment => a.enrollment.cmp(&b.enrollment),
                SortField::Credits => a
                    .credit_hours
                    .unwrap_or(0.0)
                    .total_cmp(&b.credit_hours.unwrap_or(0.0)),
                SortField::Weekday => a.weekday.cmp(&b.weekday).then_with(|| a.period.cmp(&b.period)),
            };
            if options.descending { ordering.reverse() } else { ordering }
        });
    }

    if let Some(limit) = options.limit {
        results.truncate(limit);
    }

    results
}

/// Courses whose name contains `keyword`
pub fn search_by_name<'a>(courses: &'a [ScrapedCourse], keyword: &str) -> Vec<&'a ScrapedCourse> {
    query(courses, &CourseQuery {
        name: Some(keyword.to_string()),
        ..CourseQuery::default()
    })
}

/// Courses whose teacher name contains `keyword`
pub fn search_by_teacher<'a>(courses: &'a [ScrapedCourse], keyword: &str) -> Vec<&'a ScrapedCourse> {
    query(courses, &CourseQuery {
        teacher: Some(keyword.to_string()),
        ..CourseQuery::default()
    })
}

/// Courses keyed by teacher name, teachers sorted
pub fn group_by_teacher(courses: &[ScrapedCourse]) -> BTreeMap<&str, Vec<&ScrapedCourse>> {
    let mut groups: BTreeMap<&str, Vec<&ScrapedCourse>> = BTreeMap::new();
    for course in courses.iter().filter(|c| !c.teacher_name.is_empty()) {
        groups.entry(course.teacher_name.as_str()).or_default().push(course);
    }
    groups
}

/// Counts over a set of scraped courses
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub total_courses: usize,
    pub teachers: usize,
    pub locations: usize,
    pub online_courses: usize,
}

impl CatalogStats {
    pub fn from_courses(courses: &[ScrapedCourse]) -> Self {
        let teachers: BTreeSet<&str> = courses
            .iter()
            .map(|c| c.teacher_name.as_str())
            .filter(|name| !name.is_empty())
            .collect();
        let locations: BTreeSet<&str> = courses
            .iter()
            .filter_map(|c| c.room.as_deref())
            .collect();

        Self {
            total_courses: courses.len(),
            teachers: teachers.len(),
            locations: locations.len(),
            online_courses: courses.iter().filter(|c| c.is_online()).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::finder::types::sample_course;

    fn courses() -> Vec<ScrapedCourse> {
        let mut a = sample_course("高等数学", "张三", Some("教学楼A101"));
        a.credit_hours = Some(4.0);
        a.enrollment = Some(120);
        let mut b = sample_course("线性代数", "李四", Some("网络教学"));
        b.credit_hours = Some(2.0);
        b.enrollment = Some(60);
        let mut c = sample_course("数学建模", "张四", Some("教学楼B202"));
        c.credit_hours = Some(3.0);
        c.enrollment = None;
        vec![a, b, c]
    }

    #[test]
    fn name_and_teacher_search() {
        let courses = courses();

        let names: Vec<_> = search_by_name(&courses, "数学").iter().map(|c| c.course_name.as_str()).collect();
        assert_eq!(names, vec!["高等数学", "数学建模"]);

        let names: Vec<_> = search_by_teacher(&courses, "张").iter().map(|c| c.course_name.as_str()).collect();
        assert_eq!(names, vec!["高等数学", "数学建模"]);
    }

    #[test]
    fn combined_filters_sort_and_limit() {
        let courses = courses();
        let results = query(&courses, &CourseQuery {
            min_credit_hours: Some(2.0),
            location: Some("教学楼".to_string()),
            sort_by: Some(SortField::Credits),
            descending: false,
            ..CourseQuery::default()
        });
        let names: Vec<_> = results.iter().map(|c| c.course_name.as_str()).collect();
        assert_eq!(names, vec!["数学建模", "高等数学"]);

        let results = query(&courses, &CourseQuery {
            sort_by: Some(SortField::Enrollment),
            descending: true,
            limit: Some(1),
            ..CourseQuery::default()
        });
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].course_name, "高等数学");
    }

    #[test]
    fn online_only_filter() {
        let courses = courses();
        let results = query(&courses, &CourseQuery { online_only: true, ..CourseQuery::default() });
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].course_name, "线性代数");
    }

    #[test]
    fn grouping_and_stats() {
        let courses = courses();
        let groups = group_by_teacher(&courses);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups["张三"].len(), 1);
        assert!(groups.contains_key("李四"));

        assert_eq!(CatalogStats::from_courses(&courses), CatalogStats {
            total_courses: 3,
            teachers: 3,
            locations: 3,
            online_courses: 1,
        });
    }

    #[test]
    fn sort_field_parsing() {
        assert_eq!("Credits".parse::<SortField>().unwrap(), SortField::Credits);
        assert!("room".parse::<SortField>().is_err());
    }
}
