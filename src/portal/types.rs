use std::fmt;

use crate::config::CourseConfig;

/// Endpoints of the registration portal, resolved against one base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalUrls {
    pub base: String,
    pub verify_code: String,
    pub login: String,
    pub main: String,
    pub course_list: String,
}

impl PortalUrls {
    /// Resolve every endpoint against `base`
    pub fn new(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            verify_code: format!("{}/jsxsd/verifycode.servlet", base),
            login: format!("{}/jsxsd/xk/LoginToXk", base),
            main: format!("{}/jsxsd/framework/xsMain.jsp", base),
            course_list: format!("{}/jsxsd/xsxk/xklc_list", base),
            base,
        }
    }

    /// Resolve a link found in a portal page
    pub fn resolve(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{}", self.base, href)
        } else {
            format!("{}/{}", self.base, href)
        }
    }
}

/// How one grab loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrabOutcome {
    /// The portal accepted the enrollment
    Success,

    /// Rejected because of a timetable conflict
    Conflict(String),

    /// This teaching class is already selected
    AlreadySelected(String),

    /// No course exists for this id
    NotFound,

    /// Gave up after the configured number of attempts
    Exhausted,
}

impl GrabOutcome {
    /// Whether the course ended up enrolled
    pub fn is_success(&self) -> bool {
        matches!(self, GrabOutcome::Success)
    }

    /// Whether the class is held after the run, newly enrolled or from before
    pub fn is_held(&self) -> bool {
        matches!(self, GrabOutcome::Success | GrabOutcome::AlreadySelected(_))
    }
}

impl fmt::Display for GrabOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrabOutcome::Success => write!(f, "enrolled"),
            GrabOutcome::Conflict(msg) => write!(f, "conflict: {}", msg),
            GrabOutcome::AlreadySelected(msg) => write!(f, "already selected: {}", msg),
            GrabOutcome::NotFound => write!(f, "no course with this id"),
            GrabOutcome::Exhausted => write!(f, "gave up"),
        }
    }
}

/// Result of grabbing one course
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrabResult {
    pub course: CourseConfig,
    pub outcome: GrabOutcome,

    /// Number of enrollment requests sent, failed ones included
    pub attempts: u32,
}

/// Results of one grab run, in config order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrabReport {
    pub results: Vec<GrabResult>,
}

impl GrabReport {
    /// Number of courses that were enrolled
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_success()).count()
    }

    /// Number of courses that were already selected before this run
    pub fn already_selected(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, GrabOutcome::AlreadySelected(_)))
            .count()
    }

    /// Number of courses not held: conflicts, unknown ids, and loops that gave up
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.outcome.is_held()).count()
    }

    /// Look up the result for a course id
    pub fn get(&self, course_id: &str) -> Option<&GrabResult> {
        self.results.iter().find(|r| r.course.course_id == course_id)
    }
}

impl fmt::Display for GrabReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            writeln!(
                f,
                "[{}] {}: {} ({} attempts)",
                result.course.kind, result.course.course_id, result.outcome, result.attempts
            )?;
        }
        write!(
            f,
            "{} enrolled, {} already selected, {} not enrolled",
            self.succeeded(),
            self.already_selected(),
            self.failed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolves_relative_and_absolute_links() {
        let urls = PortalUrls::new("http://portal.test/");
        assert_eq!(urls.login, "http://portal.test/jsxsd/xk/LoginToXk");
        assert_eq!(urls.resolve("/jsxsd/xsxk/xsxk_index?jx0502zbid=1"), "http://portal.test/jsxsd/xsxk/xsxk_index?jx0502zbid=1");
        assert_eq!(urls.resolve("jsxsd/a"), "http://portal.test/jsxsd/a");
        assert_eq!(urls.resolve("https://other.test/x"), "https://other.test/x");
    }

    fn result(id: &str, outcome: GrabOutcome) -> GrabResult {
        GrabResult {
            course: CourseConfig::new(id, crate::config::CourseKind::Public, "http://portal.test", "202420252"),
            outcome,
            attempts: 1,
        }
    }

    #[test]
    fn already_selected_courses_are_not_failures() {
        let report = GrabReport {
            results: vec![
                result("000101", GrabOutcome::Success),
                result("000102", GrabOutcome::AlreadySelected("当前教学班已选择！".to_string())),
                result("000103", GrabOutcome::Conflict("时间冲突".to_string())),
                result("000104", GrabOutcome::NotFound),
                result("000105", GrabOutcome::Exhausted),
            ],
        };

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.already_selected(), 1);
        assert_eq!(report.failed(), 3);
        assert!(report.to_string().ends_with("1 enrolled, 1 already selected, 3 not enrolled"));
    }
}
