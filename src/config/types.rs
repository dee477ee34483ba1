use std::path::PathBuf;
use std::time::Duration;

/// Portal used when the config file does not name one
pub const DEFAULT_BASE_URL: &str = "http://csujwc.its.csu.edu.cn";

/// Browser identity sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36 Edg/138.0.0.0";

/// Delay between two polls of the same endpoint
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Where the captcha image is written for the user to look at
pub const DEFAULT_CAPTCHA_PATH: &str = "code.jpg";

/// Credentials used to log into the portal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginConfig {
    /// Student number
    pub username: String,

    /// Portal password
    pub password: String,

    /// Semester prefix of every jx0404id, stored under the `time` key
    pub semester: String,
}

/// Which enrollment endpoint a course goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourseKind {
    /// Public electives, listed as `id1..idN`
    Public,

    /// Required courses of the study plan, listed as `id_1..id_N`
    Required,
}

impl CourseKind {
    /// Name of the enrollment operation on the portal
    pub fn oper_path(&self) -> &'static str {
        match self {
            CourseKind::Public => "ggxxkxkOper",
            CourseKind::Required => "bxqjhxkOper",
        }
    }

    /// Short tag used in logs and summaries
    pub fn label(&self) -> &'static str {
        match self {
            CourseKind::Public => "public",
            CourseKind::Required => "required",
        }
    }

    /// Build the enrollment URL for one course of this kind
    pub fn enrollment_url(&self, base_url: &str, semester: &str, course_id: &str) -> String {
        format!(
            "{}/jsxsd/xsxkkc/{}?jx0404id={}{}&xkzy=&trjf=",
            base_url.trim_end_matches('/'),
            self.oper_path(),
            semester,
            course_id
        )
    }
}

impl std::fmt::Display for CourseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One course to enroll in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseConfig {
    /// Course id as written in the config, without the semester prefix
    pub course_id: String,

    /// Category tag
    pub kind: CourseKind,

    /// Enrollment URL derived from the base URL, semester, and id
    pub url: String,
}

impl CourseConfig {
    /// Create a course entry and derive its enrollment URL
    pub fn new(course_id: impl Into<String>, kind: CourseKind, base_url: &str, semester: &str) -> Self {
        let course_id = course_id.into();
        let url = kind.enrollment_url(base_url, semester, &course_id);
        Self { course_id, kind, url }
    }
}

/// How the portal client behaves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalSettings {
    /// Scheme and host of the portal, without a trailing slash
    pub base_url: String,

    /// Fixed delay between retries
    pub retry_interval: Duration,

    /// File the captcha image is saved to
    pub captcha_path: PathBuf,

    /// User-Agent header
    pub user_agent: String,

    /// Per-request timeout; none means wait for the server
    pub request_timeout: Option<Duration>,

    /// Upper bound on polls per loop; none means retry forever
    pub max_attempts: Option<u32>,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            retry_interval: DEFAULT_RETRY_INTERVAL,
            captcha_path: PathBuf::from(DEFAULT_CAPTCHA_PATH),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: None,
            max_attempts: None,
        }
    }
}

/// Everything read from the config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub login: LoginConfig,
    pub courses: Vec<CourseConfig>,
    pub settings: PortalSettings,
}

impl AppConfig {
    /// Courses of one kind, in config order
    pub fn courses_of(&self, kind: CourseKind) -> impl Iterator<Item = &CourseConfig> {
        self.courses.iter().filter(move |c| c.kind == kind)
    }

    /// Re-derive every course URL, e.g. after the base URL was overridden
    pub fn rebuild_urls(&mut self) {
        for course in &mut self.courses {
            course.url = course.kind.enrollment_url(
                &self.settings.base_url,
                &self.login.semester,
                &course.course_id,
            );
        }
    }
}
