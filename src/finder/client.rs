use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, ORIGIN, REFERER};
use reqwest::Client;

use super::parser::{parse_teacher_list, parse_timetable};
use super::progress::ProgressTracker;
use super::types::{CourseCatalog, FinderOptions, FinderResult, FinderStats, Teacher};

const TEACHER_LIST_PATH: &str = "/jiaowu/pkgl/llsykb/llsykb_find_jg0101.jsp";
const TIMETABLE_PATH: &str = "/jiaowu/pkgl/llsykb/llsykb_kb.jsp";

/// Scrapes teacher timetables from the public timetable lookup pages
#[derive(Debug)]
pub struct CourseFinder {
    client: Client,
    options: FinderOptions,
    progress_tracker: ProgressTracker,
}

impl CourseFinder {
    /// Build a finder and its HTTP client
    pub fn new(options: FinderOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &options.cookie {
            headers.insert(
                COOKIE,
                HeaderValue::from_str(cookie).context("Cookie is not a valid header value")?,
            );
        }

        let mut builder = Client::builder()
            .cookie_store(true)
            .user_agent(options.user_agent.clone())
            .default_headers(headers);
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build().context("Failed to build HTTP client")?,
            options,
            progress_tracker: ProgressTracker::new(),
        })
    }

    /// Options this finder was built with
    pub fn options(&self) -> &FinderOptions {
        &self.options
    }

    fn base(&self) -> &str {
        self.options.base_url.trim_end_matches('/')
    }

    /// URL of the teacher lookup page for the configured semester
    pub fn teacher_list_url(&self) -> String {
        format!(
            "{}{}?xnxq01id={}&init=1&isview=1",
            self.base(),
            TEACHER_LIST_PATH,
            self.options.semester
        )
    }

    /// Download and parse the list of teachers
    pub async fn fetch_teachers(&self) -> Result<Vec<Teacher>> {
        let url = self.teacher_list_url();
        debug!("Fetching teacher list from {}", url);

        let html = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to request teacher list")?
            .error_for_status()
            .context("Teacher list request was refused")?
            .text()
            .await
            .context("Failed to read teacher list")?;

        Ok(parse_teacher_list(&html))
    }

    /// Download the timetable page of one teacher
    pub async fn fetch_timetable(&self, teacher: &Teacher) -> Result<String> {
        let semester = self.options.semester.as_str();
        let form = [
            ("type", "jg0101"),
            ("isview", "1"),
            ("zc", ""),
            ("xnxq01id", semester),
            ("yxbh", ""),
            ("jszwdm", ""),
            ("teacherID", teacher.name.as_str()),
            ("jg0101id", teacher.id.as_str()),
            ("jg0101mc", ""),
            ("sfFD", "1"),
        ];

        self.client
            .post(format!("{}{}", self.base(), TIMETABLE_PATH))
            .header(ORIGIN, self.base())
            .header(REFERER, self.teacher_list_url())
            .form(&form)
            .send()
            .await
            .with_context(|| format!("Failed to request timetable of {}", teacher.name))?
            .error_for_status()
            .with_context(|| format!("Timetable request for {} was refused", teacher.name))?
            .text()
            .await
            .with_context(|| format!("Failed to read timetable of {}", teacher.name))
    }

    /// Scrape every teacher's timetable into one catalog.
    ///
    /// Timetables are downloaded `concurrency` at a time and parsed in
    /// parallel. A teacher whose page fails is logged and skipped.
    pub async fn get_teacher_courses(&self) -> Result<FinderResult> {
        let teachers = self.fetch_teachers().await?;
        info!("Fetching timetables of {} teachers", teachers.len());

        let mut stats = FinderStats {
            total_teachers: teachers.len(),
            ..FinderStats::default()
        };

        let progress_bar = self.progress_tracker.bar(teachers.len(), "teachers");
        let pages: Vec<(Teacher, Result<String>)> = stream::iter(teachers)
            .map(|teacher| {
                let progress_bar = progress_bar.clone();
                async move {
                    let page = self.fetch_timetable(&teacher).await;
                    progress_bar.inc(1);
                    (teacher, page)
                }
            })
            .buffered(self.options.concurrency.max(1))
            .collect()
            .await;
        progress_bar.finish_with_message("downloaded");

        let mut fetched = Vec::with_capacity(pages.len());
        for (teacher, page) in pages {
            match page {
                Ok(html) => fetched.push((teacher, html)),
                Err(e) => {
                    warn!("Skipping {}: {:#}", teacher.name, e);
                    stats.failed_teachers.push(teacher);
                }
            }
        }
        stats.fetched_timetables = fetched.len();

        let per_teacher = self
            .progress_tracker
            .track_parallel_progress(&fetched, |(teacher, html)| Some(parse_timetable(html, teacher)));

        let mut catalog = CourseCatalog::new(self.options.semester.clone());
        for courses in per_teacher {
            if courses.is_empty() {
                stats.empty_timetables += 1;
            }
            catalog.courses.extend(courses);
        }
        stats.total_courses = catalog.courses.len();

        info!(
            "Scraped {} courses from {}/{} timetables ({:.1}%)",
            stats.total_courses,
            stats.fetched_timetables,
            stats.total_teachers,
            stats.success_rate()
        );

        Ok(FinderResult { catalog, stats })
    }
}
