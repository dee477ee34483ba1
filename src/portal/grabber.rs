use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result, bail};
use futures::future::join_all;
use log::{debug, info, warn};
use tokio::sync::oneshot;

use crate::config::{AppConfig, CourseConfig};
use super::captcha::CaptchaSolver;
use super::response::classify_response;
use super::session::PortalSession;
use super::types::{GrabOutcome, GrabReport, GrabResult};

impl PortalSession {
    /// Keep requesting enrollment for one course until the portal answers
    /// with something terminal.
    ///
    /// Request errors and unrecognised replies are logged and retried after
    /// the fixed interval. Without `max_attempts` this never gives up.
    pub async fn select_course(&self, course: &CourseConfig) -> GrabResult {
        let mut attempts: u32 = 0;

        let outcome = loop {
            attempts += 1;

            match self.get_text(&course.url).await {
                Ok(text) => {
                    if let Some(outcome) = classify_response(&text) {
                        break outcome;
                    }
                    debug!("Course {}: no decision yet (attempt {})", course.course_id, attempts);
                }
                Err(e) => warn!("Course {}: {:#}", course.course_id, e),
            }

            if self.settings.max_attempts.is_some_and(|max| attempts >= max) {
                break GrabOutcome::Exhausted;
            }

            tokio::time::sleep(self.settings.retry_interval).await;
        };

        match &outcome {
            GrabOutcome::Success => info!("Course {} enrolled", course.course_id),
            GrabOutcome::Conflict(msg) => warn!("Course {}: {}, giving up on it", course.course_id, msg),
            GrabOutcome::AlreadySelected(msg) => info!("Course {}: {}", course.course_id, msg),
            GrabOutcome::NotFound => warn!("Course {}: the portal has no course with this id", course.course_id),
            GrabOutcome::Exhausted => warn!("Course {}: gave up after {} attempts", course.course_id, attempts),
        }

        GrabResult {
            course: course.clone(),
            outcome,
            attempts,
        }
    }

    /// Run one grab loop per course, all at once, on this session
    pub async fn grab_all(&self, courses: &[CourseConfig]) -> GrabReport {
        info!("Grabbing {} courses", courses.len());

        let results = join_all(courses.iter().map(|course| self.select_course(course))).await;

        GrabReport { results }
    }
}

/// The full enrollment run: captcha, login, wait for the round, grab
#[derive(Debug)]
pub struct Grabber {
    config: AppConfig,
    session: PortalSession,
}

impl Grabber {
    /// Prepare a run; a config without courses is refused
    pub fn new(config: AppConfig) -> Result<Self> {
        if config.courses.is_empty() {
            bail!("No course ids configured: set num1/id1.. or num2/id_1.. in the config");
        }

        let session = PortalSession::new(config.settings.clone())?;
        Ok(Self { config, session })
    }

    /// The session used for every request
    pub fn session(&self) -> &PortalSession {
        &self.session
    }

    /// The configuration being run
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Log in with a captcha from `solver`, wait for selection to open,
    /// then grab every configured course.
    pub async fn run(&self, solver: Arc<dyn CaptchaSolver>) -> Result<GrabReport> {
        let image = self.session.fetch_captcha().await?;
        let code = solve_captcha(solver, image).await?;

        if !self.session.login(&self.config.login, &code).await? {
            bail!("Login failed: fix the username or password in the config, or retype the captcha, then restart");
        }

        self.session.enter_selection().await?;

        let report = self.session.grab_all(&self.config.courses).await;
        info!(
            "Course selection finished: {} enrolled, {} already selected, {} not",
            report.succeeded(),
            report.already_selected(),
            report.failed()
        );
        Ok(report)
    }
}

/// Ask `solver` for the captcha on a detached thread.
///
/// Solvers may block on the terminal. A prompt abandoned by an interrupt
/// must not keep the runtime from shutting down, so no runtime thread
/// ever waits on it.
pub(crate) async fn solve_captcha(solver: Arc<dyn CaptchaSolver>, image: PathBuf) -> Result<String> {
    let (tx, rx) = oneshot::channel();

    thread::Builder::new()
        .name("captcha-prompt".to_string())
        .spawn(move || {
            if tx.send(solver.solve(&image)).is_err() {
                debug!("Captcha answered after the run was abandoned");
            }
        })
        .context("Failed to start captcha prompt")?;

    rx.await
        .context("Captcha prompt stopped without an answer")?
        .context("Failed to obtain captcha")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::{Duration, Instant};
    use pretty_assertions::assert_eq;

    struct SlowCaptcha(Duration);

    impl CaptchaSolver for SlowCaptcha {
        fn solve(&self, _image_path: &Path) -> Result<String> {
            thread::sleep(self.0);
            Ok("late".to_string())
        }
    }

    struct BrokenCaptcha;

    impl CaptchaSolver for BrokenCaptcha {
        fn solve(&self, _image_path: &Path) -> Result<String> {
            bail!("No captcha entered")
        }
    }

    #[tokio::test]
    async fn solver_answer_is_returned() -> Result<()> {
        let code = solve_captcha(Arc::new(SlowCaptcha(Duration::ZERO)), PathBuf::from("code.jpg")).await?;
        assert_eq!(code, "late");
        Ok(())
    }

    #[tokio::test]
    async fn solver_error_keeps_its_message() {
        let err = solve_captcha(Arc::new(BrokenCaptcha), PathBuf::from("code.jpg")).await.unwrap_err();
        assert!(format!("{:#}", err).contains("No captcha entered"), "{:#}", err);
    }

    #[test]
    fn abandoned_prompt_does_not_delay_shutdown() -> Result<()> {
        let runtime = tokio::runtime::Runtime::new()?;
        let started = Instant::now();

        // An interrupt arriving while the prompt still waits for input
        let answered = runtime.block_on(async {
            tokio::select! {
                code = solve_captcha(Arc::new(SlowCaptcha(Duration::from_secs(5))), PathBuf::from("code.jpg")) => Some(code),
                _ = tokio::time::sleep(Duration::from_millis(50)) => None,
            }
        });
        drop(runtime);

        assert!(answered.is_none());
        assert!(started.elapsed() < Duration::from_secs(2), "shutdown took {:?}", started.elapsed());
        Ok(())
    }
}
