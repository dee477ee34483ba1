use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use log::{debug, info, trace, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;

use crate::config::{LoginConfig, PortalSettings};
use crate::utils::file_utils;
use super::types::PortalUrls;

// Link on the selection list that opens the enrollment round
static ENTRY_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"href="(.+?)" target="blank">进入选课"#).expect("entry link pattern is valid")
});

/// A logged-in (or about to be) session against the registration portal.
///
/// All requests share one cookie store, so cloning the session hands out
/// another handle to the same login.
#[derive(Debug, Clone)]
pub struct PortalSession {
    pub(crate) client: Client,
    pub(crate) urls: PortalUrls,
    pub(crate) settings: PortalSettings,
}

impl PortalSession {
    /// Build the HTTP client for the given settings
    pub fn new(settings: PortalSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .user_agent(settings.user_agent.clone());

        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            urls: PortalUrls::new(&settings.base_url),
            settings,
        })
    }

    /// Endpoints this session talks to
    pub fn urls(&self) -> &PortalUrls {
        &self.urls
    }

    /// Settings this session was built with
    pub fn settings(&self) -> &PortalSettings {
        &self.settings
    }

    /// Download the captcha image to the configured path and open the
    /// login page so the session cookie is issued.
    pub async fn fetch_captcha(&self) -> Result<PathBuf> {
        let image = self
            .client
            .get(&self.urls.verify_code)
            .send()
            .await
            .context("Failed to request captcha image")?
            .bytes()
            .await
            .context("Failed to read captcha image")?;

        let path = self.settings.captcha_path.clone();
        file_utils::write_bytes_to_file(&path, &image)?;
        debug!("Saved {} byte captcha to {}", image.len(), path.display());

        self.client
            .get(&self.urls.login)
            .send()
            .await
            .context("Failed to open login page")?;

        Ok(path)
    }

    /// Submit credentials and captcha, then check whether the portal let us in
    pub async fn login(&self, login: &LoginConfig, captcha: &str) -> Result<bool> {
        let form = [
            ("encoded", encode_credentials(&login.username, &login.password)),
            ("RANDOMCODE", captcha.to_string()),
        ];

        self.client
            .post(&self.urls.login)
            .form(&form)
            .send()
            .await
            .context("Failed to submit login form")?;

        if self.check_login().await {
            info!("Logged into the registration portal as {}", login.username);
            Ok(true)
        } else {
            warn!("Login rejected: username, password, or captcha is wrong");
            Ok(false)
        }
    }

    /// Decide from page content whether the session is logged in.
    ///
    /// Request failures count as "not logged in".
    pub async fn check_login(&self) -> bool {
        match self.try_check_login().await {
            Ok(logged_in) => logged_in,
            Err(e) => {
                warn!("Login check failed: {:#}", e);
                false
            }
        }
    }

    async fn try_check_login(&self) -> Result<bool> {
        let main = self.get_text(&self.urls.main).await?;

        if main.contains("登录") && main.contains("用户名") {
            return Ok(false);
        }

        if main.contains("学生") || main.contains("xsMain") {
            return Ok(true);
        }

        // Main page told us nothing either way; the selection list does
        let list = self.get_text(&self.urls.course_list).await?;
        Ok(!list.contains("登录"))
    }

    /// Poll the selection list until the enrollment round opens, then enter it
    pub async fn enter_selection(&self) -> Result<()> {
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            match self.get_text(&self.urls.course_list).await {
                Ok(text) => {
                    if let Some(cap) = ENTRY_LINK_RE.captures(&text) {
                        let target = self.urls.resolve(&cap[1]);
                        debug!("Entering selection via {}", target);
                        self.get_text(&target)
                            .await
                            .context("Failed to open the selection page")?;
                        info!("Entered the course selection page");
                        return Ok(());
                    }
                    info!("Waiting for the selection round to open...");
                }
                Err(e) => warn!("Failed to load selection list: {:#}", e),
            }

            if self.settings.max_attempts.is_some_and(|max| attempts >= max) {
                bail!("Selection round did not open after {} attempts", attempts);
            }

            tokio::time::sleep(self.settings.retry_interval).await;
        }
    }

    /// GET a page and return its body as text
    pub(crate) async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read body from {}", url))?;

        trace!("GET {} -> {} ({} bytes)", url, status, text.len());
        Ok(text)
    }
}

/// Login form field: base64 username and password joined by `%%%`
pub fn encode_credentials(username: &str, password: &str) -> String {
    format!("{}%%%{}", STANDARD.encode(username), STANDARD.encode(password))
}
