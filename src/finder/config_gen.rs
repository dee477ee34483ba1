use std::collections::HashSet;

use log::{info, warn};

use crate::config::{AppConfig, CourseConfig, CourseKind};
use super::types::CourseCatalog;

/// A config rebuilt from a scrape
#[derive(Debug, Clone)]
pub struct GeneratedConfig {
    pub config: AppConfig,

    /// Online jx0404ids left out because they lack the semester prefix
    pub skipped: Vec<String>,
}

/// Replace the public electives of `base` with the online courses found in
/// `catalog`.
///
/// A course id is the jx0404id with the semester prefix removed. Ids are
/// de-duplicated in catalog order. Credentials, settings, and required
/// courses are kept from `base`.
pub fn generate_config(catalog: &CourseCatalog, base: &AppConfig) -> GeneratedConfig {
    let semester = base.login.semester.as_str();
    let mut seen = HashSet::new();
    let mut public = Vec::new();
    let mut skipped = Vec::new();

    for jx0404id in catalog.online_courses().filter_map(|c| c.jx0404id.as_deref()) {
        if !seen.insert(jx0404id) {
            continue;
        }

        match jx0404id.strip_prefix(semester).filter(|id| !id.is_empty()) {
            Some(course_id) => public.push(CourseConfig::new(
                course_id,
                CourseKind::Public,
                &base.settings.base_url,
                semester,
            )),
            None => {
                warn!("Skipping {}: it does not start with semester prefix {:?}", jx0404id, semester);
                skipped.push(jx0404id.to_string());
            }
        }
    }

    info!("Found {} online courses for the config", public.len());

    let mut config = base.clone();
    config.courses = public;
    config
        .courses
        .extend(base.courses_of(CourseKind::Required).cloned());

    GeneratedConfig { config, skipped }
}
