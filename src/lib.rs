pub mod config;
pub mod portal;
pub mod finder;
pub mod utils;

#[cfg(test)]
mod tests;

// Re-export main types and functions for easier access
pub use config::{AppConfig, ConfigManager, CourseConfig, CourseKind, LoginConfig, PortalSettings};
pub use portal::{CaptchaSolver, GrabOutcome, GrabReport, Grabber, PortalSession, StdinCaptcha, classify_response};
pub use finder::{CatalogStorage, CourseCatalog, CourseFinder, CourseQuery, FinderOptions, ScrapedCourse, Teacher};

// Re-export utility functions
pub use utils::file_utils;
