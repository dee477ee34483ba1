pub mod types;
pub mod parser;
pub mod progress;
pub mod client;
pub mod query;
pub mod export;
pub mod storage;
pub mod config_gen;

// Re-export the main API for easier access
pub use types::{CourseCatalog, FinderOptions, FinderResult, FinderStats, ScrapedCourse, Teacher};
pub use parser::{parse_teacher_list, parse_timetable};
pub use client::CourseFinder;
pub use progress::configure_parse_threads;
pub use query::{CatalogStats, CourseQuery, SortField};
pub use storage::CatalogStorage;
pub use config_gen::{GeneratedConfig, generate_config};
