pub mod types;
pub mod loader;
pub mod writer;

// Re-export the main API for easier access
pub use types::{AppConfig, CourseConfig, CourseKind, LoginConfig, PortalSettings};
pub use loader::ConfigManager;
pub use writer::{render_ini, save_config};
