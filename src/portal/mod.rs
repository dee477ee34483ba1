pub mod types;
pub mod response;
pub mod captcha;
pub mod session;
pub mod grabber;

// Re-export the main API for easier access
pub use types::{GrabOutcome, GrabReport, GrabResult, PortalUrls};
pub use response::classify_response;
pub use captcha::{CaptchaSolver, StdinCaptcha};
pub use session::PortalSession;
pub use grabber::Grabber;
