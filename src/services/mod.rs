pub mod question_generator;
pub mod report_renderer;
pub mod session_log;

pub use question_generator::{Generation, QuestionGenerator};
pub use report_renderer::ReportRenderer;
pub use session_log::SessionLog;
