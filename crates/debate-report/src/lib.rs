pub mod guard;
pub mod renderer;

pub use guard::{default_blocked_phrases, GuardError, ReportGuard, ReportGuardConfig};
pub use renderer::{PlainTextRenderer, ReportDocument, ReportRenderer, RenderError};
