pub mod dispatch_answers;
pub mod mirror_response;
pub mod reload_config;

pub use dispatch_answers::{DispatchAnswersUseCase, DispatchSummary};
pub use mirror_response::{MirrorOutcome, MirrorResponseUseCase};
pub use reload_config::ReloadConfigUseCase;
