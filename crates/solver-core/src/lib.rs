mod error;
mod templates;
pub mod subject;
pub mod config;
pub mod router;
pub mod summarizer;
pub mod orchestrator;
pub mod builder;

pub use error::{SolverError, Result};
pub use subject::SubjectHint;
pub use config::{RouteProfile, TitleProfile};
pub use router::{PriorTurn, SubjectRouter};
pub use summarizer::{format_relative_time, TitleSummarizer, MAX_TITLE_CHARS};
pub use orchestrator::{Orchestrator, TurnOutcome, TurnRequest, DEFAULT_TURN_LEASE, PLACEHOLDER_TITLE};
pub use builder::OrchestratorBuilder;
pub use templates::{GENERAL_SYSTEM_PROMPT, QUANTITATIVE_SYSTEM_PROMPT, TITLE_SYSTEM_PROMPT};
