mod engine;
mod jobs;
mod label;
mod slot;

pub use engine::{CatchConfig, CatchEngine, NO_HANDS_STATUS, OPENING_LABEL, SUCCESS_MESSAGE};
pub use jobs::{load_jobs, parse_jobs, Job, JobPool, ACCEPTABLE_EXTRA};
pub use label::{display_text, LabelGate};
pub use slot::{JobSlot, ResolveOutcome, SpawnOutcome};
