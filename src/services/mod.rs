pub mod notifier;
pub mod pipeline;

pub use notifier::{Notifier, NotifierConfig, NotifyOutcome};
pub use pipeline::{outcome_message, run_relay, run_with_notification};
