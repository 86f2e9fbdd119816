pub mod config;
pub mod errors;
pub mod evaluation;
pub mod game_events;
pub mod rating;
pub mod session;
pub mod stats;
pub mod word_catalog;

// Re-export main components
pub use config::*;
pub use errors::*;
pub use evaluation::*;
pub use game_events::*;
pub use rating::*;
pub use session::*;
pub use stats::*;
pub use word_catalog::*;
