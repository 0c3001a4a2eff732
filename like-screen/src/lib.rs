//! Like screen built on intent-dispatch
//!
//! A single button backed by one state value (`is_like`, `like_count`) and
//! one intent. Tapping it shows a busy indicator, waits for a simulated
//! request, commits the like, and confirms with a toast. Tapping again
//! only reports that the item is already liked.
//!
//! ```ignore
//! let screen = LikeViewModel::new();
//! let mut effects = screen.subscribe_effects();
//!
//! screen.like().await?;
//! assert_eq!(screen.state().like_count, 233);
//! ```

pub mod config;
pub mod effect;
pub mod intent;
pub mod reducer;
pub mod state;
pub mod view_model;

pub use config::LikeConfig;
pub use effect::LikeEffect;
pub use intent::LikeIntent;
pub use state::{LikeState, DEFAULT_LIKE_COUNT};
pub use view_model::LikeViewModel;
