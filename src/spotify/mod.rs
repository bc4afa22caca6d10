pub mod client;
pub mod models;
pub mod provider;
pub mod token;

pub use client::SpotifyClient;
pub use models::*;
pub use provider::SpotifyProvider;
pub use token::{Clock, ManualClock, SystemClock, TokenCache};
