mod auth;
mod features;
mod login;
mod personal;
mod session;
mod state;

pub use auth::{
    DEFAULT_LIFETIME_SECS, REFRESH_THRESHOLD_SECS, TokenManager, is_fresh, remaining_lifetime,
};
pub use features::{AggregationEngine, TOP_TRACKS_SAMPLE, average_features};
pub use login::{LoginFlow, LoginOutcome, LoginStart};
pub use personal::PersonalInfo;
pub use session::SessionIssuer;
pub use state::StateStore;
