mod client;
mod errors;
mod tracker;
mod user_agent;
pub use self::client::{check_body, FetchPolicy, PageClient, RawPage, BOT_DEFENSE_MARKERS};
pub use self::errors::Error;
pub use self::tracker::{FetchTracker, TrackerSummary};
pub use self::user_agent::{get_user_agent, USER_AGENTS};
