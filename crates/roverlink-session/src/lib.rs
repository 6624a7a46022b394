//! Stateful protocol sessions over a controller link.
//!
//! A [`Session`] is the pure core: feed it bytes and a timestamp, get back
//! decoded snapshots, rejected frames, arrival rates and reply commands.
//! [`LinkSession`] drives a session from a real link and writes replies back.
//!
//! Sessions are single-owner. Reconnecting means calling [`Session::reset`]
//! or building a fresh session.

pub mod clock;
pub mod config;
pub mod error;
pub mod link;
pub mod rate;
pub mod session;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{ReplyPolicy, SessionConfig};
pub use error::{Result, SessionError};
pub use link::LinkSession;
pub use rate::RateEstimator;
pub use session::{Session, SessionEvent, SessionStats};
