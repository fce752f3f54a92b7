//! Pre-action validation and post-action verification.
//!
//! `before` decides whether a step's target exists and what to dispatch;
//! `after` decides whether the dispatched action had its intended effect;
//! `navigation` holds the acceptance heuristics for the single-page
//! client's menu navigation.

pub mod after;
pub mod before;
pub mod navigation;

pub use after::{validate_after, VerificationVerdict};
pub use before::{validate_before, PreparedAction};
pub use navigation::{MenuPath, NavState};
