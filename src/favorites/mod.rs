//! Favorites module
//!
//! Saved cities per account, with a premium-gated cap on how many a free
//! account may keep.

pub mod entitlement;
pub mod handlers;

pub use entitlement::{can_add_favorite, favorite_cap, FREE_FAVORITE_LIMIT};
