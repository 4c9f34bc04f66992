//! Domain types shared between the store trait and its backends.

mod email_log;
mod ids;
mod invites;
mod reservations;

pub use email_log::*;
pub use ids::*;
pub use invites::*;
pub use reservations::*;
