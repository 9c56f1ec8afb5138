//! HTTP-facing operations (§6.1): every read is a `#[forge::query(public)]`,
//! every write a `#[forge::mutation(public)]`. Forge owns routing, JSON
//! encoding, and auth (out of scope per §1); this module only supplies the
//! handler bodies.

pub mod conversations;
pub mod inboxes;
pub mod labels;

pub use conversations::*;
pub use inboxes::*;
pub use labels::*;
