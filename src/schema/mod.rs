pub mod attachment;
pub mod channel_config;
pub mod contact;
pub mod contact_inbox;
pub mod conversation;
pub mod event;
pub mod inbox;
pub mod label;
pub mod message;

pub use attachment::*;
pub use channel_config::*;
pub use contact::*;
pub use contact_inbox::*;
pub use conversation::*;
pub use event::*;
pub use inbox::*;
pub use label::*;
pub use message::*;
