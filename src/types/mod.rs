//! Tipos compartilhados do gchat-mcp.

pub mod chat;
pub mod config;
pub mod errors;
pub mod requests;

pub use chat::{Membership, Message, Page, Space, SpaceType, Thread, User};
pub use requests::{CreateSpaceRequest, ListMessagesOptions, ListSpacesOptions, SortOrder};
