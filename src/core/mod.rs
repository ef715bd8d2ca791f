//! Core data models shared by the API client, token loaders and CLI

mod models;
mod redactor;

pub use models::*;
pub use redactor::*;
