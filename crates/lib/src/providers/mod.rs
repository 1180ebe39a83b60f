//! External collaborators: language-model providers and blob stores.

pub mod ai;
pub mod factory;
pub mod storage;
