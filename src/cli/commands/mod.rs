pub(super) mod config;
pub(super) mod search;
