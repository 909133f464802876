//! CLI command implementations

pub(crate) mod check;
pub(crate) mod common;
pub(crate) mod create;
pub(crate) mod migrate;
pub(crate) mod new;
pub(crate) mod status;
pub(crate) mod validate;
