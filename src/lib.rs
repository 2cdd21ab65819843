//! Maintenance jobs for documentation repositories.

pub mod a11y;
pub mod changelog;
pub mod config;
pub mod fix;
pub mod github;
pub mod markdown;
pub mod metrics;
pub mod output;
pub mod readme;
pub mod templates;
pub mod toc;
pub mod versions;
pub mod workflows;
