pub mod docs;
pub mod estimate;
pub mod phase;
pub mod preflight;
pub mod project;
pub mod tracker;
pub mod validate;
pub mod workflow;

use anyhow::Context;
use specsync_core::config::{self, EnvConfig};
use specsync_core::remote::{ConfluenceClient, JiraClient};
use std::path::Path;

/// Environment plus HTTP clients for one invocation.
///
/// Clients are built even when credentials are missing; the preflight and
/// sync layers report the missing keys before any request is sent.
pub struct Remote {
    pub env: EnvConfig,
    pub docs: ConfluenceClient,
    pub tracker: JiraClient,
}

impl Remote {
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        let env = EnvConfig::load(root).context("failed to load environment")?;
        let url = env.get(config::ATLASSIAN_URL).unwrap_or_default();
        let email = env.get(config::ATLASSIAN_EMAIL).unwrap_or_default();
        let token = env.get(config::ATLASSIAN_API_TOKEN).unwrap_or_default();
        let docs = ConfluenceClient::new(url, email, token);
        let tracker = JiraClient::new(url, email, token);
        Ok(Self {
            env,
            docs,
            tracker,
        })
    }
}

pub fn check_feature(feature: &str) -> anyhow::Result<()> {
    specsync_core::paths::validate_slug(feature)?;
    Ok(())
}
