// Copyright (c) 2026 Contoso Airlines
// SPDX-License-Identifier: AGPL-3.0

//! Provisioner configuration
//!
//! Environment-provided settings, loaded once at process start and passed
//! into the workflow by the host. Nothing here is secret; the bearer token
//! is supplied per-request by the caller.

use serde::{Deserialize, Serialize};

/// Credential-mode capabilities of the token the host acquires.
///
/// Planner rejects application-only tokens, so the planner stage only runs
/// when the host reports a delegated user context. Evaluated once at the
/// start of each provisioning run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub delegated_auth: bool,
}

/// Workspace-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvisionerConfig {
    /// App to auto-install into new teams. Absent means the install step is
    /// skipped entirely.
    pub team_app_id: Option<String>,

    /// Tenant name, used only to build Planner deep links for the gated
    /// planner stage.
    pub tenant_name: Option<String>,

    pub capabilities: Capabilities,
}

impl ProvisionerConfig {
    /// Read configuration from the environment. Empty values count as unset.
    pub fn from_env() -> Self {
        Self {
            team_app_id: env_nonempty("TEAM_APP_TO_INSTALL"),
            tenant_name: env_nonempty("TENANT_NAME"),
            capabilities: Capabilities::default(),
        }
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}
