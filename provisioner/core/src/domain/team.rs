// Copyright (c) 2026 Contoso Airlines
// SPDX-License-Identifier: AGPL-3.0

//! Flight team model
//!
//! The inbound request shape (`FlightTeam`), the identifiers a provisioning
//! run produces (`ProvisionedWorkspace`), and the pure membership diff used
//! by the update path (`MembershipDelta`).

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A flight team as submitted by the trigger surface.
///
/// `id` is the backend group id; it is empty on first provisioning and set on
/// every subsequent update/archive request. The two rosters hold login names
/// (UPNs) and are deduplicated before use; the admin is never counted as a
/// roster member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightTeam {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub flight_number: u32,
    pub description: String,
    pub admin: String,
    pub pilots: Vec<String>,
    pub flight_attendants: Vec<String>,
    pub catering_liaison: String,
    pub departure_time: DateTime<Utc>,
}

/// Identifiers accumulated across a successful provisioning run.
///
/// Immutable after the run except for membership, which is maintained through
/// the update path against `group_id`.
#[derive(Debug, Clone)]
pub struct ProvisionedWorkspace {
    /// Group/team id; the externally visible workspace identifier.
    pub group_id: String,
    /// The team's default channel, host for every tab the run pins.
    pub default_channel_id: String,
    pub list_id: Option<String>,
    pub page_id: Option<String>,
}

impl ProvisionedWorkspace {
    pub fn new(group_id: impl Into<String>, default_channel_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            default_channel_id: default_channel_id.into(),
            list_id: None,
            page_id: None,
        }
    }
}

/// Set difference for one roster: principals to add and to remove.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterDelta {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl RosterDelta {
    /// `added = updated − original`, `removed = original − updated`.
    /// Input order is preserved; duplicates within a roster are collapsed.
    pub fn between(original: &[String], updated: &[String]) -> Self {
        let original_set: HashSet<&str> = original.iter().map(String::as_str).collect();
        let updated_set: HashSet<&str> = updated.iter().map(String::as_str).collect();

        let mut seen = HashSet::new();
        let added = updated
            .iter()
            .filter(|upn| !original_set.contains(upn.as_str()) && seen.insert(upn.as_str()))
            .cloned()
            .collect();

        let mut seen = HashSet::new();
        let removed = original
            .iter()
            .filter(|upn| !updated_set.contains(upn.as_str()) && seen.insert(upn.as_str()))
            .cloned()
            .collect();

        Self { added, removed }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Membership changes between two versions of a team.
///
/// Derived value; recomputed on every update call and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipDelta {
    pub admin_changed: bool,
    pub pilots: RosterDelta,
    pub attendants: RosterDelta,
}

impl MembershipDelta {
    pub fn between(original: &FlightTeam, updated: &FlightTeam) -> Self {
        Self {
            admin_changed: original.admin != updated.admin,
            pilots: RosterDelta::between(&original.pilots, &updated.pilots),
            attendants: RosterDelta::between(
                &original.flight_attendants,
                &updated.flight_attendants,
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.admin_changed && self.pilots.is_empty() && self.attendants.is_empty()
    }
}
