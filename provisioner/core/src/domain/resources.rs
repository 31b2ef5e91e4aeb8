// Copyright (c) 2026 Contoso Airlines
// SPDX-License-Identifier: AGPL-3.0

//! Microsoft Graph resource models
//!
//! Wire-level shapes for the resources the provisioning workflow creates or
//! reads: groups, teams, channels, invitations, SharePoint sites/lists/pages,
//! and Planner plans. Only the fields the workflow actually sets or inspects
//! are modeled; the backend's full schemas are authoritative for everything
//! else.
//!
//! Field names are camelCase on the wire regardless of the Rust naming, via
//! `serde(rename_all = "camelCase")` on every type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generic Graph collection envelope (`{ "value": [...] }`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphCollection<T> {
    pub value: Vec<T>,
}

/// Directory user, as returned by `/users/{upn}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_principal_name: Option<String>,
}

/// Unified group create payload / response.
///
/// Members and owners are directory reference URLs, bound through the
/// `@odata.bind` convention on create.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub display_name: String,
    pub description: String,
    pub visibility: String,
    pub mail_enabled: bool,
    pub mail_nickname: String,
    pub group_types: Vec<String>,
    pub security_enabled: bool,
    #[serde(
        rename = "members@odata.bind",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub members: Vec<String>,
    #[serde(
        rename = "owners@odata.bind",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub owners: Vec<String>,
}

/// Team settings applied when a group is materialized into a team.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_settings: Option<TeamGuestSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamGuestSettings {
    pub allow_create_update_channels: bool,
    pub allow_delete_channels: bool,
}

/// Teams channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Guest invitation. `invited_user` is populated on the response only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub invited_user_email_address: String,
    pub invite_redirect_url: String,
    pub send_invitation_message: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invited_user: Option<InvitedUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitedUser {
    pub id: String,
}

/// App installation payload for a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamsApp {
    pub app_id: String,
}

/// Channel tab. `teams_app_id` selects the hosting app (web view, Planner).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamsTab {
    pub name: String,
    pub teams_app_id: String,
    pub configuration: TabConfiguration,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
}

/// SharePoint site (the team's content site).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
}

/// SharePoint list create payload / response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePointList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextColumn>,
}

impl ColumnDefinition {
    /// A plain single-line text column.
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(TextColumn {}),
        }
    }
}

/// Marker for text-typed columns; serializes as an empty object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextColumn {}

/// Client-side web part identifier for the SharePoint list view part.
pub const LIST_WEB_PART: &str = "f92bf067-bc19-489e-a556-7fe95f508720";

/// SharePoint site page create payload / response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePointPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub web_parts: Vec<WebPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPart {
    #[serde(rename = "type")]
    pub part_type: String,
    pub data: WebPartData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPartData {
    pub data_version: String,
    pub properties: ListProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProperties {
    pub is_document_library: bool,
    pub selected_list_id: String,
    pub webpart_height_key: u32,
}

/// Planner plan. Owned by the provisioned group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub owner: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub plan_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub plan_id: String,
    pub bucket_id: String,
    pub due_date_time: DateTime<Utc>,
}

/// `@odata.id` reference used by membership `$ref` mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryObjectRef {
    #[serde(rename = "@odata.id")]
    pub odata_id: String,
}

/// Archive request body; marks the backing site read-only for members.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamArchiveRequest {
    pub should_set_spo_site_read_only_for_members: bool,
}
