// Copyright (c) 2026 Contoso Airlines
// SPDX-License-Identifier: AGPL-3.0

//! Graph API port
//!
//! Domain interface for the directory/collaboration backend. The provisioning
//! workflow depends on this trait only; the HTTP implementation lives in
//! `infrastructure::graph_client`.

use async_trait::async_trait;

use crate::domain::resources::*;

/// Production Graph endpoint. Implementations may substitute their own base
/// URL (tests point this at a local mock server).
pub const GRAPH_DEFAULT_ENDPOINT: &str = "https://graph.microsoft.com/beta";

/// Errors surfaced by the Graph backend.
///
/// A non-success HTTP status is reported with the backend's raw status and
/// error body, verbatim; the workflow never reinterprets it. An unresolvable
/// principal is not a distinct case: it surfaces as the `Api` error of the
/// underlying lookup call.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Non-success HTTP status after any retry budget was exhausted.
    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// Transport-level failure before any HTTP status was produced.
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not match the expected resource shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Operations the provisioning workflow issues against the backend.
///
/// All mutations are single remote calls with no internal retry; the one
/// propagation-racing read (`get_team_site`) carries a small retry budget
/// inside the implementation.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Resolve a principal's stable directory identity from its login name.
    async fn get_user_by_upn(&self, upn: &str) -> Result<User, GraphError>;

    /// Create a unified group with the given member and owner sets.
    async fn create_group(&self, group: &Group) -> Result<Group, GraphError>;

    /// Materialize a team inside an existing group.
    async fn create_team(&self, group_id: &str, team: &Team) -> Result<(), GraphError>;

    /// Invite an external principal as a guest of the tenant.
    async fn create_guest_invitation(
        &self,
        invite: &Invitation,
    ) -> Result<Invitation, GraphError>;

    /// Add a user to a group's members, and to its owners when `owner` is set.
    async fn add_member(&self, group_id: &str, user_id: &str, owner: bool)
        -> Result<(), GraphError>;

    /// Remove a user from a group's members, and from its owners when `owner`
    /// is set.
    async fn remove_member(
        &self,
        group_id: &str,
        user_id: &str,
        owner: bool,
    ) -> Result<(), GraphError>;

    async fn get_team_channels(&self, team_id: &str)
        -> Result<GraphCollection<Channel>, GraphError>;

    async fn create_team_channel(
        &self,
        team_id: &str,
        channel: &Channel,
    ) -> Result<Channel, GraphError>;

    async fn add_app_to_team(&self, team_id: &str, app: &TeamsApp) -> Result<(), GraphError>;

    /// Resolve the group's associated content site. Enrolled in the retry
    /// policy: the site may lag team creation by a few seconds.
    async fn get_team_site(&self, group_id: &str) -> Result<Site, GraphError>;

    async fn create_list(
        &self,
        site_id: &str,
        list: &SharePointList,
    ) -> Result<SharePointList, GraphError>;

    async fn get_site_lists(
        &self,
        site_id: &str,
    ) -> Result<GraphCollection<SharePointList>, GraphError>;

    async fn add_channel_tab(
        &self,
        team_id: &str,
        channel_id: &str,
        tab: &TeamsTab,
    ) -> Result<(), GraphError>;

    async fn create_page(
        &self,
        site_id: &str,
        page: &SharePointPage,
    ) -> Result<SharePointPage, GraphError>;

    /// Pages are created in draft state; publishing is a separate, mandatory
    /// call.
    async fn publish_page(&self, site_id: &str, page_id: &str) -> Result<(), GraphError>;

    /// Mark a team read-only/archived. The backend is the sole judge of
    /// whether the transition is legal.
    async fn archive_team(&self, team_id: &str) -> Result<(), GraphError>;

    async fn create_plan(&self, plan: &Plan) -> Result<Plan, GraphError>;

    async fn create_bucket(&self, bucket: &Bucket) -> Result<Bucket, GraphError>;

    async fn create_planner_task(&self, task: &PlannerTask) -> Result<PlannerTask, GraphError>;

    /// Directory reference URL for a user, as used by membership bindings.
    fn user_ref(&self, user_id: &str) -> String {
        format!("{}/users/{}", GRAPH_DEFAULT_ENDPOINT, user_id)
    }
}
