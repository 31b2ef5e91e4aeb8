// Copyright (c) 2026 Contoso Airlines
// SPDX-License-Identifier: AGPL-3.0

//! Graph HTTP client
//!
//! Single-purpose JSON client bound to one bearer credential and one base
//! URL. Implements the `GraphApi` port with one thin typed wrapper per
//! operation on top of a shared `call` primitive.
//!
//! # Retry policy
//!
//! Retry is opt-in per call, not global. A call enrolled with budget N is
//! attempted at most N+1 times; every attempt after the first is preceded by
//! a fixed backoff sleep. The backoff is a policy constant chosen to straddle
//! the backend's propagation delay, not a computed value. The only enrolled
//! call is the team-site lookup, which can race site provisioning right after
//! team creation. Callers of `call` own the safety of repeating whatever they
//! enroll.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::graph::{GraphApi, GraphError, GRAPH_DEFAULT_ENDPOINT};
use crate::domain::resources::*;

/// Fixed delay between retry attempts.
const RETRY_BACKOFF: Duration = Duration::from_secs(3);

/// Retry budget for the team-site lookup.
const SITE_LOOKUP_RETRIES: u32 = 2;

/// Authenticated Graph client. One instance per provisioning request is
/// fine; it holds no mutable state beyond the HTTP connection pool.
pub struct GraphClient {
    http: reqwest::Client,
    access_token: String,
    endpoint: String,
    retry_backoff: Duration,
}

impl GraphClient {
    /// Client against the production endpoint.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_endpoint(access_token, GRAPH_DEFAULT_ENDPOINT)
    }

    /// Client against a custom base URL (no trailing slash).
    pub fn with_endpoint(access_token: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token: access_token.into(),
            endpoint: endpoint.into(),
            retry_backoff: RETRY_BACKOFF,
        }
    }

    /// Override the retry backoff. Intended for tests; production keeps the
    /// policy constant.
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Issue one authenticated request, resending it up to `retries` extra
    /// times on a non-success status.
    ///
    /// The body is serialized exactly once so every retry sends an identical
    /// payload. On final failure the backend's status and error body are
    /// returned verbatim.
    async fn call<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        mut retries: u32,
    ) -> Result<reqwest::Response, GraphError> {
        let payload = match body {
            Some(body) if method != Method::GET && method != Method::DELETE => Some(
                serde_json::to_string(body).map_err(|e| GraphError::Decode(e.to_string()))?,
            ),
            _ => None,
        };

        let url = format!("{}{}", self.endpoint, path);
        debug!(method = %method, path, "graph request");

        loop {
            let mut request = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(&self.access_token)
                .header(header::ACCEPT, "application/json");

            if let Some(payload) = &payload {
                request = request
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(payload.clone());
            }

            let response = request
                .send()
                .await
                .map_err(|e| GraphError::Network(e.to_string()))?;

            let status: StatusCode = response.status();
            if status.is_success() {
                return Ok(response);
            }

            if retries > 0 {
                warn!(
                    status = status.as_u16(),
                    path,
                    retries,
                    backoff_secs = self.retry_backoff.as_secs_f64(),
                    "graph call failed, retrying after backoff"
                );
                tokio::time::sleep(self.retry_backoff).await;
                retries -= 1;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), path, "graph call failed");
            return Err(GraphError::Api {
                status: status.as_u16(),
                body,
            });
        }
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GraphError> {
        response
            .json::<T>()
            .await
            .map_err(|e| GraphError::Decode(e.to_string()))
    }
}

/// Marker for calls without a request body.
const NO_BODY: Option<&()> = None;

#[async_trait]
impl GraphApi for GraphClient {
    async fn get_user_by_upn(&self, upn: &str) -> Result<User, GraphError> {
        let response = self
            .call(Method::GET, &format!("/users/{upn}"), NO_BODY, 0)
            .await?;
        Self::decode(response).await
    }

    async fn create_group(&self, group: &Group) -> Result<Group, GraphError> {
        let response = self.call(Method::POST, "/groups", Some(group), 0).await?;
        Self::decode(response).await
    }

    async fn create_team(&self, group_id: &str, team: &Team) -> Result<(), GraphError> {
        self.call(
            Method::PUT,
            &format!("/groups/{group_id}/team"),
            Some(team),
            0,
        )
        .await?;
        Ok(())
    }

    async fn create_guest_invitation(
        &self,
        invite: &Invitation,
    ) -> Result<Invitation, GraphError> {
        let response = self
            .call(Method::POST, "/invitations", Some(invite), 0)
            .await?;
        Self::decode(response).await
    }

    async fn add_member(
        &self,
        group_id: &str,
        user_id: &str,
        owner: bool,
    ) -> Result<(), GraphError> {
        let payload = DirectoryObjectRef {
            odata_id: self.user_ref(user_id),
        };

        self.call(
            Method::POST,
            &format!("/groups/{group_id}/members/$ref"),
            Some(&payload),
            0,
        )
        .await?;

        if owner {
            self.call(
                Method::POST,
                &format!("/groups/{group_id}/owners/$ref"),
                Some(&payload),
                0,
            )
            .await?;
        }

        Ok(())
    }

    async fn remove_member(
        &self,
        group_id: &str,
        user_id: &str,
        owner: bool,
    ) -> Result<(), GraphError> {
        // Owners must be dropped before their membership is.
        if owner {
            self.call(
                Method::DELETE,
                &format!("/groups/{group_id}/owners/{user_id}/$ref"),
                NO_BODY,
                0,
            )
            .await?;
        }

        self.call(
            Method::DELETE,
            &format!("/groups/{group_id}/members/{user_id}/$ref"),
            NO_BODY,
            0,
        )
        .await?;

        Ok(())
    }

    async fn get_team_channels(
        &self,
        team_id: &str,
    ) -> Result<GraphCollection<Channel>, GraphError> {
        let response = self
            .call(Method::GET, &format!("/teams/{team_id}/channels"), NO_BODY, 0)
            .await?;
        Self::decode(response).await
    }

    async fn create_team_channel(
        &self,
        team_id: &str,
        channel: &Channel,
    ) -> Result<Channel, GraphError> {
        let response = self
            .call(
                Method::POST,
                &format!("/teams/{team_id}/channels"),
                Some(channel),
                0,
            )
            .await?;
        Self::decode(response).await
    }

    async fn add_app_to_team(&self, team_id: &str, app: &TeamsApp) -> Result<(), GraphError> {
        self.call(Method::POST, &format!("/teams/{team_id}/apps"), Some(app), 0)
            .await?;
        Ok(())
    }

    async fn get_team_site(&self, group_id: &str) -> Result<Site, GraphError> {
        // The site trails team creation by a few seconds; retry across the
        // propagation window instead of failing the whole run.
        let response = self
            .call(
                Method::GET,
                &format!("/groups/{group_id}/sites/root"),
                NO_BODY,
                SITE_LOOKUP_RETRIES,
            )
            .await?;
        Self::decode(response).await
    }

    async fn create_list(
        &self,
        site_id: &str,
        list: &SharePointList,
    ) -> Result<SharePointList, GraphError> {
        let response = self
            .call(Method::POST, &format!("/sites/{site_id}/lists"), Some(list), 0)
            .await?;
        Self::decode(response).await
    }

    async fn get_site_lists(
        &self,
        site_id: &str,
    ) -> Result<GraphCollection<SharePointList>, GraphError> {
        let response = self
            .call(Method::GET, &format!("/sites/{site_id}/lists"), NO_BODY, 0)
            .await?;
        Self::decode(response).await
    }

    async fn add_channel_tab(
        &self,
        team_id: &str,
        channel_id: &str,
        tab: &TeamsTab,
    ) -> Result<(), GraphError> {
        self.call(
            Method::POST,
            &format!("/teams/{team_id}/channels/{channel_id}/tabs"),
            Some(tab),
            0,
        )
        .await?;
        Ok(())
    }

    async fn create_page(
        &self,
        site_id: &str,
        page: &SharePointPage,
    ) -> Result<SharePointPage, GraphError> {
        let response = self
            .call(Method::POST, &format!("/sites/{site_id}/pages"), Some(page), 0)
            .await?;
        Self::decode(response).await
    }

    async fn publish_page(&self, site_id: &str, page_id: &str) -> Result<(), GraphError> {
        self.call(
            Method::POST,
            &format!("/sites/{site_id}/pages/{page_id}/publish"),
            NO_BODY,
            0,
        )
        .await?;
        Ok(())
    }

    async fn archive_team(&self, team_id: &str) -> Result<(), GraphError> {
        let payload = TeamArchiveRequest {
            should_set_spo_site_read_only_for_members: true,
        };
        self.call(
            Method::POST,
            &format!("/teams/{team_id}/archive"),
            Some(&payload),
            0,
        )
        .await?;
        Ok(())
    }

    async fn create_plan(&self, plan: &Plan) -> Result<Plan, GraphError> {
        let response = self
            .call(Method::POST, "/planner/plans", Some(plan), 0)
            .await?;
        Self::decode(response).await
    }

    async fn create_bucket(&self, bucket: &Bucket) -> Result<Bucket, GraphError> {
        let response = self
            .call(Method::POST, "/planner/buckets", Some(bucket), 0)
            .await?;
        Self::decode(response).await
    }

    async fn create_planner_task(&self, task: &PlannerTask) -> Result<PlannerTask, GraphError> {
        let response = self
            .call(Method::POST, "/planner/tasks", Some(task), 0)
            .await?;
        Self::decode(response).await
    }

    fn user_ref(&self, user_id: &str) -> String {
        format!("{}/users/{}", self.endpoint, user_id)
    }
}
