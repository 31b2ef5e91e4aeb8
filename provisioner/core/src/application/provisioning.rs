// Copyright (c) 2026 Contoso Airlines
// SPDX-License-Identifier: AGPL-3.0

//! Team Provisioning Application Service
//!
//! Drives the create/update/archive state transitions of a flight crew
//! workspace against the Graph port.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Orchestrate the provisioning pipeline (ordered remote
//!   mutations, each consuming identifiers returned by earlier stages)
//! - **Dependencies:** Domain (FlightTeam, GraphApi), injected at
//!   construction — no global client or logger bindings
//!
//! # Failure model
//!
//! Every stage failure aborts the rest of the run immediately and surfaces
//! the first error with the backend's status and body attached. There is no
//! compensation: resources created before the failure stay behind and need
//! manual cleanup.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local, Timelike, Utc};
use tracing::{debug, info};

use crate::domain::config::ProvisionerConfig;
use crate::domain::graph::GraphApi;
use crate::domain::resources::*;
use crate::domain::team::{FlightTeam, MembershipDelta, ProvisionedWorkspace};

const GUEST_REDIRECT_URL: &str = "https://teams.microsoft.com";

const PILOTS_CHANNEL: (&str, &str) = ("Pilots", "Discussion about flightpath, weather, etc.");
const ATTENDANTS_CHANNEL: (&str, &str) =
    ("Flight Attendants", "Discussion about duty assignments, etc.");

const PASSENGER_LIST_NAME: &str = "Challenging Passengers";
const TEAM_PAGE_NAME: &str = "TeamPage.aspx";
const DOCUMENTS_LIBRARY: &str = "Documents";

const WEB_TAB_APP_ID: &str = "com.microsoft.teamspace.tab.web";
const PLANNER_TAB_APP_ID: &str = "com.microsoft.teamspace.tab.planner";

const PREFLIGHT_PLAN_TITLE: &str = "Pre-flight Checklist";
const PREFLIGHT_TASKS: [&str; 2] = [
    "Perform pre-flight inspection of aircraft",
    "Ensure food and beverages are fully stocked",
];

/// Team provisioning service.
///
/// Holds no per-run state; concurrent runs against distinct workspaces are
/// independent.
pub struct ProvisioningService {
    graph: Arc<dyn GraphApi>,
    config: ProvisionerConfig,
}

impl ProvisioningService {
    pub fn new(graph: Arc<dyn GraphApi>, config: ProvisionerConfig) -> Self {
        Self { graph, config }
    }

    // ========================================================================
    // Create path
    // ========================================================================

    /// Provision a workspace for a new flight team.
    ///
    /// Returns the group id, the externally visible workspace identifier.
    pub async fn provision(&self, team: &FlightTeam) -> Result<String> {
        // Capability flags are evaluated once, at run start.
        let planner_enabled = self.config.capabilities.delegated_auth;

        let group = self
            .create_unified_group(team)
            .await
            .context("failed to create unified group")?;
        let group_id = group
            .id
            .ok_or_else(|| anyhow!("group create response carried no id"))?;

        self.invite_catering_liaison(&group_id, team)
            .await
            .context("failed to invite catering liaison")?;

        let general = self
            .initialize_team(&group_id)
            .await
            .context("failed to initialize team")?;
        let channel_id = general
            .id
            .ok_or_else(|| anyhow!("default channel carried no id"))?;

        let mut workspace = ProvisionedWorkspace::new(group_id, channel_id);

        if planner_enabled {
            self.create_preflight_plan(&workspace, team.departure_time)
                .await
                .context("failed to create pre-flight plan")?;
        } else {
            // Planner rejects application-only tokens for this resource
            // type; the stage stays dormant until delegated auth is wired in.
            debug!("planner stage disabled by credential capabilities");
        }

        let site = self
            .graph
            .get_team_site(&workspace.group_id)
            .await
            .context("failed to resolve team site")?;

        let list = self
            .create_passenger_list(&site, &workspace)
            .await
            .context("failed to create passenger list")?;
        workspace.list_id = list.id;

        let page = self
            .create_team_page(&site, team.flight_number)
            .await
            .context("failed to create team page")?;
        workspace.page_id = page.id;

        info!(
            group_id = %workspace.group_id,
            flight = team.flight_number,
            "provisioned flight team workspace"
        );
        Ok(workspace.group_id)
    }

    /// Resolve rosters and create the unified group.
    ///
    /// Each roster principal is looked up once (duplicates and the admin are
    /// skipped); the admin joins as a member and the sole initial owner.
    async fn create_unified_group(&self, team: &FlightTeam) -> Result<Group> {
        let mut members = Vec::new();
        let mut seen = HashSet::new();
        for upn in team.pilots.iter().chain(&team.flight_attendants) {
            if *upn == team.admin || !seen.insert(upn.as_str()) {
                continue;
            }
            let user = self.graph.get_user_by_upn(upn).await?;
            members.push(self.graph.user_ref(&user.id));
        }

        let admin_ref = self.graph.user_ref(&team.admin);
        members.push(admin_ref.clone());
        let owners = vec![admin_ref];

        let group = Group {
            id: None,
            display_name: format!("Flight {}", team.flight_number),
            description: team.description.clone(),
            visibility: "Private".to_string(),
            mail_enabled: true,
            mail_nickname: format!(
                "flight{}{}",
                team.flight_number,
                mail_alias_suffix(Local::now())
            ),
            group_types: vec!["Unified".to_string()],
            security_enabled: false,
            members,
            owners,
        };

        let created = self.graph.create_group(&group).await?;
        info!(flight = team.flight_number, "created unified group");
        Ok(created)
    }

    /// Invite the catering liaison as a guest, then add the invited identity
    /// as a plain member. The guest cannot join the member set at group
    /// creation because the identity only exists once the invite does.
    async fn invite_catering_liaison(&self, group_id: &str, team: &FlightTeam) -> Result<()> {
        let invite = Invitation {
            invited_user_email_address: team.catering_liaison.clone(),
            invite_redirect_url: GUEST_REDIRECT_URL.to_string(),
            send_invitation_message: true,
            invited_user: None,
        };

        let created = self.graph.create_guest_invitation(&invite).await?;
        let guest = created
            .invited_user
            .ok_or_else(|| anyhow!("invitation response carried no invited user"))?;

        self.graph.add_member(group_id, &guest.id, false).await?;
        info!(group_id, "added catering liaison as guest member");
        Ok(())
    }

    /// Materialize the team, create the role channels, and optionally
    /// install the configured app. Returns the default channel.
    async fn initialize_team(&self, group_id: &str) -> Result<Channel> {
        let settings = Team {
            guest_settings: Some(TeamGuestSettings {
                allow_create_update_channels: false,
                allow_delete_channels: false,
            }),
        };
        self.graph.create_team(group_id, &settings).await?;
        info!(group_id, "created team");

        // Exactly one channel exists right after team creation: the default
        // General channel.
        let channels = self.graph.get_team_channels(group_id).await?;
        let general = channels
            .value
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("team has no default channel"))?;

        for (name, description) in [PILOTS_CHANNEL, ATTENDANTS_CHANNEL] {
            let channel = Channel {
                id: None,
                display_name: name.to_string(),
                description: Some(description.to_string()),
            };
            self.graph.create_team_channel(group_id, &channel).await?;
            info!(group_id, channel = name, "created channel");
        }

        if let Some(app_id) = &self.config.team_app_id {
            let app = TeamsApp {
                app_id: app_id.clone(),
            };
            self.graph.add_app_to_team(group_id, &app).await?;
            info!(group_id, app_id = %app_id, "installed team app");
        }

        Ok(general)
    }

    /// Create the passenger list on the team site and pin it as a tab on the
    /// default channel.
    async fn create_passenger_list(
        &self,
        site: &Site,
        workspace: &ProvisionedWorkspace,
    ) -> Result<SharePointList> {
        let list = SharePointList {
            id: None,
            display_name: PASSENGER_LIST_NAME.to_string(),
            web_url: None,
            columns: vec![
                ColumnDefinition::text("Name"),
                ColumnDefinition::text("SeatNumber"),
                ColumnDefinition::text("Notes"),
            ],
        };

        let created = self.graph.create_list(&site.id, &list).await?;

        let tab = TeamsTab {
            name: PASSENGER_LIST_NAME.to_string(),
            teams_app_id: WEB_TAB_APP_ID.to_string(),
            configuration: TabConfiguration {
                entity_id: None,
                content_url: created.web_url.clone(),
                remove_url: None,
                website_url: created.web_url.clone(),
            },
        };
        self.graph
            .add_channel_tab(&workspace.group_id, &workspace.default_channel_id, &tab)
            .await?;

        info!(group_id = %workspace.group_id, "created passenger list");
        Ok(created)
    }

    /// Assemble the landing page — one list web-part per site list — then
    /// create and publish it. Creation alone leaves the page in draft state.
    async fn create_team_page(&self, site: &Site, flight_number: u32) -> Result<SharePointPage> {
        let lists = self.graph.get_site_lists(&site.id).await?;

        let mut web_parts = Vec::with_capacity(lists.value.len());
        for list in &lists.value {
            let list_id = list
                .id
                .clone()
                .ok_or_else(|| anyhow!("site list {:?} carried no id", list.display_name))?;
            web_parts.push(WebPart {
                part_type: LIST_WEB_PART.to_string(),
                data: WebPartData {
                    data_version: "1.0".to_string(),
                    properties: ListProperties {
                        is_document_library: list.display_name == DOCUMENTS_LIBRARY,
                        selected_list_id: list_id,
                        webpart_height_key: 1,
                    },
                },
            });
        }

        let page = SharePointPage {
            id: None,
            name: TEAM_PAGE_NAME.to_string(),
            title: format!("Flight {}", flight_number),
            web_parts,
        };

        let created = self.graph.create_page(&site.id, &page).await?;
        let page_id = created
            .id
            .clone()
            .ok_or_else(|| anyhow!("page create response carried no id"))?;
        self.graph.publish_page(&site.id, &page_id).await?;

        info!(site_id = %site.id, page_id = %page_id, "published team page");
        Ok(created)
    }

    /// Gated planner stage: plan, buckets, due-dated tasks, and a Planner
    /// tab on the default channel. Runs only under delegated credentials.
    async fn create_preflight_plan(
        &self,
        workspace: &ProvisionedWorkspace,
        departure_time: DateTime<Utc>,
    ) -> Result<()> {
        let plan = Plan {
            id: None,
            title: PREFLIGHT_PLAN_TITLE.to_string(),
            owner: workspace.group_id.clone(),
        };
        let plan = self.graph.create_plan(&plan).await?;
        let plan_id = plan
            .id
            .ok_or_else(|| anyhow!("plan create response carried no id"))?;

        let todo = self
            .graph
            .create_bucket(&Bucket {
                id: None,
                name: "To Do".to_string(),
                plan_id: plan_id.clone(),
            })
            .await?;
        let todo_id = todo
            .id
            .ok_or_else(|| anyhow!("bucket create response carried no id"))?;

        self.graph
            .create_bucket(&Bucket {
                id: None,
                name: "Completed".to_string(),
                plan_id: plan_id.clone(),
            })
            .await?;

        for title in PREFLIGHT_TASKS {
            self.graph
                .create_planner_task(&PlannerTask {
                    id: None,
                    title: title.to_string(),
                    plan_id: plan_id.clone(),
                    bucket_id: todo_id.clone(),
                    due_date_time: departure_time,
                })
                .await?;
        }

        let tenant = self.config.tenant_name.as_deref().unwrap_or_default();
        let tab = TeamsTab {
            name: PREFLIGHT_PLAN_TITLE.to_string(),
            teams_app_id: PLANNER_TAB_APP_ID.to_string(),
            configuration: TabConfiguration {
                entity_id: Some(plan_id.clone()),
                content_url: Some(format!(
                    "https://tasks.office.com/{tenant}/Home/PlannerFrame?page=7&planId={plan_id}&auth_pvr=Orgid&auth_upn={{upn}}&mkt={{locale}}"
                )),
                remove_url: Some(format!(
                    "https://tasks.office.com/{tenant}/Home/PlannerFrame?page=13&planId={plan_id}&auth_pvr=Orgid&auth_upn={{upn}}&mkt={{locale}}"
                )),
                website_url: Some(format!(
                    "https://tasks.office.com/{tenant}/Home/PlanViews/{plan_id}"
                )),
            },
        };
        self.graph
            .add_channel_tab(&workspace.group_id, &workspace.default_channel_id, &tab)
            .await?;

        info!(group_id = %workspace.group_id, plan_id = %plan_id, "created pre-flight plan");
        Ok(())
    }

    // ========================================================================
    // Update path
    // ========================================================================

    /// Sync membership of an existing workspace from `original` to `updated`.
    pub async fn update(&self, original: &FlightTeam, updated: &FlightTeam) -> Result<()> {
        let group_id = original
            .id
            .as_deref()
            .ok_or_else(|| anyhow!("team has not been provisioned"))?;

        let delta = MembershipDelta::between(original, updated);
        if delta.is_empty() {
            debug!(group_id, "membership unchanged");
            return Ok(());
        }

        if delta.admin_changed {
            // Add the new admin before removing the old one so the group
            // never passes through a zero-owner window.
            self.graph
                .add_member(group_id, &updated.admin, true)
                .await
                .with_context(|| format!("failed to add admin {}", updated.admin))?;
            self.graph
                .remove_member(group_id, &original.admin, true)
                .await
                .with_context(|| format!("failed to remove admin {}", original.admin))?;
            info!(group_id, "replaced team admin");
        }

        for roster in [&delta.pilots, &delta.attendants] {
            for upn in &roster.added {
                self.graph
                    .add_member(group_id, upn, false)
                    .await
                    .with_context(|| format!("failed to add member {upn}"))?;
            }
            for upn in &roster.removed {
                self.graph
                    .remove_member(group_id, upn, false)
                    .await
                    .with_context(|| format!("failed to remove member {upn}"))?;
            }
        }

        info!(group_id, "updated team membership");
        Ok(())
    }

    // ========================================================================
    // Archive path
    // ========================================================================

    /// Archive a workspace. The backend decides whether the transition is
    /// legal; no precondition checks here.
    pub async fn archive(&self, team_id: &str) -> Result<()> {
        self.graph
            .archive_team(team_id)
            .await
            .context("failed to archive team")?;
        info!(team_id, "archived team");
        Ok(())
    }
}

/// Time-of-day suffix appended to mail aliases to dodge collisions between
/// same-day flights with the same number.
fn mail_alias_suffix(now: DateTime<Local>) -> String {
    format!("{}{}{}", now.hour(), now.minute(), now.second())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::Capabilities;
    use crate::domain::graph::{GraphApi, GraphError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        ResolveUser(String),
        CreateGroup {
            members: Vec<String>,
            owners: Vec<String>,
            nickname: String,
        },
        Invite(String),
        AddMember {
            user: String,
            owner: bool,
        },
        RemoveMember {
            user: String,
            owner: bool,
        },
        CreateTeam(String),
        ListChannels(String),
        CreateChannel(String),
        AddApp(String),
        GetSite(String),
        CreateList {
            name: String,
            columns: Vec<String>,
        },
        GetSiteLists(String),
        AddTab(String),
        CreatePage {
            title: String,
            parts: usize,
        },
        PublishPage(String),
        ArchiveTeam(String),
        CreatePlan(String),
        CreateBucket(String),
        CreateTask(String),
    }

    /// Records every call and answers with canned resources. `fail_on`
    /// makes one named operation return an HTTP 500.
    struct RecordingGraph {
        calls: Mutex<Vec<Call>>,
        fail_on: Option<&'static str>,
        omit_list_ids: bool,
    }

    impl RecordingGraph {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: None,
                omit_list_ids: false,
            }
        }

        fn failing_on(op: &'static str) -> Self {
            Self {
                fail_on: Some(op),
                ..Self::new()
            }
        }

        fn with_unidentified_lists() -> Self {
            Self {
                omit_list_ids: true,
                ..Self::new()
            }
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn gate(&self, op: &str) -> Result<(), GraphError> {
            if self.fail_on == Some(op) {
                return Err(GraphError::Api {
                    status: 500,
                    body: format!("injected failure in {op}"),
                });
            }
            Ok(())
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GraphApi for RecordingGraph {
        async fn get_user_by_upn(&self, upn: &str) -> Result<User, GraphError> {
            self.record(Call::ResolveUser(upn.to_string()));
            self.gate("resolve")?;
            Ok(User {
                id: format!("id-{upn}"),
                display_name: None,
                user_principal_name: Some(upn.to_string()),
            })
        }

        async fn create_group(&self, group: &Group) -> Result<Group, GraphError> {
            self.record(Call::CreateGroup {
                members: group.members.clone(),
                owners: group.owners.clone(),
                nickname: group.mail_nickname.clone(),
            });
            self.gate("create_group")?;
            let mut created = group.clone();
            created.id = Some("group-1".to_string());
            Ok(created)
        }

        async fn create_team(&self, group_id: &str, _team: &Team) -> Result<(), GraphError> {
            self.record(Call::CreateTeam(group_id.to_string()));
            self.gate("create_team")
        }

        async fn create_guest_invitation(
            &self,
            invite: &Invitation,
        ) -> Result<Invitation, GraphError> {
            self.record(Call::Invite(invite.invited_user_email_address.clone()));
            self.gate("invite")?;
            let mut created = invite.clone();
            created.invited_user = Some(InvitedUser {
                id: "guest-1".to_string(),
            });
            Ok(created)
        }

        async fn add_member(
            &self,
            _group_id: &str,
            user_id: &str,
            owner: bool,
        ) -> Result<(), GraphError> {
            self.record(Call::AddMember {
                user: user_id.to_string(),
                owner,
            });
            self.gate("add_member")
        }

        async fn remove_member(
            &self,
            _group_id: &str,
            user_id: &str,
            owner: bool,
        ) -> Result<(), GraphError> {
            self.record(Call::RemoveMember {
                user: user_id.to_string(),
                owner,
            });
            self.gate("remove_member")
        }

        async fn get_team_channels(
            &self,
            team_id: &str,
        ) -> Result<GraphCollection<Channel>, GraphError> {
            self.record(Call::ListChannels(team_id.to_string()));
            self.gate("list_channels")?;
            Ok(GraphCollection {
                value: vec![Channel {
                    id: Some("chan-general".to_string()),
                    display_name: "General".to_string(),
                    description: None,
                }],
            })
        }

        async fn create_team_channel(
            &self,
            _team_id: &str,
            channel: &Channel,
        ) -> Result<Channel, GraphError> {
            self.record(Call::CreateChannel(channel.display_name.clone()));
            self.gate("create_channel")?;
            let mut created = channel.clone();
            created.id = Some(format!("chan-{}", channel.display_name));
            Ok(created)
        }

        async fn add_app_to_team(&self, _team_id: &str, app: &TeamsApp) -> Result<(), GraphError> {
            self.record(Call::AddApp(app.app_id.clone()));
            self.gate("add_app")
        }

        async fn get_team_site(&self, group_id: &str) -> Result<Site, GraphError> {
            self.record(Call::GetSite(group_id.to_string()));
            self.gate("get_site")?;
            Ok(Site {
                id: "site-1".to_string(),
                web_url: Some("https://contoso.sharepoint.com/sites/flight".to_string()),
            })
        }

        async fn create_list(
            &self,
            _site_id: &str,
            list: &SharePointList,
        ) -> Result<SharePointList, GraphError> {
            self.record(Call::CreateList {
                name: list.display_name.clone(),
                columns: list.columns.iter().map(|c| c.name.clone()).collect(),
            });
            self.gate("create_list")?;
            let mut created = list.clone();
            created.id = Some("list-1".to_string());
            created.web_url =
                Some("https://contoso.sharepoint.com/sites/flight/Lists/passengers".to_string());
            Ok(created)
        }

        async fn get_site_lists(
            &self,
            site_id: &str,
        ) -> Result<GraphCollection<SharePointList>, GraphError> {
            self.record(Call::GetSiteLists(site_id.to_string()));
            self.gate("get_site_lists")?;
            if self.omit_list_ids {
                return Ok(GraphCollection {
                    value: vec![SharePointList {
                        id: None,
                        display_name: "Documents".to_string(),
                        web_url: None,
                        columns: vec![],
                    }],
                });
            }
            Ok(GraphCollection {
                value: vec![
                    SharePointList {
                        id: Some("list-docs".to_string()),
                        display_name: "Documents".to_string(),
                        web_url: None,
                        columns: vec![],
                    },
                    SharePointList {
                        id: Some("list-1".to_string()),
                        display_name: "Challenging Passengers".to_string(),
                        web_url: None,
                        columns: vec![],
                    },
                ],
            })
        }

        async fn add_channel_tab(
            &self,
            _team_id: &str,
            _channel_id: &str,
            tab: &TeamsTab,
        ) -> Result<(), GraphError> {
            self.record(Call::AddTab(tab.name.clone()));
            self.gate("add_tab")
        }

        async fn create_page(
            &self,
            _site_id: &str,
            page: &SharePointPage,
        ) -> Result<SharePointPage, GraphError> {
            self.record(Call::CreatePage {
                title: page.title.clone(),
                parts: page.web_parts.len(),
            });
            self.gate("create_page")?;
            let mut created = page.clone();
            created.id = Some("page-1".to_string());
            Ok(created)
        }

        async fn publish_page(&self, _site_id: &str, page_id: &str) -> Result<(), GraphError> {
            self.record(Call::PublishPage(page_id.to_string()));
            self.gate("publish_page")
        }

        async fn archive_team(&self, team_id: &str) -> Result<(), GraphError> {
            self.record(Call::ArchiveTeam(team_id.to_string()));
            self.gate("archive")
        }

        async fn create_plan(&self, plan: &Plan) -> Result<Plan, GraphError> {
            self.record(Call::CreatePlan(plan.title.clone()));
            self.gate("create_plan")?;
            let mut created = plan.clone();
            created.id = Some("plan-1".to_string());
            Ok(created)
        }

        async fn create_bucket(&self, bucket: &Bucket) -> Result<Bucket, GraphError> {
            self.record(Call::CreateBucket(bucket.name.clone()));
            self.gate("create_bucket")?;
            let mut created = bucket.clone();
            created.id = Some(format!("bucket-{}", bucket.name));
            Ok(created)
        }

        async fn create_planner_task(&self, task: &PlannerTask) -> Result<PlannerTask, GraphError> {
            self.record(Call::CreateTask(task.title.clone()));
            self.gate("create_task")?;
            let mut created = task.clone();
            created.id = Some("task-1".to_string());
            Ok(created)
        }
    }

    fn team(admin: &str, pilots: &[&str], attendants: &[&str]) -> FlightTeam {
        FlightTeam {
            id: Some("group-1".to_string()),
            flight_number: 100,
            description: "Test flight".to_string(),
            admin: admin.to_string(),
            pilots: pilots.iter().map(|s| s.to_string()).collect(),
            flight_attendants: attendants.iter().map(|s| s.to_string()).collect(),
            catering_liaison: "dan@external.com".to_string(),
            departure_time: Utc::now(),
        }
    }

    fn service(graph: Arc<RecordingGraph>, config: ProvisionerConfig) -> ProvisioningService {
        ProvisioningService::new(graph, config)
    }

    fn user_ref(upn_or_id: &str) -> String {
        format!("https://graph.microsoft.com/beta/users/{upn_or_id}")
    }

    #[tokio::test]
    async fn test_provision_issues_expected_call_sequence() {
        let graph = Arc::new(RecordingGraph::new());
        let svc = service(graph.clone(), ProvisionerConfig::default());

        let mut request = team("alice", &["bob"], &["carol"]);
        request.id = None;

        let group_id = svc.provision(&request).await.unwrap();
        assert_eq!(group_id, "group-1");

        let calls = graph.calls();
        let kinds: Vec<&Call> = calls.iter().collect();

        assert!(matches!(kinds[0], Call::ResolveUser(u) if u == "bob"));
        assert!(matches!(kinds[1], Call::ResolveUser(u) if u == "carol"));
        assert!(matches!(kinds[2], Call::CreateGroup { .. }));
        assert!(matches!(kinds[3], Call::Invite(e) if e == "dan@external.com"));
        assert!(matches!(kinds[4], Call::AddMember { user, owner: false } if user == "guest-1"));
        assert!(matches!(kinds[5], Call::CreateTeam(g) if g == "group-1"));
        assert!(matches!(kinds[6], Call::ListChannels(_)));
        assert!(matches!(kinds[7], Call::CreateChannel(n) if n == "Pilots"));
        assert!(matches!(kinds[8], Call::CreateChannel(n) if n == "Flight Attendants"));
        assert!(matches!(kinds[9], Call::GetSite(g) if g == "group-1"));
        assert!(
            matches!(kinds[10], Call::CreateList { name, columns }
                if name == "Challenging Passengers"
                    && columns == &["Name", "SeatNumber", "Notes"])
        );
        assert!(matches!(kinds[11], Call::AddTab(n) if n == "Challenging Passengers"));
        assert!(matches!(kinds[12], Call::GetSiteLists(s) if s == "site-1"));
        assert!(matches!(kinds[13], Call::CreatePage { title, parts }
            if title == "Flight 100" && *parts == 2));
        assert!(matches!(kinds[14], Call::PublishPage(p) if p == "page-1"));
        assert_eq!(calls.len(), 15);
    }

    #[tokio::test]
    async fn test_group_members_deduplicated_admin_sole_owner() {
        let graph = Arc::new(RecordingGraph::new());
        let svc = service(graph.clone(), ProvisionerConfig::default());

        // bob appears twice, and the admin shows up in a roster too.
        let request = team("alice", &["bob", "bob", "alice"], &["carol"]);
        svc.provision(&request).await.unwrap();

        let calls = graph.calls();
        let resolves: Vec<&Call> = calls
            .iter()
            .filter(|c| matches!(c, Call::ResolveUser(_)))
            .collect();
        assert_eq!(
            resolves,
            vec![
                &Call::ResolveUser("bob".to_string()),
                &Call::ResolveUser("carol".to_string()),
            ]
        );

        let (members, owners, nickname) = calls
            .iter()
            .find_map(|c| match c {
                Call::CreateGroup {
                    members,
                    owners,
                    nickname,
                } => Some((members.clone(), owners.clone(), nickname.clone())),
                _ => None,
            })
            .unwrap();

        assert_eq!(
            members,
            vec![user_ref("id-bob"), user_ref("id-carol"), user_ref("alice")]
        );
        assert_eq!(owners, vec![user_ref("alice")]);
        // The admin appears exactly once across the member set.
        assert_eq!(
            members.iter().filter(|m| *m == &user_ref("alice")).count(),
            1
        );
        assert!(nickname.starts_with("flight100"));
        assert!(nickname.len() > "flight100".len());
    }

    #[tokio::test]
    async fn test_app_install_skipped_without_app_id() {
        let graph = Arc::new(RecordingGraph::new());
        let svc = service(graph.clone(), ProvisionerConfig::default());

        svc.provision(&team("alice", &["bob"], &[])).await.unwrap();

        assert!(!graph
            .calls()
            .iter()
            .any(|c| matches!(c, Call::AddApp(_))));
    }

    #[tokio::test]
    async fn test_app_install_issued_once_when_configured() {
        let graph = Arc::new(RecordingGraph::new());
        let config = ProvisionerConfig {
            team_app_id: Some("app-42".to_string()),
            ..ProvisionerConfig::default()
        };
        let svc = service(graph.clone(), config);

        svc.provision(&team("alice", &["bob"], &[])).await.unwrap();

        let calls = graph.calls();
        let installs: Vec<&Call> = calls
            .iter()
            .filter(|c| matches!(c, Call::AddApp(_)))
            .collect();
        assert_eq!(installs, vec![&Call::AddApp("app-42".to_string())]);
    }

    #[tokio::test]
    async fn test_planner_stage_dormant_by_default() {
        let graph = Arc::new(RecordingGraph::new());
        let svc = service(graph.clone(), ProvisionerConfig::default());

        svc.provision(&team("alice", &["bob"], &[])).await.unwrap();

        assert!(!graph
            .calls()
            .iter()
            .any(|c| matches!(c, Call::CreatePlan(_) | Call::CreateBucket(_) | Call::CreateTask(_))));
    }

    #[tokio::test]
    async fn test_planner_stage_runs_under_delegated_auth() {
        let graph = Arc::new(RecordingGraph::new());
        let config = ProvisionerConfig {
            tenant_name: Some("contoso".to_string()),
            capabilities: Capabilities {
                delegated_auth: true,
            },
            ..ProvisionerConfig::default()
        };
        let svc = service(graph.clone(), config);

        svc.provision(&team("alice", &["bob"], &[])).await.unwrap();

        let calls = graph.calls();
        assert!(calls.contains(&Call::CreatePlan("Pre-flight Checklist".to_string())));
        assert!(calls.contains(&Call::CreateBucket("To Do".to_string())));
        assert!(calls.contains(&Call::CreateBucket("Completed".to_string())));
        let tasks = calls
            .iter()
            .filter(|c| matches!(c, Call::CreateTask(_)))
            .count();
        assert_eq!(tasks, 2);
        assert!(calls.contains(&Call::AddTab("Pre-flight Checklist".to_string())));
    }

    #[tokio::test]
    async fn test_page_stage_rejects_list_without_id() {
        let graph = Arc::new(RecordingGraph::with_unidentified_lists());
        let svc = service(graph.clone(), ProvisionerConfig::default());

        let err = svc
            .provision(&team("alice", &["bob"], &[]))
            .await
            .unwrap_err();

        let rendered = format!("{err:#}");
        assert!(rendered.contains("failed to create team page"));
        assert!(rendered.contains("carried no id"));

        // No page is assembled from an unidentifiable list.
        let calls = graph.calls();
        assert!(!calls.iter().any(|c| matches!(c, Call::CreatePage { .. })));
        assert!(!calls.iter().any(|c| matches!(c, Call::PublishPage(_))));
    }

    #[tokio::test]
    async fn test_update_admin_swap_adds_before_removing() {
        let graph = Arc::new(RecordingGraph::new());
        let svc = service(graph.clone(), ProvisionerConfig::default());

        let original = team("alice", &["bob"], &[]);
        let updated = team("erin", &["bob"], &[]);
        svc.update(&original, &updated).await.unwrap();

        let calls = graph.calls();
        assert_eq!(
            calls,
            vec![
                Call::AddMember {
                    user: "erin".to_string(),
                    owner: true,
                },
                Call::RemoveMember {
                    user: "alice".to_string(),
                    owner: true,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_update_added_pilot_yields_single_add() {
        let graph = Arc::new(RecordingGraph::new());
        let svc = service(graph.clone(), ProvisionerConfig::default());

        let original = team("alice", &["bob"], &[]);
        let updated = team("alice", &["bob", "eve"], &[]);
        svc.update(&original, &updated).await.unwrap();

        assert_eq!(
            graph.calls(),
            vec![Call::AddMember {
                user: "eve".to_string(),
                owner: false,
            }]
        );
    }

    #[test]
    fn test_update_no_changes_issues_no_calls() {
        let graph = Arc::new(RecordingGraph::new());
        let svc = service(graph.clone(), ProvisionerConfig::default());

        let original = team("alice", &["bob"], &["carol"]);
        tokio_test::block_on(svc.update(&original, &original.clone())).unwrap();

        assert!(graph.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_requires_provisioned_id() {
        let graph = Arc::new(RecordingGraph::new());
        let svc = service(graph.clone(), ProvisionerConfig::default());

        let mut original = team("alice", &["bob"], &[]);
        original.id = None;
        let updated = team("alice", &["bob", "eve"], &[]);

        assert!(svc.update(&original, &updated).await.is_err());
        assert!(graph.calls().is_empty());
    }

    #[test]
    fn test_archive_issues_single_call() {
        let graph = Arc::new(RecordingGraph::new());
        let svc = service(graph.clone(), ProvisionerConfig::default());

        tokio_test::block_on(svc.archive("group-9")).unwrap();

        assert_eq!(graph.calls(), vec![Call::ArchiveTeam("group-9".to_string())]);
    }

    #[tokio::test]
    async fn test_stage_failure_aborts_without_compensation() {
        let graph = Arc::new(RecordingGraph::failing_on("create_team"));
        let svc = service(graph.clone(), ProvisionerConfig::default());

        let err = svc
            .provision(&team("alice", &["bob"], &[]))
            .await
            .unwrap_err();

        let rendered = format!("{err:#}");
        assert!(rendered.contains("failed to initialize team"));
        assert!(rendered.contains("HTTP 500"));

        // The run stops at the failing stage; nothing after it is attempted
        // and nothing already created is torn down.
        let calls = graph.calls();
        assert!(matches!(calls.last(), Some(Call::CreateTeam(_))));
        assert!(!calls.iter().any(|c| matches!(c, Call::ListChannels(_))));
        assert!(!calls.iter().any(|c| matches!(c, Call::RemoveMember { .. })));
    }
}
