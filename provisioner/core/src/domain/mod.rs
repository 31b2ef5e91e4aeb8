// Copyright (c) 2026 Contoso Airlines
// SPDX-License-Identifier: AGPL-3.0

pub mod config;
pub mod graph;
pub mod resources;
pub mod team;

pub use config::{Capabilities, ProvisionerConfig};
pub use graph::{GraphApi, GraphError, GRAPH_DEFAULT_ENDPOINT};
pub use team::{FlightTeam, MembershipDelta, ProvisionedWorkspace, RosterDelta};
