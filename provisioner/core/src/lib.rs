// Copyright (c) 2026 Contoso Airlines
// SPDX-License-Identifier: AGPL-3.0
//! Crewspace provisioner core
//!
//! Provisions collaboration workspaces for flight crews: a private group
//! with the crew as members, a team with role channels, a passenger list
//! pinned to the default channel, and a published landing page.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain model, Graph port, and provisioning workflow

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::*;
