// Copyright (c) 2026 Contoso Airlines
// SPDX-License-Identifier: AGPL-3.0

pub mod graph_client;

pub use graph_client::GraphClient;
