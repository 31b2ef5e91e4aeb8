// Copyright (c) 2026 Contoso Airlines
// SPDX-License-Identifier: AGPL-3.0

pub mod provisioning;

pub use provisioning::ProvisioningService;
