// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Service → Ingress reconciliation and the workers that drive it.

pub mod controller;
pub mod ingress;

pub use controller::Controller;
pub use ingress::{IngressReconciler, SyncOutcome};
