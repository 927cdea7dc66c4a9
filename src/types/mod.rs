// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reconcile keys and the Service → Ingress derivation.

pub mod ingress;
pub mod key;

pub use ingress::{build_ingress, controller_of, wants_ingress, IngressTemplate};
pub use key::ReconcileKey;
