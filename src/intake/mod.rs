// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Event intake: turns Service and Ingress notifications into reconcile keys.
//!
//! Only three notifications matter. Service adds and real Service updates enqueue
//! the Service. Ingress deletions enqueue the controlling Service so a still
//! wanted Ingress gets recreated. Ingress adds and updates are ignored so the
//! controller never reacts to its own writes.

pub mod watch;

pub use watch::{ingress_notification, run_watch, service_notification, CacheRelay};

use crate::constants::OWNER_KIND;
use crate::queue::WorkQueue;
use crate::types::{controller_of, ReconcileKey};
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A change observed in the caches, typed per resource kind
#[derive(Debug, Clone)]
pub enum Notification {
    OwnerAdded(Service),
    OwnerUpdated { old: Service, new: Service },
    OwnedDeleted(Ingress),
}

/// Hands reconcile keys to the work queue. Never touches the API server.
#[derive(Clone)]
pub struct EventIntake {
    queue: Arc<WorkQueue<String>>,
}

impl EventIntake {
    pub fn new(queue: Arc<WorkQueue<String>>) -> Self {
        Self { queue }
    }

    /// Enqueue the key a notification maps to, if any, and return it.
    pub fn handle(&self, notification: Notification) -> Option<String> {
        let key = match notification {
            Notification::OwnerAdded(service) => self.owner_added(&service),
            Notification::OwnerUpdated { old, new } => self.owner_updated(&old, &new),
            Notification::OwnedDeleted(ingress) => self.owned_deleted(&ingress),
        }?;

        trace!(%key, "Enqueueing");
        self.queue.add(key.clone());
        Some(key)
    }

    fn owner_added(&self, service: &Service) -> Option<String> {
        let key = ReconcileKey::for_object(&service.metadata);
        if key.is_none() {
            warn!("Ignoring Service without a name or namespace");
        }
        key
    }

    fn owner_updated(&self, old: &Service, new: &Service) -> Option<String> {
        if old == new {
            debug!(
                "Service {}/{} unchanged, skipping",
                new.namespace().unwrap_or_default(),
                new.name_any()
            );
            return None;
        }
        self.owner_added(new)
    }

    fn owned_deleted(&self, ingress: &Ingress) -> Option<String> {
        let owner = controller_of(ingress)?;
        if owner.kind != OWNER_KIND {
            debug!(
                "Ingress {} is controlled by a {}, not a {}, skipping",
                ingress.name_any(),
                owner.kind,
                OWNER_KIND
            );
            return None;
        }
        let namespace = ingress.namespace().unwrap_or_default();
        Some(ReconcileKey::new(namespace, owner.name.clone()).to_string())
    }
}
