// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Ingress reconciler - drives one Service key to its desired Ingress state.

use crate::error::Result;
use crate::kubernetes::{DeleteOutcome, ResourceStore};
use crate::types::{build_ingress, wants_ingress, IngressTemplate, ReconcileKey};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// What a sync did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The Service is gone; nothing to converge
    OwnerGone,
    Created,
    Deleted,
    /// Delete was needed but the Ingress had already disappeared
    AlreadyDeleted,
    /// Desired and actual state already agree
    InSync,
}

pub struct IngressReconciler {
    store: Arc<dyn ResourceStore>,
    template: IngressTemplate,
}

impl IngressReconciler {
    pub fn new(store: Arc<dyn ResourceStore>, template: IngressTemplate) -> Self {
        Self { store, template }
    }

    /// Compare the Service's wish with the cached Ingress and fix the difference.
    ///
    /// Reads current cache state only, so running it twice for the same state
    /// performs no additional writes. An existing Ingress is never updated.
    #[instrument(skip(self))]
    pub async fn sync(&self, key: &str) -> Result<SyncOutcome> {
        let ReconcileKey { namespace, name } = key.parse::<ReconcileKey>()?;

        let Some(service) = self.store.get_owner(&namespace, &name).await? else {
            debug!("Service {}/{} no longer exists, nothing to do", namespace, name);
            return Ok(SyncOutcome::OwnerGone);
        };

        let desired = wants_ingress(&service);
        let existing = self.store.get_owned(&namespace, &name).await?;

        match (desired, existing) {
            (true, None) => {
                let ingress = build_ingress(&service, &self.template)?;
                self.store.create_owned(&ingress).await?;
                info!("Exposed service {}/{} through an ingress", namespace, name);
                Ok(SyncOutcome::Created)
            }
            (false, Some(_)) => match self.store.delete_owned(&namespace, &name).await? {
                DeleteOutcome::Deleted => {
                    info!("Removed ingress for service {}/{}", namespace, name);
                    Ok(SyncOutcome::Deleted)
                }
                DeleteOutcome::NotFound => Ok(SyncOutcome::AlreadyDeleted),
            },
            (true, Some(_)) | (false, None) => {
                debug!("Service {}/{} in sync", namespace, name);
                Ok(SyncOutcome::InSync)
            }
        }
    }
}
