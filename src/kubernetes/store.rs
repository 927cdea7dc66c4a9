// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cached reads and Ingress mutations the reconciler depends on.

use crate::error::{ControllerError, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::{
    api::{DeleteParams, PostParams},
    runtime::reflector::{ObjectRef, Store},
    Api, Client, ResourceExt,
};
use tracing::{debug, info, instrument};

/// Result of deleting an Ingress. A missing Ingress is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Point lookups against the local caches plus the two mutations the
/// controller performs. "Not found" is `Ok(None)`, never an error.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn get_owner(&self, namespace: &str, name: &str) -> Result<Option<Service>>;

    async fn get_owned(&self, namespace: &str, name: &str) -> Result<Option<Ingress>>;

    async fn create_owned(&self, ingress: &Ingress) -> Result<Ingress>;

    async fn delete_owned(&self, namespace: &str, name: &str) -> Result<DeleteOutcome>;
}

/// `ResourceStore` backed by reflector caches for reads and the API server for writes.
pub struct KubeStore {
    client: Client,
    services: Store<Service>,
    ingresses: Store<Ingress>,
}

impl KubeStore {
    pub fn new(client: Client, services: Store<Service>, ingresses: Store<Ingress>) -> Self {
        Self {
            client,
            services,
            ingresses,
        }
    }

    fn ingress_api(&self, namespace: &str) -> Api<Ingress> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn get_owner(&self, namespace: &str, name: &str) -> Result<Option<Service>> {
        let key = ObjectRef::new(name).within(namespace);
        Ok(self.services.get(&key).map(|svc| (*svc).clone()))
    }

    async fn get_owned(&self, namespace: &str, name: &str) -> Result<Option<Ingress>> {
        let key = ObjectRef::new(name).within(namespace);
        Ok(self.ingresses.get(&key).map(|ing| (*ing).clone()))
    }

    #[instrument(skip(self, ingress), fields(ingress = %ingress.name_any()))]
    async fn create_owned(&self, ingress: &Ingress) -> Result<Ingress> {
        let namespace = ingress
            .namespace()
            .ok_or(ControllerError::MissingObjectKey("metadata.namespace"))?;
        let key = format!("{}/{}", namespace, ingress.name_any());

        let created = self
            .ingress_api(&namespace)
            .create(&PostParams::default(), ingress)
            .await
            .map_err(|source| ControllerError::CreateFailed { key, source })?;

        info!("Created ingress {}/{}", namespace, created.name_any());
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn delete_owned(&self, namespace: &str, name: &str) -> Result<DeleteOutcome> {
        match self
            .ingress_api(namespace)
            .delete(name, &DeleteParams::default())
            .await
        {
            Ok(_) => {
                info!("Deleted ingress {}/{}", namespace, name);
                Ok(DeleteOutcome::Deleted)
            }
            Err(kube::Error::Api(err)) if err.code == 404 => {
                debug!("Ingress {}/{} already gone", namespace, name);
                Ok(DeleteOutcome::NotFound)
            }
            Err(source) => Err(ControllerError::DeleteFailed {
                key: format!("{}/{}", namespace, name),
                source,
            }),
        }
    }
}
