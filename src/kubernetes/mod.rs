// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes adapters: API discovery and the cache-backed resource store.

pub mod discovery;
pub mod store;

pub use discovery::wait_for_ingress_api;
pub use store::{DeleteOutcome, KubeStore, ResourceStore};

use k8s_openapi::NamespaceResourceScope;
use kube::{Api, Client, Resource};

/// Api for a namespaced kind, limited to one namespace when given.
pub fn scoped_api<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope>,
    <K as Resource>::DynamicType: Default,
{
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}
