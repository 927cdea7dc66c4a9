// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reconcile keys: the `namespace/name` strings the work queue dedups on.

use crate::error::{ControllerError, Result};
use kube::api::ObjectMeta;
use std::fmt;
use std::str::FromStr;

/// Identity of one owner resource, parsed from a queued key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReconcileKey {
    pub namespace: String,
    pub name: String,
}

impl ReconcileKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Derive the `namespace/name` queue key for an object. Returns `None` when
    /// the object has no name or no namespace.
    pub fn for_object(meta: &ObjectMeta) -> Option<String> {
        let name = meta.name.as_deref().filter(|name| !name.is_empty())?;
        let namespace = meta.namespace.as_deref().filter(|ns| !ns.is_empty())?;
        Some(ReconcileKey::new(namespace, name).to_string())
    }
}

impl FromStr for ReconcileKey {
    type Err = ControllerError;

    /// Keys must contain exactly one `/` with a non-empty name after it.
    fn from_str(key: &str) -> Result<Self> {
        let mut parts = key.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(namespace), Some(name), None) if !name.is_empty() => {
                Ok(ReconcileKey::new(namespace, name))
            }
            _ => Err(ControllerError::MalformedKey(key.to_string())),
        }
    }
}

impl fmt::Display for ReconcileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
