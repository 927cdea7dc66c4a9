// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Invalid resource key: {0}")]
    MalformedKey(String),

    #[error("Missing object key: {0}")]
    MissingObjectKey(&'static str),

    #[error("Failed to create ingress {key}: {source}")]
    CreateFailed {
        key: String,
        #[source]
        source: kube::Error,
    },

    #[error("Failed to delete ingress {key}: {source}")]
    DeleteFailed {
        key: String,
        #[source]
        source: kube::Error,
    },

    #[error("Reconcile task aborted: {0}")]
    TaskAborted(String),
}

impl ControllerError {
    /// Whether the work queue should try the key again after a backoff.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ControllerError::MalformedKey(_) | ControllerError::MissingObjectKey(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ControllerError>;
