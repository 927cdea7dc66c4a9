// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Where errors go once the controller gives up on a key.

use crate::error::ControllerError;
use tracing::error;

/// Receives errors for keys that are dropped without further retries: malformed
/// keys, permanent failures and keys that ran out of retries.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, key: &str, error: &ControllerError);
}

/// Default reporter: logs and moves on.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, key: &str, err: &ControllerError) {
        error!(%key, error = %err, "Dropping key from the work queue");
    }
}
