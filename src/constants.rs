// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys used by the ingress manager
pub mod annotations {
    /// When present on a Service (any value), an Ingress should exist for it
    pub const EXPOSE_HTTP: &str = "ingress/http";
}

/// Kind that owner references must carry for an Ingress deletion to be acted upon
pub const OWNER_KIND: &str = "Service";

/// Name of the work queue, used in log fields
pub const QUEUE_NAME: &str = "ingressManager";

/// Shape of the Ingress derived from an exposed Service
pub mod ingress {
    pub const DEFAULT_HOST: &str = "example.com";
    pub const DEFAULT_CLASS: &str = "nginx";
    pub const ROOT_PATH: &str = "/";
    pub const PATH_TYPE: &str = "Prefix";
    pub const BACKEND_PORT: i32 = 80;
}

/// Worker pool and retry defaults
pub mod workers {
    pub const DEFAULT_WORKERS: usize = 5;
    pub const DEFAULT_MAX_RETRIES: u32 = 10;
    /// Per-key backoff starts here and doubles with every failure
    pub const DEFAULT_BACKOFF_BASE_MS: u64 = 5;
    /// Per-key backoff never exceeds this
    pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 1000;
}

/// API discovery polling configuration
pub mod discovery {
    /// Initial polling interval in seconds when waiting for the Ingress API
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
