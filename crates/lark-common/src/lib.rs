//! Shared utilities for the Lark parsing engine.

/// Deduplicated diagnostics routed through the `log` facade.
pub mod warning;
