//! Application layer containing the core business logic orchestration.
//!
//! This module defines the `ApprovalEngine`, which gates outbound transfers
//! behind human review and a sliding-window rate limit. The engine holds no
//! authoritative state of its own; everything it decides is read from and
//! written back to the ledger port.

pub mod engine;
