//! Reconciliation engine for trip activity records.
//!
//! Every activity kind in the planner (boats, flights, stays, and so on) owns
//! a parent row in a hosted relational store plus two child collections:
//! file attachments, whose binary payloads live in separate blob storage, and
//! trip participants. This crate computes the minimal set of remote writes
//! needed to make the persisted child rows match a form's desired state, and
//! translates between the application's camelCase field convention and the
//! store's snake_case convention at the boundary.
//!
//! The engine is hexagonal: [`domain`] holds the transcoder, differ,
//! synchronizers, and the upsert orchestrator, all speaking to the outside
//! world through the ports in [`domain::ports`]; [`outbound`] provides HTTP
//! adapters for those ports.

pub mod domain;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
