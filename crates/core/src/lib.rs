//! Core domain logic for the opsroute assistant.
//!
//! Everything in this crate is deterministic and synchronous: the intent
//! data model, the keyword rule book, the input guard, the pre-routing
//! policy (including the arithmetic evaluator), cosine similarity, the
//! seed runbook corpus, and configuration loading. The async pieces
//! (model calls, search, tools, routing) live in `opsroute-agent`.

pub mod config;
pub mod corpus;
pub mod guard;
pub mod intent;
pub mod policy;
pub mod rules;
pub mod similarity;
