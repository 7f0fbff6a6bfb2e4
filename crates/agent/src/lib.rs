//! Agent runtime - the async half of the opsroute decision pipeline.
//!
//! This crate turns a validated user request into a final answer:
//! 1. **Classification** (`classifier`) - keyword rules first, then
//!    embedding disambiguation against fixed intent prototypes when the
//!    rules are uncertain.
//! 2. **Routing** (`router`) - dispatches the classified intent to a
//!    bounded tool call or a composition step.
//! 3. **Tool execution** (`tools`) - allow-listed, argument-validated,
//!    deadline-wrapped tool dispatch with uniform safe failures.
//! 4. **Composition** (`composer`) - constrained model exchanges with a
//!    deterministic "I don't know." fallback.
//!
//! # Safety principle
//!
//! The model never decides what runs. Tools are allow-listed, arguments
//! are validated before any tool logic, and every failure path collapses
//! to a fixed user-facing sentence. A request always gets a response.

pub mod classifier;
pub mod composer;
pub mod llm;
pub mod ollama;
pub mod router;
pub mod runbooks;
pub mod runtime;
pub mod search;
pub mod tools;
pub mod worldtime;
