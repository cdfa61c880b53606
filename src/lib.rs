//! Agent descriptors, validated HTTP tool adapters, and a sentinel-framed
//! CLI runner for a hosted agent engine.
//!
//! The crate runs no model loop of its own: descriptors declare what an
//! agent is, and an [`AgentRuntime`] (remote engine or scripted stand-in)
//! executes the run and streams back classified chunks.

pub mod agents;
pub mod tools;

mod config;
mod descriptor;
mod error;
mod hooks;
mod runner;
mod runtime;
mod tool;

pub use config::{AppConfig, EngineConfig, ToolsConfig, TraceConfig};
pub use descriptor::AgentDescriptor;
pub use error::{Result, SidelineError};
pub use hooks::{AgentHook, TraceHook};
pub use runner::{
    collect_response, frame_error, frame_response, invoke, Rendered, ERROR_END, ERROR_START,
    RESPONSE_END, RESPONSE_START,
};
pub use runtime::{
    AgentRuntime, ChunkStream, EngineRuntime, RunChunk, RunRequest, ScriptedRuntime, ScriptedStep,
};
pub use tool::{Tool, ToolDescription, ToolRegistry};
