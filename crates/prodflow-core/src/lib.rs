pub mod artifact;
pub mod collaborator;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod paths;
pub mod rules;
pub mod stage;
pub mod state;
pub mod types;

pub use error::{Result, WorkflowError};
