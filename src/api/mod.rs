//! API type definitions

pub mod gateway;
pub mod openai;

pub use gateway::*;
pub use openai::*;
