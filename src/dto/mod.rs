pub mod bindings;
pub mod config;
pub mod health;
pub mod scores;
pub mod session;
pub mod sse;
pub mod validation;
pub mod ws;
