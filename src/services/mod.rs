//! Service layer modules.
//!
//! Contains the AI gateway client, prompt construction, reply decoding,
//! CSV export and the in-memory session store.

pub mod decoder;
pub mod export;
pub mod gateway;
pub mod prompts;
pub mod session;

pub use gateway::GatewayClient;
pub use session::SessionStore;
