pub mod context;
pub mod middleware;
pub mod verifier;

pub use middleware::RequireAuth;
pub use verifier::AuthVerifier;
