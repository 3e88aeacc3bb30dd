pub mod cors;
pub mod request_id;

pub use cors::{cors_header_layers, preflight};
pub use request_id::request_id_layer;
