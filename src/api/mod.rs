//! API response types and request body parsing

pub mod body;
pub mod response;

pub use body::JsonBody;
pub use response::{Created, DataResponse, NoContent, SuccessResponse};
