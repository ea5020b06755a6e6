//! Cart

pub mod errors;
pub mod guest;
pub mod models;
pub mod reducer;
pub mod remote;
pub mod service;

pub use errors::CartServiceError;
pub use service::CartService;
