pub mod error;
pub mod ports;
pub mod promotion;
pub mod quality;

// Short paths for the rest of the crate
pub use error::DomainError;
