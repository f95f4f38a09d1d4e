//! Driven adapters implementing the domain ports.

pub mod http_gateway;
pub mod memory_storage;

pub use self::http_gateway::{HttpGateway, HttpGatewayBuildError};
pub use self::memory_storage::MemoryStorage;
