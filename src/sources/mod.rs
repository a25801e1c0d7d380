//! Data sources: the HTTP transport, the JSON-RPC gateway on top of it and the
//! typed block queries the scanner consumes.

pub mod blocks;
pub mod gateway;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use blocks::BlockWindowResolver;
pub use gateway::RpcGateway;
pub use transport::{HttpTransport, ReqwestTransport, TransportResponse};
