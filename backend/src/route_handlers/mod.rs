pub mod query;
pub mod sockets;
