pub mod channel;
pub mod live;
pub mod n8n;
pub mod reconciler;
pub mod server;
pub mod snapshot;
pub mod transport;
pub mod ws_handler;
