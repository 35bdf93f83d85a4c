pub mod indicators;
pub mod template;
pub mod toast;
pub mod transport_tile;
