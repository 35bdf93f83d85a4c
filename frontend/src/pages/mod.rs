pub mod home;
pub mod integrations;
pub mod tracking;
