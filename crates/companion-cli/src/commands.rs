pub mod config;
pub mod host_info;
pub mod launch;
pub mod peer_check;
pub mod peer_locate;
pub mod updates;
