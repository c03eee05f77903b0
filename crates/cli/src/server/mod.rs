pub mod dns;
pub mod reload;

pub use dns::start_dns_server;
pub use reload::{join_reload_watcher, watch_reload_signal};
