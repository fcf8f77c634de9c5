pub mod error;
pub mod memory;
pub mod remote;

pub mod http {
    pub mod client;
    pub mod config;
}
