mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod schema;
    pub mod shopping_list;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod config;
mod constants;

mod cache {
    pub mod cache;
}

pub mod http;

pub use authentication::*;
pub use cache::cache::*;
pub use config::*;
pub use constants::*;
pub use database::*;
pub use shopping_list::*;
