pub mod api;
pub mod oauth1;

pub use api::TwitterClient;
