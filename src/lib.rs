pub mod api_football;
pub mod bracket;
pub mod competition;
pub mod config;
pub mod demo_source;
pub mod error;
pub mod feed;
pub mod http_client;
pub mod models;
pub mod period;
pub mod source;
pub mod state;
pub mod team_stats;
