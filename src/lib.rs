pub mod aggregate;
pub mod config;
pub mod derived;
pub mod error;
pub mod export;
pub mod fake_season;
pub mod indices;
pub mod ingest;
pub mod leaders;
pub mod logging;
pub mod model;
pub mod percentile;
pub mod pipeline;
pub mod population;
pub mod rating;
pub mod registry;
pub mod table;
pub mod teams;
