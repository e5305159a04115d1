pub mod breach;
pub mod config;
pub mod http;
pub mod links;
pub mod logging;
pub mod metadata;
pub mod number;
pub mod paths;
pub mod report;
pub mod report_store;
pub mod reverse_lookup;
pub mod search;
pub mod types;
