pub mod config_service;
pub mod credentials;
pub mod http_gateway;
pub mod paths;

pub use config_service::ConfigService;
pub use credentials::{
    ChainedCredentials, EnvCredentials, StaticCredentials, TokenFileCredentials,
    default_credentials,
};
pub use http_gateway::HttpSyncGateway;
pub use paths::ParleyPaths;
