use thiserror::Error;

use zcl::error::ZclError;

#[derive(Error, Debug)]
pub enum QuirkError {
    /* mapped errors */
    #[error(transparent)]
    ConfigError(#[from] config::ConfigError),

    #[error(transparent)]
    ZclError(#[from] ZclError),

    /* device errors */
    #[error("Endpoint {0} not present on device")]
    EndpointNotFound(u8),

    #[error("Cluster {cluster:#06x} not present on endpoint {endpoint}")]
    ClusterNotFound { endpoint: u8, cluster: u16 },

    #[error("No tokio runtime to schedule the motion reset on: {0}")]
    RuntimeUnavailable(#[from] tokio::runtime::TryCurrentError),

    /* config errors */
    #[error("Invalid battery voltage range: {min} V .. {max} V")]
    InvalidVoltageRange { min: f64, max: f64 },
}

pub type QuirkResult<T> = Result<T, QuirkError>;
