pub mod attr;
pub mod cluster;
pub mod error;
pub mod frame;
