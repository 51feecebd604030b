#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod bus;
pub mod catalog;
pub mod cluster;
pub mod config;
pub mod device;
pub mod error;
pub mod konke;
pub mod signature;
