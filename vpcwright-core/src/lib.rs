//! vpcwright core
//!
//! Resource model, the existence-gated provisioning protocol and the
//! ordered network build/teardown, expressed against the [`provider::Provider`]
//! trait.

pub mod builder;
pub mod cidr;
pub mod config;
pub mod error;
pub mod filter;
pub mod memory;
pub mod paginate;
pub mod provider;
pub mod provision;
pub mod resource;
pub mod tags;
pub mod teardown;
