//! Services layer - orchestration logic
//!
//! This module coordinates between domain logic and infrastructure.
//! Services only see infrastructure through its traits.

pub mod deploy_service;

pub use deploy_service::DeployService;
