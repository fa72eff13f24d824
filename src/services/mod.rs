//! Engine services.

pub mod bdr_service;
pub mod catalog_service;
pub mod dr_service;
pub mod policy_service;
pub mod restore_service;
