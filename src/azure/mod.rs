//! Azure API interaction module
//!
//! This module provides the core functionality for talking to Azure Resource
//! Manager and Cost Management: authentication, HTTP plumbing and the
//! subscription-scoped management session.
//!
//! # Module Structure
//!
//! - [`auth`] - Service principal credential and token acquisition
//! - [`client`] - Management session, resource group and resource listing
//! - [`costs`] - Cost Management query request/response types
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use crate::azure::{auth, client::ManagementSession};
//!
//! async fn example(config: &Config) -> anyhow::Result<()> {
//!     let credential = auth::acquire_credential(config)?;
//!     let session = ManagementSession::open(config, &credential, "sub-id").await?;
//!     let groups: Vec<_> = session.resource_groups().try_collect().await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod costs;
pub mod http;
