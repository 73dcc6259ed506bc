//! Shared test fixtures for infraplan crates.
//!
//! Plain constructors for domain inputs used across the workspace tests.
//! Fixtures panic on invalid data since they are only ever built from
//! literals.
//!
//! - [`assets`] - asset portfolios
//! - [`network`] - supply networks
//! - [`resources`] - resource pools and requirements
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! infraplan-test = { workspace = true }
//! ```
//!
//! ```
//! use infraplan_core::AssetType;
//! use infraplan_test::assets::asset;
//!
//! let bridge = asset("B-1", AssetType::Bridge, "ON", 55.0, 30.0, 250_000.0);
//! assert_eq!(bridge.region, "ON");
//! ```

pub mod assets;
pub mod network;
pub mod resources;

pub use assets::{asset, costed, mixed_portfolio};
pub use network::{balanced_network, hub_and_spoke, resilient_network, unbalanced_network};
pub use resources::{money_pool, personnel_pool, requirement};
