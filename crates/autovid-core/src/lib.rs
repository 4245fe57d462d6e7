//! # autovid-core
//!
//! Humanized UI automation for screen-recorded app walkthroughs.
//!
//! This crate layers paced, presenter-like gestures (slow swipes, cinematic
//! drags, per-character typing, reading pauses) on top of a host UI
//! automation backend, and narrates a recording with scenes and a timeline
//! of markers for editing.
//!
//! ## Modules
//!
//! - [`humanize`] - Paced gestures built from driver primitives
//! - [`resolver`] - Picks the scrollable container a swipe should target
//! - [`director`] - Launch, scenes, announcements and the recording timeline
//! - [`script`] - JSON production scripts played through the director
//! - [`driver`] - The [`AutomationDriver`](driver::AutomationDriver) seam
//! - [`agent_driver`] / [`agent_client`] / [`protocol`] - TCP accessibility agent backend
//! - [`element`] / [`locator`] / [`gesture`] / [`device`] - Snapshot and gesture types
//! - [`pacing`] / [`config`] - Timing and persistent settings
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use autovid_core::agent_driver::AgentDriver;
//! use autovid_core::config::AutovidConfig;
//! use autovid_core::director::Director;
//! use autovid_core::driver::AutomationDriver;
//! use autovid_core::gesture::Direction;
//! use autovid_core::humanize::Humanizer;
//! use autovid_core::locator::Locator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AutovidConfig::load();
//! let mut driver = AgentDriver::new(&config.agent_host, config.agent_port);
//! driver.connect().await?;
//!
//! let director = Director::new(Humanizer::new(Arc::new(driver), config.pacing));
//! director.launch_and_record("com.example.notes").await;
//! director
//!     .scene("Browse", async {
//!         director.humanizer().scroll(&Locator::App, Direction::Up, None).await;
//!     })
//!     .await;
//! director.finish_recording().await;
//! # Ok(())
//! # }
//! ```

pub mod agent_client;
pub mod agent_driver;
pub mod config;
pub mod device;
pub mod director;
pub mod driver;
pub mod element;
pub mod gesture;
pub mod humanize;
pub mod locator;
pub mod pacing;
pub mod protocol;
pub mod resolver;
pub mod script;
