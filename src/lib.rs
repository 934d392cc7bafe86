//! Rust library for launching and controlling activities on cast receivers
//!
//! This library drives a remote activity through a callback-based device
//! API and keeps a consistent local view of its state. It supports:
//!
//! - Receiver discovery updates scoped to an application
//! - Launching, stopping and querying a remote activity
//! - Stop-before-launch sequencing so only one activity runs at a time
//! - Play, pause, mute, unmute and volume control
//! - Continuous volume binding with latest-value-wins coalescing
//! - Change notifications for re-rendering
//!
//! # Quick Start
//!
//! ```no_run
//! use cast_activity::{ApiFactory, BootstrapGate, CastApi, SessionConfig};
//! use std::sync::Arc;
//!
//! # fn device_api() -> Arc<dyn CastApi> { unimplemented!() }
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory: ApiFactory = Box::new(device_api);
//!     let mut gate = BootstrapGate::new(SessionConfig::default(), factory);
//!
//!     // Either the API is already there, or it announces itself later
//!     gate.detect(true)?;
//!
//!     let session = gate.session()?;
//!     let mut changes = session.subscribe();
//!     session.controller().set_application("Foo")?;
//!
//!     while let Ok(change) = changes.recv().await {
//!         println!("State changed: {:?}", change);
//!         if let Some(receiver) = session.receivers().receivers().first() {
//!             session.controller().launch(receiver.clone())?;
//!             break;
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Bootstrap**: detects the device API and builds the session once
//! - **Session**: wires components together, owns the volume binding
//! - **Activity**: activity lifecycle and session state
//! - **Media**: playback state of the running activity
//! - **Receivers**: receiver list for the configured application
//! - **Pending**: correlation of issued commands with their results
//! - **Api**: the device API boundary
//! - **Types**: request and result data structures

mod activity;
mod api;
mod bootstrap;
mod config;
mod error;
mod media;
mod pending;
mod receivers;
mod session;
mod subscription;
#[cfg(test)]
mod testing;
mod types;
mod volume;

// Public exports
pub use activity::{ActivitySessionController, ActivityState, Session};
pub use api::{ActivityCallback, CastApi, MediaCallback, ReceiverListener};
pub use bootstrap::{ApiFactory, BootstrapGate, HandshakeMessage};
pub use config::{SessionConfig, StopFailurePolicy};
pub use error::{CastError, LastError, Result};
pub use media::{MediaSnapshot, MediaStateTracker};
pub use pending::{Action, OperationId, PendingOperations};
pub use receivers::ReceiverDirectory;
pub use session::{CastSession, SessionSnapshot};
pub use subscription::{StateChange, StateReceiver};
pub use types::{
    ActivityId, ActivityStatus, AppId, LaunchRequest, MediaPlayRequest, MediaResult,
    MediaStatus, MediaVolumeRequest, Receiver, ReceiverId, VolumeLevel,
};
pub use volume::VolumeControl;
