//! # CAN Safety Gateway
//!
//! A deterministic safety interlock between an autonomy stack and a
//! vehicle's control buses: per received or candidate frame it decides
//! whether a command may be transmitted, whether a stock-system frame must
//! be mirrored onto another bus segment, and whether accumulated evidence
//! requires revoking permission to drive.
//!
//! ## Features
//!
//! - **Per-message TX validation**: whitelist, kinematic angle limits,
//!   longitudinal sanity checks, AEB pass-through-only policy
//! - **Fault detection**: relay malfunction, driver override escalation,
//!   stale message counters; all level-triggered and fail-closed
//! - **Stock-system arbitration**: exactly one commander per actuator
//! - **Deterministic replay**: no wall-clock dependence, no allocation in
//!   the decision path, bounded memory usage
//!
//! ## Quick Start
//!
//! ```rust
//! use cangate::{SafetyGateway, SafetyModel, profile::FLAG_HW3};
//!
//! let mut gateway = SafetyGateway::new(SafetyModel::LegacyAngle, FLAG_HW3);
//!
//! // Feed received frames, then submit TX candidates.
//! let frame = cangate::signals::encode_drive_state(2, 1);
//! gateway.rx_hook(&frame);
//! assert!(gateway.set_controls_allowed(true));
//! ```
//!
//! ## Architecture
//!
//! - [`gateway`] - Orchestrator and public hook API
//! - [`frame`] / [`signals`] - Bus abstraction and wire layouts
//! - [`dynamics`] - Speed-dependent steering limits
//! - [`profile`] - Per-hardware-variant safety profiles
//! - [`rx`] - Received-frame state updates
//! - [`fault`] - Fault and relay-malfunction detection
//! - [`router`] - Bus forwarding with stock-command arbitration
//! - [`gatekeeper`] - TX admit/reject decisions

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod dynamics;
pub mod fault;
pub mod frame;
pub mod gatekeeper;
pub mod gateway;
pub mod profile;
pub mod router;
pub mod rx;
pub mod signals;
pub mod state;

// Re-export main public types for convenience
pub use fault::{FaultKind, FaultRecord};
pub use frame::CanFrame;
pub use gatekeeper::{RejectReason, TxDecision};
pub use gateway::{GatewayError, SafetyGateway};
pub use profile::{SafetyModel, SafetyProfile};
pub use state::{ControlState, StateSnapshot};
