//! Gateway orchestrator.
//!
//! Owns the active profile, the control state and the fault detector, and
//! exposes the per-message hooks: RX ingest, TX validation, forwarding and
//! the external enable/disable boundary. Processing is single-threaded and
//! message-at-a-time; nothing here consults the wall clock, so a recorded
//! frame log replays to identical decisions.

use thiserror::Error;
use tracing::{info, warn};

use crate::fault::{FaultDetector, FaultKind, FaultRecord};
use crate::frame::CanFrame;
use crate::gatekeeper::{self, TxDecision};
use crate::profile::{SafetyModel, SafetyProfile};
use crate::router;
use crate::rx;
use crate::state::{ControlState, StateSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("unknown safety profile selector: model {model:?}, param {param:#x}")]
    UnknownProfile { model: SafetyModel, param: u32 },
}

#[derive(Debug)]
pub struct SafetyGateway {
    profile: SafetyProfile,
    state: ControlState,
    detector: FaultDetector,
}

impl SafetyGateway {
    /// Initialize with the given profile selector. Unknown selectors
    /// produce a working gateway with the silent profile: nothing is
    /// whitelisted and controls cannot be enabled.
    pub fn new(model: SafetyModel, param: u32) -> Self {
        let profile = SafetyProfile::select(model, param);
        if profile.is_silent() {
            warn!(?model, param, "silent safety profile active; no TX permitted");
        } else {
            info!(?model, param, hardware = ?profile.hardware, "safety profile selected");
        }
        Self {
            profile,
            state: ControlState::new(),
            detector: FaultDetector::new(),
        }
    }

    /// Like [`SafetyGateway::new`], but surfaces an unknown selector as an
    /// error instead of silently failing closed.
    pub fn try_new(model: SafetyModel, param: u32) -> Result<Self, GatewayError> {
        let gateway = Self::new(model, param);
        if gateway.profile.is_silent() && model != SafetyModel::Silent {
            return Err(GatewayError::UnknownProfile { model, param });
        }
        Ok(gateway)
    }

    /// Re-initialization (ignition cycle): select a new profile and fully
    /// reset the control state and fault history.
    pub fn reinit(&mut self, model: SafetyModel, param: u32) {
        self.profile = SafetyProfile::select(model, param);
        self.state.reset();
        self.detector.reset();
    }

    /// Ingest one received frame.
    pub fn rx_hook(&mut self, frame: &CanFrame) {
        rx::handle_frame(&self.profile, &mut self.state, &mut self.detector, frame);
    }

    /// Validate one candidate TX frame.
    pub fn tx_hook(&mut self, frame: &CanFrame) -> TxDecision {
        gatekeeper::admit(&self.profile, &mut self.state, frame)
    }

    /// Destination bus for mirroring a received frame, or `None` to block.
    pub fn fwd_hook(&self, bus: u8, addr: u16) -> Option<u8> {
        router::forward(&self.profile, &self.state, bus, addr)
    }

    /// External control boundary. Enabling is honored only while no fault
    /// condition holds and the profile permits transmits at all; disabling
    /// is unconditional. Returns whether the request took effect.
    pub fn set_controls_allowed(&mut self, allowed: bool) -> bool {
        if !allowed {
            self.state.revoke_controls();
            return true;
        }
        if self.profile.is_silent() {
            warn!("enable request refused: silent profile");
            return false;
        }
        if let Some(fault) = self.detector.active_fault(&self.state) {
            warn!(?fault, "enable request refused: fault condition held");
            return false;
        }
        self.state.controls_allowed = true;
        true
    }

    /// Advance the control cycle counter. Driven externally so replay and
    /// live operation age timers identically.
    pub fn tick(&mut self) {
        self.state.cycle += 1;
    }

    pub fn controls_allowed(&self) -> bool {
        self.state.controls_allowed
    }

    pub fn profile(&self) -> &SafetyProfile {
        &self.profile
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.state.snapshot()
    }

    pub fn active_fault(&self) -> Option<FaultKind> {
        self.detector.active_fault(&self.state)
    }

    pub fn fault_records(&self) -> &[FaultRecord] {
        self.detector.records()
    }
}
