//! Processor selection and device failure handling
//!
//! The manager decides which processor each solve runs on, remembers device
//! failures, and keeps per-processor timing. All state sits behind one
//! `RwLock`, so a single manager can be shared between threads.

use crate::error::SimulationError;
use crate::fft::{DeviceInfo, ProcessorKind};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BackendMode {
    /// Device when it is healthy and measurably faster
    #[default]
    Auto,
    ForceCpu,
    ForceGpu,
}

/// Rolling timing for one processor kind, in milliseconds
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PerformanceStats {
    pub count: u64,
    pub total_ms: f64,
    pub average_ms: f64,
}

impl PerformanceStats {
    fn record(&mut self, elapsed: Duration) {
        self.count += 1;
        self.total_ms += elapsed.as_secs_f64() * 1000.0;
        self.average_ms = self.total_ms / self.count as f64;
    }
}

/// Snapshot for UI collaborators
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackendStatus {
    pub mode: BackendMode,
    pub has_error: bool,
    /// A device failure pushed work back onto the CPU
    pub is_fallback: bool,
}

#[derive(Debug, Default)]
struct FallbackState {
    mode: BackendMode,
    device_available: bool,
    device_info: Option<DeviceInfo>,
    has_error: bool,
    last_error: Option<SimulationError>,
    fallback_active: bool,
    stats: HashMap<ProcessorKind, PerformanceStats>,
}

#[derive(Debug, Default)]
pub struct FallbackManager {
    state: RwLock<FallbackState>,
}

impl FallbackManager {
    pub fn new(mode: BackendMode) -> Self {
        Self {
            state: RwLock::new(FallbackState {
                mode,
                ..FallbackState::default()
            }),
        }
    }

    // A panicking holder leaves the state consistent, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, FallbackState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, FallbackState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn mode(&self) -> BackendMode {
        self.read().mode
    }

    pub fn set_mode(&self, mode: BackendMode) {
        let mut state = self.write();
        if state.mode != mode {
            log::info!("Backend mode {:?} -> {:?}", state.mode, mode);
        }
        state.mode = mode;
    }

    pub fn is_device_available(&self) -> bool {
        self.read().device_available
    }

    pub fn set_device_available(&self, available: bool, info: Option<DeviceInfo>) {
        let mut state = self.write();
        state.device_available = available;
        state.device_info = info;
    }

    pub fn device_info(&self) -> Option<DeviceInfo> {
        self.read().device_info.clone()
    }

    /// Processor for the next solve
    pub fn processor(&self) -> ProcessorKind {
        let state = self.read();
        let healthy = state.device_available && !state.has_error;
        match state.mode {
            BackendMode::ForceCpu => ProcessorKind::Cpu,
            BackendMode::ForceGpu if healthy => ProcessorKind::Device,
            BackendMode::ForceGpu => ProcessorKind::Cpu,
            BackendMode::Auto => {
                let cpu = state.stats.get(&ProcessorKind::Cpu).filter(|s| s.count > 0);
                let device = state.stats.get(&ProcessorKind::Device).filter(|s| s.count > 0);
                match (cpu, device) {
                    (Some(cpu), Some(device)) if healthy && device.average_ms < cpu.average_ms => {
                        ProcessorKind::Device
                    }
                    _ => ProcessorKind::Cpu,
                }
            }
        }
    }

    /// Record a device failure. A forced device mode becomes forced CPU.
    pub fn report_device_error(&self, error: &SimulationError) {
        let mut state = self.write();
        log::error!("Compute device error: {error}");
        state.has_error = true;
        state.last_error = Some(error.clone());
        state.fallback_active = true;
        if state.mode == BackendMode::ForceGpu {
            log::warn!("Falling back from forced device to forced CPU");
            state.mode = BackendMode::ForceCpu;
        }
    }

    /// Inject a synthetic device failure
    pub fn simulate_device_error(&self) {
        self.report_device_error(&SimulationError::BackendExecution("simulated device error".into()));
    }

    pub fn has_error(&self) -> bool {
        self.read().has_error
    }

    pub fn last_error(&self) -> Option<SimulationError> {
        self.read().last_error.clone()
    }

    pub fn clear_errors(&self) {
        let mut state = self.write();
        state.has_error = false;
        state.last_error = None;
        state.fallback_active = false;
    }

    /// Best-effort device re-initialization, then clear the error state.
    ///
    /// `reinit` runs without the lock held. A failed re-initialization is
    /// logged and the errors are still cleared; only a missing device is an
    /// error.
    pub fn attempt_recovery<F>(&self, reinit: F) -> Result<(), SimulationError>
    where
        F: FnOnce() -> Result<DeviceInfo, SimulationError>,
    {
        if !self.is_device_available() {
            return Err(SimulationError::BackendUnavailable(
                "no compute device available for recovery".into(),
            ));
        }

        let info = match reinit() {
            Ok(info) => Some(info),
            Err(err) => {
                log::warn!("Device re-initialization failed during recovery: {err}");
                None
            }
        };

        let mut state = self.write();
        if let Some(info) = info {
            log::warn!("Recovered compute device {info}");
            state.device_info = Some(info);
        }
        state.has_error = false;
        state.last_error = None;
        state.fallback_active = false;
        Ok(())
    }

    pub fn record_performance(&self, kind: ProcessorKind, elapsed: Duration) {
        self.write().stats.entry(kind).or_default().record(elapsed);
    }

    pub fn performance_stats(&self) -> HashMap<ProcessorKind, PerformanceStats> {
        self.read().stats.clone()
    }

    pub fn stats_for(&self, kind: ProcessorKind) -> Option<PerformanceStats> {
        self.read().stats.get(&kind).copied()
    }

    pub fn status(&self) -> BackendStatus {
        let state = self.read();
        BackendStatus {
            mode: state.mode,
            has_error: state.has_error,
            is_fallback: state.fallback_active,
        }
    }
}
