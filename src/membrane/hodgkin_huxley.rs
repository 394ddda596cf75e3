//! Hodgkin-Huxley Membrane Integrator
//!
//! Drives the membrane voltage of the axon cross-section.
//!
//! ## Equations
//!
//! ```text
//! C_m * dV/dt = -(I_Na + I_K + I_leak)
//! I_Na = g_Na * m³h * (V - E_Na)
//! I_K = g_K * n⁴ * (V - E_K)
//! I_leak = g_L * (V - E_L)
//! ```
//!
//! ## Time
//!
//! Callers pass seconds of simulated time; the kinetics run in milliseconds.
//! A step longer than the configured maximum sub-step is split into equal
//! sub-steps. The equations are stiff during the upstroke and a single large
//! Euler step diverges.
//!
//! ## Delayed products
//!
//! `m³h` and `n⁴` are cached after every step and pushed into delay buffers.
//! Channels read the delayed values so their animation can lag the voltage
//! trace by a fixed amount.

use super::{Conductances, DelayBuffer};
use crate::config::IntegratorConfig;
use serde::{Deserialize, Serialize};

/// Gating variable with α and β rates
#[derive(Clone, Copy, Debug, Default)]
struct Gate {
    /// Current state (0 to 1)
    state: f32,
    /// Alpha rate (1/ms)
    alpha: f32,
    /// Beta rate (1/ms)
    beta: f32,
}

impl Gate {
    /// Initialize state to steady-state value
    fn init_steady_state(&mut self) {
        if self.alpha + self.beta > 0.0 {
            self.state = self.alpha / (self.alpha + self.beta);
        }
    }

    /// Exponential-Euler update; exact for fixed rates, never leaves [0, 1]
    fn update(&mut self, dt_ms: f32) {
        let total = self.alpha + self.beta;
        if total <= 0.0 {
            return;
        }
        let steady = self.alpha / total;
        let decay = (-dt_ms * total).exp();
        self.state = (steady + (self.state - steady) * decay).clamp(0.0, 1.0);
    }
}

/// Gating variables (debug/telemetry)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GatingVariables {
    /// Sodium activation gate (m)
    pub m: f32,
    /// Sodium inactivation gate (h)
    pub h: f32,
    /// Potassium activation gate (n)
    pub n: f32,
}

/// Owned snapshot of the integrator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HodgkinHuxleyState {
    /// Membrane voltage (mV)
    pub voltage: f32,
    pub gating: GatingVariables,
    pub conductances: Conductances,
    /// Membrane time integrated since reset (ms)
    pub elapsed_ms: f64,
    /// Membrane time since the last accepted stimulus (ms)
    pub ms_since_stimulus: Option<f64>,
    pub m3h_delay: DelayBuffer,
    pub n4_delay: DelayBuffer,
}

/// Hodgkin-Huxley integrator for a single membrane patch
#[derive(Clone, Debug)]
pub struct HodgkinHuxleyIntegrator {
    /// Membrane potential (mV)
    v: f32,
    /// Membrane capacitance (µF/cm²)
    c_m: f32,

    // === Ion Channel Conductances ===
    conductances: Conductances,
    /// Profile values restored on reset
    nominal_conductances: Conductances,

    // === Reversal Potentials ===
    /// Sodium reversal (mV)
    e_na: f32,
    /// Potassium reversal (mV)
    e_k: f32,
    /// Leak reversal (mV)
    e_leak: f32,

    // === Gating Variables ===
    /// Sodium activation (m)
    m: Gate,
    /// Sodium inactivation (h)
    h: Gate,
    /// Potassium activation (n)
    n: Gate,

    // === Cached products ===
    m3h: f32,
    n4: f32,
    m3h_delay: DelayBuffer,
    n4_delay: DelayBuffer,

    // === Timing ===
    max_substep_ms: f64,
    elapsed_ms: f64,
    ms_since_stimulus: Option<f64>,
    refractory_ms: f64,
    /// Depolarization applied by `stimulate` (mV)
    stimulus_mv: f32,
}

impl Default for HodgkinHuxleyIntegrator {
    fn default() -> Self {
        Self::new(&IntegratorConfig::default())
    }
}

impl HodgkinHuxleyIntegrator {
    /// Rest potential constant
    pub const V_REST: f32 = -65.0;

    /// Create from config, starting at rest
    pub fn new(config: &IntegratorConfig) -> Self {
        let conductances = config.profile.conductances();
        let mut integrator = Self {
            v: Self::V_REST,
            c_m: 1.0,
            conductances,
            nominal_conductances: conductances,
            e_na: 50.0,
            e_k: -77.0,
            e_leak: -54.387,
            m: Gate::default(),
            h: Gate::default(),
            n: Gate::default(),
            m3h: 0.0,
            n4: 0.0,
            m3h_delay: DelayBuffer::new(config.delay_buffer_capacity),
            n4_delay: DelayBuffer::new(config.delay_buffer_capacity),
            max_substep_ms: config.max_substep * 1000.0,
            elapsed_ms: 0.0,
            ms_since_stimulus: None,
            refractory_ms: config.refractory_period * 1000.0,
            stimulus_mv: config.stimulus_voltage,
        };
        integrator.reset();
        integrator
    }

    /// Update α and β rates for all gates based on voltage
    fn update_gate_rates(&mut self) {
        let v = self.v;

        // Sodium activation (m)
        self.m.alpha = if (v + 40.0).abs() < 0.001 {
            1.0
        } else {
            0.1 * (v + 40.0) / (1.0 - (-0.1 * (v + 40.0)).exp())
        };
        self.m.beta = 4.0 * (-0.0556 * (v + 65.0)).exp();

        // Sodium inactivation (h)
        self.h.alpha = 0.07 * (-0.05 * (v + 65.0)).exp();
        self.h.beta = 1.0 / (1.0 + (-0.1 * (v + 35.0)).exp());

        // Potassium activation (n)
        self.n.alpha = if (v + 55.0).abs() < 0.001 {
            0.1
        } else {
            0.01 * (v + 55.0) / (1.0 - (-0.1 * (v + 55.0)).exp())
        };
        self.n.beta = 0.125 * (-0.0125 * (v + 65.0)).exp();
    }

    /// Calculate ionic currents (µA/cm²)
    fn ionic_currents(&self) -> (f32, f32, f32) {
        let i_na = self.conductances.sodium
            * self.m.state.powi(3)
            * self.h.state
            * (self.v - self.e_na);
        let i_k = self.conductances.potassium * self.n.state.powi(4) * (self.v - self.e_k);
        let i_leak = self.conductances.leak * (self.v - self.e_leak);
        (i_na, i_k, i_leak)
    }

    fn refresh_products(&mut self) {
        self.m3h = self.m.state.powi(3) * self.h.state;
        self.n4 = self.n.state.powi(4);
    }

    /// Advance by `dt` seconds of simulated time
    ///
    /// Non-positive and non-finite `dt` are ignored.
    pub fn step(&mut self, dt: f64) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        let total_ms = dt * 1000.0;
        let substeps = (total_ms / self.max_substep_ms).ceil().max(1.0) as usize;
        let h_ms = (total_ms / substeps as f64) as f32;

        for _ in 0..substeps {
            self.update_gate_rates();
            self.m.update(h_ms);
            self.h.update(h_ms);
            self.n.update(h_ms);

            let (i_na, i_k, i_leak) = self.ionic_currents();
            self.v -= (i_na + i_k + i_leak) / self.c_m * h_ms;
        }

        self.elapsed_ms += total_ms;
        if let Some(since) = self.ms_since_stimulus.as_mut() {
            *since += total_ms;
        }

        self.refresh_products();
        self.m3h_delay.push(self.m3h, dt as f32);
        self.n4_delay.push(self.n4, dt as f32);
    }

    /// Depolarize the membrane to start an action potential
    ///
    /// Returns false, changing nothing, while the previous stimulus is still
    /// inside the refractory window.
    pub fn stimulate(&mut self) -> bool {
        if self.is_refractory() {
            return false;
        }
        self.v += self.stimulus_mv;
        self.ms_since_stimulus = Some(0.0);
        true
    }

    /// Whether a stimulus was accepted within the refractory window
    pub fn is_refractory(&self) -> bool {
        matches!(self.ms_since_stimulus, Some(since) if since < self.refractory_ms)
    }

    /// Restore resting voltage, steady-state gates and profile conductances
    pub fn reset(&mut self) {
        self.v = Self::V_REST;
        self.conductances = self.nominal_conductances;
        self.update_gate_rates();
        self.m.init_steady_state();
        self.h.init_steady_state();
        self.n.init_steady_state();
        self.refresh_products();

        self.elapsed_ms = 0.0;
        self.ms_since_stimulus = None;

        self.m3h_delay.clear();
        self.n4_delay.clear();
        self.m3h_delay.push(self.m3h, 0.0);
        self.n4_delay.push(self.n4, 0.0);
    }

    /// Membrane voltage (mV)
    pub fn membrane_voltage(&self) -> f32 {
        self.v
    }

    /// Resting voltage (mV)
    pub fn resting_voltage(&self) -> f32 {
        Self::V_REST
    }

    pub fn gating(&self) -> GatingVariables {
        GatingVariables {
            m: self.m.state,
            h: self.h.state,
            n: self.n.state,
        }
    }

    /// Sodium gating product m³h after the last step
    pub fn m3h(&self) -> f32 {
        self.m3h
    }

    /// Potassium gating product n⁴ after the last step
    pub fn n4(&self) -> f32 {
        self.n4
    }

    /// m³h as it was `delay` seconds ago (saturates to the oldest sample)
    pub fn delayed_m3h(&self, delay: f32) -> f32 {
        self.m3h_delay.delayed_value(delay)
    }

    /// n⁴ as it was `delay` seconds ago (saturates to the oldest sample)
    pub fn delayed_n4(&self, delay: f32) -> f32 {
        self.n4_delay.delayed_value(delay)
    }

    /// Sodium current (µA/cm², negative is inward)
    pub fn na_current(&self) -> f32 {
        self.ionic_currents().0
    }

    /// Potassium current (µA/cm²)
    pub fn k_current(&self) -> f32 {
        self.ionic_currents().1
    }

    /// Leak current (µA/cm²)
    pub fn leak_current(&self) -> f32 {
        self.ionic_currents().2
    }

    pub fn conductances(&self) -> Conductances {
        self.conductances
    }

    /// Override conductances until the next reset
    pub fn set_conductances(&mut self, conductances: Conductances) {
        self.conductances = conductances;
    }

    /// Membrane time integrated since reset (s)
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_ms / 1000.0
    }

    /// Snapshot of everything `step` depends on
    pub fn state(&self) -> HodgkinHuxleyState {
        HodgkinHuxleyState {
            voltage: self.v,
            gating: self.gating(),
            conductances: self.conductances,
            elapsed_ms: self.elapsed_ms,
            ms_since_stimulus: self.ms_since_stimulus,
            m3h_delay: self.m3h_delay.clone(),
            n4_delay: self.n4_delay.clone(),
        }
    }

    /// Restore a snapshot taken with `state`
    pub fn set_state(&mut self, state: &HodgkinHuxleyState) {
        self.v = state.voltage;
        self.m.state = state.gating.m.clamp(0.0, 1.0);
        self.h.state = state.gating.h.clamp(0.0, 1.0);
        self.n.state = state.gating.n.clamp(0.0, 1.0);
        self.conductances = state.conductances;
        self.elapsed_ms = state.elapsed_ms;
        self.ms_since_stimulus = state.ms_since_stimulus;
        self.m3h_delay = state.m3h_delay.clone();
        self.n4_delay = state.n4_delay.clone();
        self.refresh_products();
    }
}
