//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use hems_sim::devices::Device;
use hems_sim::sim::controller::PowerController;
use hems_sim::sim::engine::Engine;

/// Default grid budget (kW).
pub const MAX_GRID_KW: f64 = 3.5;

/// Empty engine on the default 3.5 kW budget with `solar` as production.
pub fn empty_engine() -> Engine {
    Engine::new(PowerController::new(MAX_GRID_KW))
}

/// Engine with the given devices registered.
pub fn engine_with(devices: impl IntoIterator<Item = Device>) -> Engine {
    let mut engine = empty_engine();
    for device in devices {
        engine
            .register_device(device)
            .expect("fixture ids should be unique");
    }
    engine
}

/// A small household: one of each device flavour.
///
/// | id | power | priority | kind |
/// |---|---|---|---|
/// | fridge | -0.4 | 10 | manual, never shed |
/// | solar | +1.5 | 9 | manual, never shed |
/// | tv | -0.2 | 2 | manual |
/// | heater | -2.0 | 1 | manual |
/// | oven | -2.0 | 5 | manual |
/// | washer | -2.0 | 3 | auto, 90 min |
pub fn household() -> Engine {
    engine_with([
        Device::manual("fridge", "Refrigerator", -0.4, 10, false),
        Device::manual("solar", "Solar panels", 1.5, 9, false),
        Device::manual("tv", "Television", -0.2, 2, true),
        Device::manual("heater", "Electric heater", -2.0, 1, true),
        Device::manual("oven", "Oven", -2.0, 5, true),
        Device::auto("washer", "Washing machine", -2.0, 3, 90),
    ])
}

/// Asserts the budget invariant against the engine's live state.
pub fn assert_within_budget(engine: &Engine) {
    let controller = engine.controller();
    let total = controller.total_active_kw();
    let allowed = controller.allowed_kw();
    assert!(
        total >= -allowed - 1e-9,
        "budget violated at {}: total={total:.3} kW allowed={allowed:.3} kW",
        engine.current_time()
    );
}
