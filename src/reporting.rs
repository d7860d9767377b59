use std::fmt::Write;

use crate::devices::Device;
use crate::sim::clock::format_hhmm;
use crate::sim::engine::Engine;

/// One-line summary of a device's state and metered energy.
pub fn device_report(device: &Device) -> String {
    let mut line = format!(
        "{:<12} {:<20} {:<6} {:<3} {:>6.2} kW  prio={:>3}  {:>8.3} kWh",
        device.id(),
        device.name(),
        device.kind_label(),
        if device.is_on() { "ON" } else { "off" },
        device.power_kw(),
        device.priority(),
        device.metered_energy_kwh(),
    );
    if let Some(end) = device.cycle_end_minute() {
        let _ = write!(line, "  (cycle ends {})", format_hhmm(end));
    }
    line
}

/// Full household energy report at the engine's current time.
pub fn energy_report(engine: &Engine) -> String {
    let controller = engine.controller();
    let mut out = String::new();

    let _ = writeln!(out, "--- Energy Report at {} ---", engine.current_time());
    let _ = writeln!(
        out,
        "Net power: {:.2} kW (allowed draw {:.2} kW)",
        controller.total_active_kw(),
        controller.allowed_kw()
    );
    for device in controller.devices() {
        let _ = writeln!(out, "{}", device_report(device));
    }

    let (produced, consumed) = controller
        .devices()
        .map(Device::metered_energy_kwh)
        .fold((0.0_f64, 0.0_f64), |(p, c), e| {
            if e >= 0.0 { (p + e, c) } else { (p, c - e) }
        });
    let _ = writeln!(out, "Produced: {produced:.3} kWh");
    let _ = write!(out, "Consumed: {consumed:.3} kWh");
    out
}

pub fn print_energy_report(engine: &Engine) {
    println!("\n{}", energy_report(engine));
}
