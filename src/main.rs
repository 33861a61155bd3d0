use circuitsim::*;
use colour::{green_ln, red_ln, yellow_ln};
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_millis(250);

/// Builds a one bit half adder next to a clock blinking an LED through a not gate.
fn demo_circuit(config: Config) -> Result<CircuitState> {
    let mut c = CircuitState::with_config(config)?;
    let bit = || SpawnOptions::default().bit_width(1);

    let a = c.spawn(ComponentKind::Input, bit().label("A"))?;
    let b = c.spawn(ComponentKind::Input, bit().label("B"))?;
    let sum = c.xor2(a, b)?;
    let carry = c.and2(a, b)?;
    let sum_led = c.spawn(ComponentKind::Output, bit().label("Sum"))?;
    let carry_led = c.spawn(ComponentKind::Output, bit().label("Carry"))?;
    c.connect(sum, sum_led, Slot::A)?;
    c.connect(carry, carry_led, Slot::A)?;

    let clock = c.spawn(
        ComponentKind::Clock,
        bit().label("CLK").period(Duration::from_millis(500)),
    )?;
    let not = c.not1(clock)?;
    let blink = c.spawn(ComponentKind::Output, bit().label("Blink"))?;
    c.connect(not, blink, Slot::A)?;

    c.settle()?;
    Ok(c)
}

fn load_config() -> Result<Config> {
    match std::env::var("CIRCUITSIM_CONFIG") {
        Ok(path) => {
            let json = std::fs::read_to_string(&path)
                .map_err(|e| ConfigurationError::Invalid(format!("{}: {}", path, e)))?;
            Ok(Config::from_json(&json)?)
        }
        Err(_) => Ok(Config::default()),
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut c = demo_circuit(load_config()?)?;
    let table = c.generate_truth_table()?;
    if table.settled() {
        green_ln!("{}", table);
    } else {
        red_ln!("{}", table);
    }

    // Optional number of ticks, runs until Ctrl-C without one.
    let max_ticks: Option<u64> = std::env::args().nth(1).and_then(|arg| arg.parse().ok());
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))?;

    let leds: Vec<ComponentId> = c
        .components_of(ComponentKind::Output)
        .map(|o| o.id())
        .collect();
    let mut ticks = 0;
    let mut last = Instant::now();
    while running.load(Ordering::SeqCst) && max_ticks.map_or(true, |max| ticks < max) {
        std::thread::sleep(TICK);
        let now = Instant::now();
        let fired = c.advance_clocks(now - last);
        last = now;
        ticks += 1;
        if fired.is_empty() {
            continue;
        }

        let line: Vec<String> = leds
            .iter()
            .filter_map(|id| c.component(*id))
            .map(|led| format!("{}:{}", led.label(), if led.is_lit() { "●" } else { "○" }))
            .collect();
        yellow_ln!("{}", line.join(" "));
    }
    info!("stopped after {} ticks", ticks);
    Ok(())
}
