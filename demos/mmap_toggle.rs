//! Square wave on header pin 27 through the mapped GPIO registers.
//!
//! Pin 31 powers the low side of the level translator and is driven high
//! first. Needs root for `/dev/mem`. Roughly 2.4 MHz on an ODROID-X2.

use std::process::ExitCode;
use std::time::Instant;

use odroid_gpio::{Board, Direction, Level, OdroidX, PullMode};

/// About 11 seconds of toggling.
const TOGGLES: usize = 25_000_000;

fn run() -> odroid_gpio::Result<()> {
    let enable = OdroidX::lookup("pin31")?;
    let signal = OdroidX::lookup("pin27")?;

    let mut gpio = OdroidX::open()?;
    gpio.configure_pin(&enable, PullMode::Disabled, Direction::Output)?;
    gpio.configure_pin(&signal, PullMode::Disabled, Direction::Output)?;
    gpio.write_bit(&enable, Level::High)?;
    // both pins live in GPF0DAT
    gpio.settle();
    gpio.write_bit(&signal, Level::High)?;

    let start = Instant::now();
    gpio.toggle(&signal, TOGGLES)?;
    let elapsed = start.elapsed();
    println!(
        "{TOGGLES} cycles in {elapsed:?} ({:.0} Hz)",
        TOGGLES as f64 / elapsed.as_secs_f64()
    );

    gpio.close()
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("mmap_toggle: {err}");
            ExitCode::FAILURE
        }
    }
}
