//! Square wave on header pin 27 through `/sys/class/gpio`.
//!
//! Same wiring as `mmap_toggle`, without `/dev/mem`. Expect a few kHz.

use std::process::ExitCode;
use std::time::Instant;

use odroid_gpio::{Board, Direction, Level, OdroidX, SysfsGpio};

const TOGGLES: usize = 50_000;

fn run() -> odroid_gpio::Result<()> {
    let sysfs = SysfsGpio::new();
    let enable = sysfs.claim(OdroidX::lookup_sysfs("pin31")?, Direction::Output)?;
    let signal = sysfs.claim(OdroidX::lookup_sysfs("pin27")?, Direction::Output)?;

    enable.set_value(Level::High)?;
    signal.set_value(Level::High)?;

    let start = Instant::now();
    for _ in 0..TOGGLES {
        signal.set_value(Level::High)?;
        signal.set_value(Level::Low)?;
    }
    let elapsed = start.elapsed();
    println!(
        "{TOGGLES} cycles in {elapsed:?} ({:.0} Hz)",
        TOGGLES as f64 / elapsed.as_secs_f64()
    );

    signal.release()?;
    enable.release()
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("sysfs_toggle: {err}");
            ExitCode::FAILURE
        }
    }
}
