use std::thread;
use std::time::Instant;

use board::{BoardConfig, LinuxBoard};
use hal::BaroSensor;
use log::{error, info, warn};

mod board;

enum State {
    Initializing,
    Running,
    Stopping,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = BoardConfig::from_env()?;
    let board = LinuxBoard::open(config.i2c_bus)?;
    info!("Board: {} (i2c bus {})", board.get_name(), board.bus_number());

    let mut baro = board.barometer(config.sensor);
    let mut state = State::Initializing;
    let mut taken = 0u64;
    loop {
        match state {
            State::Initializing => {
                info!(
                    "Initializing {} with {:?} oversampling...",
                    baro.chip_name(),
                    baro.oversampling()
                );
                match baro.init() {
                    Ok(()) => state = State::Running,
                    Err(err) => {
                        error!("Failed to initialize {}: {}", baro.chip_name(), err);
                        return Err(err.into());
                    }
                }
            }
            State::Running => {
                let started = Instant::now();
                match baro.read_temperature_and_pressure() {
                    Ok((temperature, pressure)) => {
                        let altitude = driver::baro::compensation::altitude(
                            pressure,
                            config.sensor.sea_level_pressure_pa,
                        );
                        let relative = baro
                            .baseline_altitude()
                            .map_or(0.0, |baseline| altitude - baseline);
                        info!(
                            "T = {:.1} C, P = {} Pa, alt = {:.2} m, rel = {:+.2} m",
                            temperature, pressure, altitude, relative
                        );
                    }
                    Err(err) => warn!("Reading failed: {}", err),
                }

                taken += 1;
                if config.samples != 0 && taken >= config.samples {
                    state = State::Stopping;
                    continue;
                }
                if let Some(remaining) = config.interval.checked_sub(started.elapsed()) {
                    thread::sleep(remaining);
                }
            }
            State::Stopping => {
                info!("Stopping after {} readings", taken);
                break;
            }
        }
    }
    Ok(())
}
