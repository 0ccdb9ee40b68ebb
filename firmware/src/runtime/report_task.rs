use embassy_time::{Duration, Timer};
use sampler_core::sampler::{AnalogSampler, ReadError};

use crate::hw::BOARD_CHANNELS;

/// How often averaged rail readings are reported.
const REPORT_PERIOD: Duration = Duration::from_secs(1);

#[embassy_executor::task]
pub async fn run(sampler: &'static AnalogSampler) -> ! {
    loop {
        Timer::after(REPORT_PERIOD).await;

        for (index, board) in BOARD_CHANNELS.iter().enumerate() {
            if !sampler.is_available(index) {
                continue;
            }

            match sampler.read_voltage(index) {
                Ok(volts) => defmt::info!("{}: {} V (avg)", board.name, volts),
                Err(ReadError::NoData) => {
                    defmt::debug!("{}: no samples since last read", board.name);
                }
                Err(err) => {
                    defmt::debug!("{}: {}", board.name, defmt::Debug2Format(&err));
                }
            }
        }
    }
}
