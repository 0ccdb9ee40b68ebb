use sampler_core::sampler::AnalogSampler;

use crate::hw::analog::ScanCapture;

#[embassy_executor::task]
pub async fn run(sampler: &'static AnalogSampler, mut capture: ScanCapture) -> ! {
    capture.start();
    sampler.begin_capture();
    defmt::info!(
        "analog capture live: {} channels, {} cycles per buffer",
        sampler.channel_count(),
        sampler.plan().cycles_per_buffer()
    );

    loop {
        match capture.next_buffer().await {
            Some(buffer) => sampler.absorb(buffer),
            None => {
                defmt::warn!("capture overrun, restarting ring");
                capture.restart();
            }
        }
    }
}
