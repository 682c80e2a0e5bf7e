use clap::Parser;
use linux_embedded_hal::{
    CdevPin, Delay,
    gpio_cdev::{Chip, LineRequestFlags},
};
use onewire_gpio::{OneWire, OneWireGpioBuilder, OneWireSearch, OneWireSearchKind, SearchEnd};

/// Scan a bit-banged 1-Wire bus on a GPIO line and print the ROM codes found
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the GPIO character device (e.g., /dev/gpiochip0)
    #[arg(short, long, default_value = "/dev/gpiochip0")]
    chip: String,
    /// Offset of the line the bus is wired to
    #[arg(short, long)]
    line: u32,
    /// Maximum number of devices to enumerate
    #[arg(short, long, default_value_t = 32)]
    max_devices: usize,
    /// Read the ROM code of the only device on the bus instead of searching
    #[arg(short, long)]
    single: bool,
    /// Search only for devices in alarm state
    #[arg(short, long)]
    alarmed: bool,
    /// Re-check every device found with a verify pass
    #[arg(long)]
    verify: bool,
    /// Number of idle checks (2 µs apart) before a reset gives up
    #[arg(long, default_value_t = 100)]
    idle_polls: u8,
}

const MAX_DEVICES: usize = 64;

fn main() {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();
    // Open the line as an open-drain output, released
    let mut chip = Chip::new(&args.chip).expect("Failed to open GPIO chip");
    let handle = chip
        .get_line(args.line)
        .expect("Failed to get GPIO line")
        .request(
            LineRequestFlags::OUTPUT | LineRequestFlags::OPEN_DRAIN,
            1,
            "onewire-scan",
        )
        .expect("Failed to request GPIO line");
    let pin = CdevPin::new(handle).expect("Failed to create GPIO pin");
    // Create the bus master
    let mut bus = OneWireGpioBuilder::default()
        .with_idle_polls(args.idle_polls)
        .build(pin, Delay)
        .expect("Failed to release 1-Wire line");

    if args.single {
        match bus.read_single_address() {
            Ok(rom) => println!("{rom}"),
            Err(e) => log::error!("Failed to read ROM: {e}"),
        }
        return;
    }

    let kind = if args.alarmed {
        OneWireSearchKind::Alarmed
    } else {
        OneWireSearchKind::Normal
    };
    let mut search = OneWireSearch::new(&mut bus, kind);
    let report = match search.collect::<MAX_DEVICES>(args.max_devices) {
        Ok(report) => report,
        Err(e) => {
            log::error!("Search failed: {e}");
            return;
        }
    };
    match report.end {
        SearchEnd::Complete | SearchEnd::Limit => {}
        end => log::warn!("Search ended early: {end:?}"),
    }
    if report.crc_mismatches > 0 {
        log::warn!("{} ROM codes failed the CRC check", report.crc_mismatches);
    }
    log::info!("Found {} devices", report.devices.len());
    for rom in report.devices.iter() {
        if args.verify {
            match search.verify(rom) {
                Ok(true) => {}
                Ok(false) => log::warn!("ROM {rom} did not verify"),
                Err(e) => log::error!("Failed to verify ROM {rom}: {e}"),
            }
        }
        println!("{rom}");
    }
}
