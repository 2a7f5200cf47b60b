use std::env;

use fugit::MillisDurationU32;
use inquire::Select;
use korad_psu::{
    config::{Configuration, SessionConfig},
    psu::KoradPsu,
    serial::SerialTransport,
};

// Configuration constants - adjust these for your setup
const SERIAL_TIMEOUT_MS: u32 = 100;
const OUTPUT_VOLTAGE_V: f32 = 3.3;
const CURRENT_LIMIT_A: f32 = 0.1;
const STABILIZATION_DELAY_MS: u64 = 1000;

fn main() {
    // Get serial port from command line arg or interactive selection
    let port_name = env::args().nth(1).unwrap_or_else(|| {
        // List available serial ports
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        // Interactive selection
        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });

    println!("Using port: {}", port_name);

    let config = SessionConfig::new(MillisDurationU32::millis(SERIAL_TIMEOUT_MS), true);
    let mut psu: KoradPsu<SerialTransport> =
        KoradPsu::open(&port_name, config).expect("Failed to open PSU");

    let identity = psu.identity();
    println!("Identified: {}", identity.raw());
    println!(
        "{} channel(s), max {}V / {}A, {} panel",
        identity.channels(),
        identity.max_voltage(),
        identity.max_current(),
        identity.panel()
    );

    // Set points first, then switch the output on.
    let configuration = Configuration::new()
        .with_voltage(1, OUTPUT_VOLTAGE_V)
        .with_current(1, CURRENT_LIMIT_A)
        .with_output(true);
    psu.configure(&configuration).unwrap();
    println!(
        "Output enabled at {}V, current limit {}A",
        OUTPUT_VOLTAGE_V, CURRENT_LIMIT_A
    );

    // Wait for output to stabilize
    std::thread::sleep(std::time::Duration::from_millis(STABILIZATION_DELAY_MS));

    let status = psu.status().unwrap();
    println!("{:#?}", status);

    psu.set_output(false).unwrap();
    println!("Output disabled");

    psu.close();
}
