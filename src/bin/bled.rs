use ble_led_controller::*;
use color_eyre::eyre::Result;
use std::env;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Parses a single numeric argument of a `command:value` line
fn parse_value(arg: Option<&str>) -> std::result::Result<u8, String> {
    let arg = arg.ok_or("no value given")?;
    arg.trim()
        .parse()
        .map_err(|_| format!("invalid value '{}'", arg.trim()))
}

/// Parses an `R,G,B` triple
fn parse_color(arg: Option<&str>) -> std::result::Result<(u8, u8, u8), String> {
    let arg = arg.ok_or("no color given")?;
    let rgb = arg
        .split(',')
        .map(|s| s.trim().parse::<u8>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| "Invalid color format. Use R,G,B (e.g., 255,0,0 for red)".to_string())?;

    match rgb[..] {
        [red, green, blue] => Ok((red, green, blue)),
        _ => Err("Invalid color format. Use R,G,B (e.g., 255,0,0 for red)".to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout only carries replies
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| EnvFilter::new("ble_led_controller=warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    color_eyre::install()?;

    // Get a target id/mac address from command line arguments.
    // If not provided, exit.
    let usage = "Usage: bled <id/mac address>";
    let args: Vec<_> = env::args().collect();
    if args.len() < 2 {
        eprintln!("{usage}");
        std::process::exit(1);
    }
    if args[1] == "-h" || args[1] == "--help" {
        eprintln!("{usage}");
        std::process::exit(0);
    }

    let transport = BtleTransport::new(ControllerConfig { command_delay_ms: 0 }).await?;
    let controller = LedController::new(transport);
    let handlers = ConnectionHandlers::new()
        .on_disconnected(|peripheral| eprintln!("ERR Device {peripheral} disconnected"));
    controller
        .connect(&ScanCriteria::with_address(&args[1]), handlers)
        .await?;

    // Inform about successful initialization
    println!("OK");

    // Mainloop: wait for user input, line by line
    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(input) = lines.next_line().await? {
        let mut cmd = input.trim().split(':');
        let result = match cmd.next() {
            Some("power_on") => controller.set_switch(true).await.map_err(|e| e.to_string()),
            Some("power_off") => controller.set_switch(false).await.map_err(|e| e.to_string()),
            Some("set_color") => match parse_color(cmd.next()) {
                Ok((red, green, blue)) => controller
                    .set_rgb(red, green, blue)
                    .await
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e),
            },
            Some("set_brightness") => match parse_value(cmd.next()) {
                Ok(level) if level <= 100 => controller
                    .set_brightness(level)
                    .await
                    .map_err(|e| e.to_string()),
                Ok(_) => Err("Brightness must be between 0 and 100".to_string()),
                Err(e) => Err(e),
            },
            Some("set_mode") => match parse_value(cmd.next()) {
                Ok(mode) => controller.set_mode(mode).await.map_err(|e| e.to_string()),
                Err(e) => Err(e),
            },
            Some("set_speed") => match parse_value(cmd.next()) {
                Ok(speed) if speed <= 100 => {
                    controller.set_speed(speed).await.map_err(|e| e.to_string())
                }
                Ok(_) => Err("Speed must be between 0 and 100".to_string()),
                Err(e) => Err(e),
            },
            Some("") | None => Err("No command given".to_string()),
            Some(other) => Err(format!("Unknown command: {other}")),
        };

        match result {
            Ok(()) => println!("OK"),
            Err(e) => println!("ERR {e}"),
        }

        if !controller.is_connected().await {
            eprintln!("ERR Device is no longer connected");
            std::process::exit(1);
        }
    }

    controller.close().await;
    Ok(())
}
