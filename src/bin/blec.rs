use ble_led_controller::*;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use std::time::Duration;
use tracing::{debug, info, instrument, trace};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// MAC address or platform id of the LED strip (first compatible device if omitted)
    #[arg(short, long, global = true)]
    address: Option<String>,

    /// Scan timeout in seconds
    #[arg(short, long, global = true, default_value_t = 10)]
    timeout: u64,

    /// Minimum delay between commands in milliseconds
    #[arg(long, global = true, default_value_t = 15)]
    delay: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Demonstration of LED features
    Demo {
        /// Duration of each demo step in seconds
        #[arg(short, long, default_value_t = 5)]
        duration: u64,
    },
    /// Turn LED strip on
    On,
    /// Turn LED strip off
    Off,
    /// Set custom RGB color
    Color {
        /// Red value (0-255)
        #[arg(short, long, default_value_t = 255)]
        red: u8,
        /// Green value (0-255)
        #[arg(short, long, default_value_t = 255)]
        green: u8,
        /// Blue value (0-255)
        #[arg(short, long, default_value_t = 255)]
        blue: u8,
    },
    /// Set color from hue, saturation and value
    Hsv {
        /// Hue in degrees (0-359)
        #[arg(long, default_value_t = 0)]
        hue: u16,
        /// Saturation (0-100)
        #[arg(long, default_value_t = 100)]
        saturation: u8,
        /// Value (0-100)
        #[arg(long, default_value_t = 100)]
        value: u8,
    },
    /// Set brightness
    Brightness {
        /// Brightness level (0-100)
        #[arg(short, long, default_value_t = 100)]
        level: u8,
    },
    /// Set effect mode
    Mode {
        /// Device specific mode code
        #[arg(short, long, default_value_t = 1)]
        mode: u8,
    },
    /// Set effect speed
    Speed {
        /// Effect speed (0-100)
        #[arg(short, long, default_value_t = 50)]
        speed: u8,
    },
    /// Set effect mode and speed
    Effect {
        /// Device specific mode code
        #[arg(short, long, default_value_t = 1)]
        mode: u8,
        /// Effect speed (0-100)
        #[arg(short, long, default_value_t = 50)]
        speed: u8,
    },
}

#[tokio::main]
#[instrument]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| EnvFilter::new("ble_led_controller=info")),
        )
        .compact()
        .init();

    // Initialize color-eyre for pretty error reporting
    color_eyre::install()?;

    let cli = Cli::parse();
    debug!("Parsed command line arguments");

    let transport = BtleTransport::new(ControllerConfig {
        command_delay_ms: cli.delay,
    })
    .await?;
    let controller = LedController::new(transport);

    let criteria = ScanCriteria {
        address: cli.address.clone(),
        timeout: Duration::from_secs(cli.timeout),
        ..ScanCriteria::default()
    };
    let handlers = ConnectionHandlers::new()
        .on_connected(|family| info!("Speaking {} protocol", family))
        .on_disconnected(|peripheral| info!("Device {} disconnected", peripheral));
    controller.connect(&criteria, handlers).await?;

    match cli.command.unwrap_or(Commands::Demo { duration: 5 }) {
        Commands::Demo { duration } => {
            run_demo(&controller, duration).await?;
        }
        Commands::On => {
            controller.set_switch(true).await?;
        }
        Commands::Off => {
            controller.set_switch(false).await?;
        }
        Commands::Color { red, green, blue } => {
            controller.set_switch(true).await?;
            controller.set_rgb(red, green, blue).await?;
        }
        Commands::Hsv {
            hue,
            saturation,
            value,
        } => {
            if hue >= 360 {
                return Err(eyre!("Hue must be between 0 and 359"));
            }
            let (red, green, blue) = hsv_to_rgb((hue / 2) as u8, saturation, value);
            debug!("HSV({}, {}, {}) is RGB({}, {}, {})", hue, saturation, value, red, green, blue);
            controller.set_switch(true).await?;
            controller.set_rgb(red, green, blue).await?;
        }
        Commands::Brightness { level } => {
            // We need to ensure the device is on for brightness changes to be visible
            controller.set_switch(true).await?;
            controller.set_brightness(level).await?;
        }
        Commands::Mode { mode } => {
            controller.set_switch(true).await?;
            controller.set_mode(mode).await?;
        }
        Commands::Speed { speed } => {
            controller.set_speed(speed).await?;
        }
        Commands::Effect { mode, speed } => {
            controller.set_switch(true).await?;
            controller.set_mode(mode).await?;
            controller.set_speed(speed).await?;
        }
    }

    controller.close().await;
    Ok(())
}

/// Sleep for specified number of seconds
#[instrument]
async fn sleep(seconds: u64) {
    trace!("Sleeping for {}s", seconds);
    tokio::time::sleep(Duration::from_secs(seconds)).await;
}

/// Run a demonstration of various LED strip features
#[instrument(skip(controller))]
async fn run_demo<T: Transport>(controller: &LedController<T>, duration: u64) -> Result<()> {
    info!("Running LED strip demo with {}s intervals", duration);

    info!("Turning LEDs off");
    controller.set_switch(false).await?;
    sleep(duration).await;

    info!("Turning LEDs on");
    controller.set_switch(true).await?;
    sleep(duration).await;

    for (name, (red, green, blue)) in [
        ("red", (255, 0, 0)),
        ("green", (0, 255, 0)),
        ("blue", (0, 0, 255)),
    ] {
        info!("Setting color to {}", name);
        controller.set_rgb(red, green, blue).await?;
        sleep(duration).await;
    }

    info!("Setting brightness to 50%");
    controller.set_brightness(50).await?;
    sleep(duration).await;

    info!("Setting brightness to 100%");
    controller.set_brightness(100).await?;
    sleep(duration).await;

    info!("Switching to effect mode 2");
    controller.set_mode(2).await?;
    sleep(duration).await;

    info!("Setting effect speed to slow (20)");
    controller.set_speed(20).await?;
    sleep(duration).await;

    info!("Setting effect speed to fast (80)");
    controller.set_speed(80).await?;
    sleep(duration).await;

    info!("Back to static white");
    controller.set_rgb(255, 255, 255).await?;
    sleep(1).await;

    info!("Turning LEDs off to end demo");
    controller.set_switch(false).await?;

    info!("Demo completed!");
    Ok(())
}
