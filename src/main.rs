//! Car Price Client - terminal front-end
//!
//! Reads one command per line, applies it to the application state and
//! redraws the current screen.

use tokio::io::{AsyncBufReadExt, BufReader};

use car_price_client::commands::{self, Command, Reply};
use car_price_client::config::{self, Settings};
use car_price_client::render::render;
use car_price_client::state::AppState;
use car_price_client::{log_error, log_info, logging};

const MODULE: &str = "main";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init();

    let settings = Settings::load();
    logging::set_log_level(settings.developer_mode);

    log_info!(MODULE, "=== Car Price Client Starting ===");
    log_info!(MODULE, "Version: {}", env!("CARGO_PKG_VERSION"));
    log_info!(MODULE, "OS: {} {}", std::env::consts::OS, std::env::consts::ARCH);
    if let Some(path) = config::settings_path() {
        log_info!(MODULE, "Settings file: {}", path.display());
    }

    let mut state = match AppState::new(settings) {
        Ok(state) => state,
        Err(e) => {
            log_error!(MODULE, "Startup failed: {}", e);
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    log_info!(MODULE, "Service URL: {}", state.settings().api_url);

    println!("{}", render(&state.screen()));
    state.start().await;
    println!("{}", render(&state.screen()));
    println!("Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log_error!(MODULE, "Failed to read input: {}", e);
                break;
            }
        };

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match commands::execute(&mut state, command).await {
            Reply::Render => println!("{}", render(&state.screen())),
            Reply::Message(message) => {
                println!("{}", message);
                println!("{}", render(&state.screen()));
            }
            Reply::Text(text) => println!("{}", text),
            Reply::Quit => break,
        }
    }

    log_info!(MODULE, "=== Car Price Client Exiting ===");
}
