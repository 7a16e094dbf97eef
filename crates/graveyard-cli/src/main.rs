use graveyard_cli::{build_cli, execute, log_level};
use graveyard_core::telemetry::init_tracing;

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();
    init_tracing(&log_level(&matches));

    match execute(&matches).await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error: failed to render output: {e}");
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
