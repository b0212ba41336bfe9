use clap::Parser;

use guardlink::cli::Cli;
use guardlink::config::{get_config, init_config_from};
use guardlink::runtime::modes::{self, Mode};

#[actix_web::main]
async fn main() -> std::process::ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_config_from(&cli.config);
    let config = get_config();

    match modes::detect_mode(cli.command.as_ref()) {
        Mode::Server => {
            let _guard = guardlink::system::init_logging(&config);

            if let Err(e) = modes::run_server(&config).await {
                match e.downcast_ref::<guardlink::errors::GuardlinkError>() {
                    Some(err) => eprintln!("{}", err.format_colored()),
                    None => eprintln!("{} {:#}", colored_error_prefix(), e),
                }
                return std::process::ExitCode::FAILURE;
            }
        }
        Mode::Cli => {
            let Some(command) = cli.command else {
                return std::process::ExitCode::FAILURE;
            };
            if let Err(e) = modes::run_cli(command).await {
                eprintln!("{}", e.format_colored());
                return std::process::ExitCode::FAILURE;
            }
        }
    }

    std::process::ExitCode::SUCCESS
}

fn colored_error_prefix() -> String {
    use colored::Colorize;
    "[ERROR]".red().bold().to_string()
}
