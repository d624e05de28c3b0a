use std::path::PathBuf;

use aiterm_main::{ConfigOverrides, LaunchOptions};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "aiterm", version, about = "AI-assisted remote terminal client")]
struct Cli {
    /// Terminal server WebSocket URL, e.g. ws://127.0.0.1:5000/ws
    #[arg(long)]
    server: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    conf_dir: Option<PathBuf>,
    #[arg(long, value_parser = ["dark", "light"])]
    theme: Option<String>,
    /// Sent with every command so the server can pick a shell dialect.
    #[arg(long)]
    os_mode: Option<String>,
}

impl Cli {
    fn into_launch_options(self) -> LaunchOptions {
        LaunchOptions {
            conf_dir: self.conf_dir,
            config_path: self.config,
            overrides: ConfigOverrides {
                server_url: self.server,
                theme: self.theme,
                os_mode: self.os_mode,
            },
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(error) = aiterm_main::run(cli.into_launch_options()).await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
