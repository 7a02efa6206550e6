//! openocd-rpc — send Tcl commands to OpenOCD from the command line

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt};

use openocd_rpc::{Args, ClientConfig, RpcClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    info!("Starting openocd-rpc v{}", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::from_args(&args);
    let client = RpcClient::open(config).await.inspect_err(|e| {
        error!("Connect error: {}", e);
    })?;

    let result = if args.commands.is_empty() {
        run_stdin(&client).await
    } else {
        run_commands(&client, &args.commands).await
    };

    client.close().await?;
    result
}

async fn run_commands(client: &RpcClient, commands: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    for command in commands {
        println!("{}", client.send(command).await?);
    }
    Ok(())
}

/// One command per line until EOF; blank lines are skipped
async fn run_stdin(client: &RpcClient) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        println!("{}", client.send(command).await?);
    }
    Ok(())
}

fn init_logging(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(false)
        .with_line_number(false);

    if let Some(log_file) = &args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)?;
        subscriber.with_writer(file).init();
    } else {
        subscriber.with_writer(std::io::stderr).init();
    }

    debug!("Logging initialized with level: {}", args.log_level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use openocd_rpc::config::{Args, ClientConfig};

    #[test]
    fn test_args_parsing_with_options() {
        let args = Args::parse_from([
            "openocd-rpc",
            "--host", "probe.local",
            "--log-level", "debug",
            "--log-file", "/tmp/openocd-rpc.log",
        ]);
        assert_eq!(args.host, "probe.local");
        assert_eq!(args.log_level, "debug");
        assert_eq!(args.log_file.unwrap().to_str().unwrap(), "/tmp/openocd-rpc.log");
    }

    #[test]
    fn test_config_from_default_args() {
        let args = Args::parse_from(["openocd-rpc", "version"]);
        let config = ClientConfig::from_args(&args);
        assert_eq!(config, ClientConfig::default());
        assert_eq!(args.commands, vec!["version"]);
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Args::try_parse_from(["openocd-rpc", "--port", "70000"]).is_err());
    }
}
