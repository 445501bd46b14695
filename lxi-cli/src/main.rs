//! # LXI command line tool
//!
//! Sends SCPI commands to LXI instruments over the raw socket protocol and prints or saves
//! their responses. Binary block responses, such as screenshots, are decoded before they are
//! written.
//!
//! ```text
//! lxi scpi --ip 192.168.1.20 "*IDN?"
//! lxi scpi --ip 192.168.1.20 --dump-file screen.bmp "display:data?"
//! lxi scpi --ip 192.168.1.20 --interactive
//! lxi screenshot --ip 192.168.1.20 screen.bmp
//! ```
pub mod session;

use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use env_logger::Env;
use lxi_client::{Builder, Config, LxiClient, Routing, output};
use lxi_protocol::{DEFAULT_PORT, ScpiCommand};

use crate::session::{Session, Summary};

#[derive(clap::Args)]
struct Target {
    #[arg(short, long, help = "IP address or host name of the instrument")]
    ip: String,

    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[derive(clap::Args)]
struct ScpiArgs {
    #[command(flatten)]
    target: Target,

    #[arg(
        short,
        long,
        help = "Timeout in seconds",
        default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,

    #[arg(short = 'x', long, help = "Print response in hexadecimal")]
    dump_hex: bool,

    #[arg(short = 'f', long, value_name = "FILENAME", help = "Save response to file")]
    dump_file: Option<PathBuf>,

    #[arg(
        short = 'a',
        long,
        help = "Enter interactive mode",
        conflicts_with = "run_script"
    )]
    interactive: bool,

    #[arg(short, long, value_name = "FILENAME", help = "Run script")]
    run_script: Option<PathBuf>,

    #[arg(
        default_value = "*IDN?",
        conflicts_with_all = ["interactive", "run_script"]
    )]
    command: String,
}

#[derive(clap::Args)]
struct ScreenshotArgs {
    #[command(flatten)]
    target: Target,

    #[arg(
        short,
        long,
        help = "Timeout in seconds",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,

    #[arg(help = "Image file to write")]
    filename: PathBuf,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Send SCPI command
    Scpi(ScpiArgs),
    /// Save a screenshot of the instrument display
    Screenshot(ScreenshotArgs),
}

#[derive(Parser)]
#[command(name = "lxi", version, about = "Control LXI instruments using SCPI", long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

fn config(target: &Target, timeout_s: u64) -> Config {
    Builder::new()
        .port(target.port)
        .timeout(Duration::from_secs(timeout_s))
        .config()
}

fn report(summary: Summary) -> Result<(), Box<dyn Error>> {
    log::debug!(
        "Session executed {} commands, {} failed",
        summary.executed,
        summary.failed
    );
    if summary.failed > 0 {
        return Err(format!("{} of {} commands failed", summary.failed, summary.executed).into());
    }
    Ok(())
}

fn scpi(args: ScpiArgs) -> Result<(), Box<dyn Error>> {
    let config = config(&args.target, args.timeout);
    let routing = Routing {
        dump_hex: args.dump_hex,
        dump_file: args.dump_file,
    };
    let mut stdout = io::stdout().lock();

    if args.interactive {
        let client = LxiClient::connect(&args.target.ip, config)?;
        let mut session = Session::new(client, routing);
        let summary = session.interactive(io::stdin().lock(), &mut stdout)?;
        log::debug!("Interactive session ended after {} commands", summary.executed);
        return Ok(());
    }

    if let Some(script) = args.run_script {
        log::info!("Running script {}", script.display());
        let script = BufReader::new(File::open(&script)?);
        let client = LxiClient::connect(&args.target.ip, config)?;
        let summary = Session::new(client, routing).run_script(script, &mut stdout)?;
        return report(summary);
    }

    let command = ScpiCommand::new(args.command);
    if let Some(response) = lxi_client::run_scpi_command(&args.target.ip, &command, config)? {
        output::route(&response, &routing, &mut stdout)?;
    }
    Ok(())
}

fn screenshot(args: ScreenshotArgs) -> Result<(), Box<dyn Error>> {
    let config = config(&args.target, args.timeout);
    let written = lxi_client::run_screenshot_capture(&args.target.ip, &args.filename, config)?;
    log::debug!("Screenshot has {} bytes", written);
    println!("Saved screenshot to {}", args.filename.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            // Help and version requests are not errors
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let result = match args.command {
        Command::Scpi(args) => scpi(args),
        Command::Screenshot(args) => screenshot(args),
    };
    exit_code(result, &mut io::stderr())
}

/// Reports a failed command on `err` and maps the outcome to the process exit code.
fn exit_code(result: Result<(), Box<dyn Error>>, err: &mut impl Write) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = writeln!(err, "Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verify_args() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn scpi_defaults() {
        let args = Args::try_parse_from(["lxi", "scpi", "--ip", "192.168.1.20"]).unwrap();
        let Command::Scpi(args) = args.command else {
            panic!("expected scpi command");
        };
        assert_eq!(args.command, "*IDN?");
        assert_eq!(args.timeout, 1);
        assert_eq!(args.target.port, 5025);
        assert!(!args.dump_hex && !args.interactive);
        assert!(args.dump_file.is_none() && args.run_script.is_none());
    }

    #[test]
    fn scpi_dump_options() {
        let args = Args::try_parse_from([
            "lxi", "scpi", "-i", "scope.local", "-t", "3", "-x", "-f", "wave.bin", ":WAV:DATA?",
        ])
        .unwrap();
        let Command::Scpi(args) = args.command else {
            panic!("expected scpi command");
        };
        assert_eq!(args.command, ":WAV:DATA?");
        assert_eq!(args.timeout, 3);
        assert!(args.dump_hex);
        assert_eq!(args.dump_file, Some(PathBuf::from("wave.bin")));
    }

    #[test]
    fn scpi_requires_ip() {
        assert!(Args::try_parse_from(["lxi", "scpi", "*IDN?"]).is_err());
    }

    #[test]
    fn scpi_rejects_zero_timeout() {
        assert!(Args::try_parse_from(["lxi", "scpi", "--ip", "1.2.3.4", "-t", "0"]).is_err());
    }

    #[test]
    fn interactive_excludes_command_and_script() {
        assert!(
            Args::try_parse_from(["lxi", "scpi", "--ip", "1.2.3.4", "-a", "*IDN?"]).is_err()
        );
        assert!(
            Args::try_parse_from(["lxi", "scpi", "--ip", "1.2.3.4", "-a", "-r", "x.scpi"])
                .is_err()
        );
    }

    #[test]
    fn failure_exits_with_one() {
        let mut err = Vec::new();
        let code = exit_code(Err(lxi_client::ExchangeError::Timeout.into()), &mut err);
        assert_eq!(code, ExitCode::FAILURE);
        assert_eq!(
            String::from_utf8(err).unwrap(),
            format!("Error: {}\n", lxi_client::ExchangeError::Timeout)
        );

        let code = exit_code(report(Summary { executed: 3, failed: 1 }), &mut Vec::new());
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[test]
    fn success_exits_with_zero() {
        let mut err = Vec::new();
        assert_eq!(exit_code(Ok(()), &mut err), ExitCode::SUCCESS);
        assert!(err.is_empty());
        let summary = Summary { executed: 2, failed: 0 };
        assert_eq!(exit_code(report(summary), &mut err), ExitCode::SUCCESS);
    }

    #[test]
    fn screenshot_args() {
        let args =
            Args::try_parse_from(["lxi", "screenshot", "--ip", "1.2.3.4", "screen.bmp"]).unwrap();
        let Command::Screenshot(args) = args.command else {
            panic!("expected screenshot command");
        };
        assert_eq!(args.timeout, 5);
        assert_eq!(args.filename, PathBuf::from("screen.bmp"));
        let config = config(&args.target, args.timeout);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.port, 5025);
    }
}
