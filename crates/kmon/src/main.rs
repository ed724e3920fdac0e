use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use kmon_core::monitor::{CommandRegistry, Monitor, MonitorConfig, MonitorEnv, StdConsole};
use kmon_core::symbols::{ElfImage, SymbolResolver};
use kmon_core::types::Address;
use kmon_core::unwind::{LiveStack, StackMemory};
use kmon_core::MonitorResult;
use kmon_utils::{info, init_logging, warn, LogConfig, LogFormat, LogLevel};

/// Interactive kernel monitor with frame-pointer backtraces.
#[derive(Parser, Debug)]
#[command(name = "kmon")]
#[command(version)]
#[command(about = "Interactive kernel monitor with frame-pointer backtraces", long_about = None)]
struct Cli
{
    /// ELF image to load symbols from (default: the running executable)
    #[arg(long, value_name = "PATH")]
    image: Option<PathBuf>,

    /// Skip symbol loading; backtraces print raw frames only
    #[arg(long, default_value_t = false, conflicts_with = "image")]
    no_symbols: bool,

    /// Virtual base the image is linked at, for `kerninfo` (hex `0x..` or decimal)
    #[arg(long, value_name = "ADDR", value_parser = parse_address, default_value = "0")]
    kernbase: Address,

    /// Prompt shown before every command
    #[arg(long, default_value = "K> ")]
    prompt: String,

    /// Log level (overrides RUST_LOG)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Log format (overrides KMON_LOG_FORMAT)
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    /// Log to a file only, keeping the terminal for the monitor
    #[arg(long, default_value_t = false)]
    log_file_only: bool,
}

/// Parse `0x`-prefixed hex or plain decimal.
fn parse_address(s: &str) -> Result<Address, String>
{
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed
        .map(Address::new)
        .map_err(|err| format!("invalid address '{s}': {err}"))
}

fn main()
{
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env().with_level(cli.log_level);
    if let Some(format) = cli.log_format {
        log_config = log_config.with_format(format);
    }
    if cli.log_file_only {
        log_config = log_config.file_only();
    }
    // Held until exit so file logs are flushed
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> MonitorResult<()>
{
    let image = load_symbols(cli);
    let layout = image.as_ref().map(|image| image.kernel_layout(cli.kernbase));

    let stack = match LiveStack::for_current_thread() {
        Ok(stack) => Some(stack),
        Err(e) => {
            warn!(error = %e, "Live stack unavailable, backtrace is disabled");
            None
        }
    };

    let env = MonitorEnv {
        stack: stack.as_ref().map(|stack| stack as &dyn StackMemory),
        symbols: image.as_ref().map(|image| image as &dyn SymbolResolver),
        layout: layout.as_ref(),
    };
    let registry = CommandRegistry::builtin();
    let monitor = Monitor::new(&registry, env).with_config(MonitorConfig {
        prompt: cli.prompt.clone(),
        ..MonitorConfig::default()
    });

    info!(
        symbols = image.is_some(),
        live_stack = stack.is_some(),
        kernbase = %cli.kernbase,
        "Starting monitor"
    );

    let stdin = io::stdin();
    let mut console = StdConsole::new(stdin.lock(), io::stdout());
    monitor.run(&mut console, None)
}

/// Symbol loading failures are reported and the monitor runs without symbols.
fn load_symbols(cli: &Cli) -> Option<ElfImage>
{
    if cli.no_symbols {
        info!("Symbol loading disabled");
        return None;
    }

    let loaded = match &cli.image {
        Some(path) => ElfImage::load(path, None),
        None => ElfImage::for_current_exe(),
    };
    match loaded {
        Ok(image) => {
            info!(path = %image.path().display(), functions = image.function_count(), "Symbols loaded");
            Some(image)
        }
        Err(e) => {
            warn!(error = %e, "Failed to load symbols, continuing without them");
            None
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_parse_address()
    {
        assert_eq!(parse_address("0xf0000000").unwrap(), Address::new(0xf000_0000));
        assert_eq!(parse_address("0XFF").unwrap(), Address::new(0xff));
        assert_eq!(parse_address("4096").unwrap(), Address::new(4096));
        assert!(parse_address("0xzz").is_err());
        assert!(parse_address("").is_err());
    }

    #[test]
    fn test_cli_defaults()
    {
        let cli = Cli::try_parse_from(["kmon"]).unwrap();
        assert_eq!(cli.kernbase, Address::ZERO);
        assert_eq!(cli.prompt, "K> ");
        assert!(!cli.no_symbols);
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn test_cli_flags()
    {
        let cli = Cli::try_parse_from([
            "kmon",
            "--kernbase",
            "0xf0000000",
            "--log-level",
            "debug",
            "--log-format",
            "json",
            "--no-symbols",
        ])
        .unwrap();
        assert_eq!(cli.kernbase, Address::new(0xf000_0000));
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert!(cli.no_symbols);
    }

    #[test]
    fn test_cli_rejects_image_with_no_symbols()
    {
        assert!(Cli::try_parse_from(["kmon", "--image", "/bin/true", "--no-symbols"]).is_err());
    }
}
