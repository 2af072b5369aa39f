//! `wifibee`: drive a WifiBee from the command line.

mod config;
mod error;
mod transport;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{debug, error};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use wifibee_driver::{AlwaysOn, ByteTransport, HttpRequest, Session, SystemClock};
use wifibee_protocol::{decode_hex, encode_hex, ConnectionKind};

use crate::config::{CliConfig, TransportConfig, DEFAULT_BAUD};
use crate::error::{CliError, CliResult};

type WifiBee = Session<Box<dyn ByteTransport>, SystemClock>;

#[derive(Parser, Debug)]
#[command(
    name = "wifibee",
    about = "Drive a NodeMCU WifiBee over its UART console",
    version
)]
struct Cli {
    /// YAML config file.
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Serial port the WifiBee is attached to.
    #[arg(long, global = true, value_name = "PATH", conflicts_with = "tcp")]
    serial: Option<String>,

    /// Serial baud rate.
    #[arg(long, global = true)]
    baud: Option<u32>,

    /// UART bridge to connect to instead of a serial port.
    #[arg(long, global = true, value_name = "HOST:PORT")]
    tcp: Option<String>,

    /// Network SSID.
    #[arg(long, global = true, env = "WIFIBEE_SSID")]
    ssid: Option<String>,

    /// Network passphrase.
    #[arg(long, global = true, env = "WIFIBEE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Power on and check the console answers.
    Probe,
    /// Join the network and print the station status.
    Status,
    /// Send an HTTP GET request.
    Get(HttpArgs),
    /// Send an HTTP POST request.
    Post(HttpBodyArgs),
    /// Send an HTTP PUT request.
    Put(HttpBodyArgs),
    /// Send a payload over TCP and print the reply.
    TcpSend(SendArgs),
    /// Send a payload over UDP and print the reply.
    UdpSend(SendArgs),
}

#[derive(Args, Debug)]
struct HttpArgs {
    /// Server host name or address.
    host: String,

    /// Resource path.
    #[arg(default_value = "/")]
    path: String,

    /// Server port.
    #[arg(short, long, default_value_t = 80)]
    port: u16,

    /// Extra header, e.g. "Accept: text/plain". Repeatable.
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    headers: Vec<String>,
}

#[derive(Args, Debug)]
struct HttpBodyArgs {
    #[command(flatten)]
    request: HttpArgs,

    /// Request body.
    #[arg(short, long, default_value = "")]
    body: String,
}

#[derive(Args, Debug)]
struct SendArgs {
    /// Server host name or address.
    host: String,

    /// Server port.
    port: u16,

    /// Payload; text unless --hex is given.
    data: String,

    /// Treat the payload as hex and send it as binary.
    #[arg(long)]
    hex: bool,

    /// Do not wait for a reply.
    #[arg(long)]
    no_wait: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Merge the config file with command line overrides.
fn load_config(cli: &Cli) -> CliResult<CliConfig> {
    let mut config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };

    if let Some(path) = &cli.serial {
        let baud = match (&config.transport, cli.baud) {
            (_, Some(baud)) => baud,
            (Some(TransportConfig::Serial { baud, .. }), None) => *baud,
            _ => DEFAULT_BAUD,
        };
        config.transport = Some(TransportConfig::Serial {
            path: path.clone(),
            baud,
        });
    } else if let Some(address) = &cli.tcp {
        config.transport = Some(TransportConfig::Tcp {
            address: address.clone(),
        });
    } else if let (Some(TransportConfig::Serial { baud, .. }), Some(override_baud)) =
        (config.transport.as_mut(), cli.baud)
    {
        *baud = override_baud;
    }

    if let Some(ssid) = &cli.ssid {
        config.driver.credentials.ssid = ssid.clone();
    }
    if let Some(password) = &cli.password {
        config.driver.credentials.password = password.clone();
    }

    Ok(config)
}

fn open_session(config: CliConfig) -> CliResult<WifiBee> {
    let transport_config = config.transport.ok_or(CliError::MissingTransport)?;
    let transport = transport::open(&transport_config)?;
    let session = Session::new(config.driver, SystemClock::new(), Box::new(AlwaysOn))?
        .with_transport(transport);
    Ok(session)
}

fn headers(lines: &[String]) -> String {
    lines.iter().map(|line| format!("{}\r\n", line)).collect()
}

fn print_http(session: &WifiBee, status: Option<u16>) -> CliResult<()> {
    let Some(status) = status else {
        println!("request sent, no response");
        return Ok(());
    };

    let mut body = vec![0u8; session.response().capacity()];
    let (len, _) = session.read_http_response(&mut body)?;
    println!("HTTP {}", status);
    println!("{}", String::from_utf8_lossy(&body[..len]));
    Ok(())
}

fn send(session: &mut WifiBee, kind: ConnectionKind, args: &SendArgs) -> CliResult<()> {
    let payload = if args.hex {
        decode_hex(args.data.as_bytes()).map_err(CliError::Payload)?
    } else {
        args.data.as_bytes().to_vec()
    };
    let wait = !args.no_wait;

    session.open(&args.host, args.port, kind)?;
    let sent = if args.hex {
        session.send_binary(&payload, wait)
    } else {
        session.send_ascii(&payload, wait)
    };
    let closed = session.close();
    sent?;
    if let Err(err) = closed {
        debug!("close after send: {}", err);
    }

    if !wait {
        return Ok(());
    }
    if session.response().is_empty() {
        println!("no response");
    } else if args.hex {
        println!("{}", encode_hex(session.response().as_slice()));
    } else {
        println!("{}", session.read_response_ascii(session.response().len())?);
    }
    Ok(())
}

fn run(cli: Cli) -> CliResult<()> {
    let config = load_config(&cli)?;
    let mut session = open_session(config)?;

    match &cli.command {
        Command::Probe => {
            session.on()?;
            println!("{} is alive", session.device_type());
        }
        Command::Status => {
            session.on()?;
            let joined = session.connect().and_then(|()| session.station_status());
            session.off();
            println!("joined: {}", joined?);
        }
        Command::Get(args) => {
            let request = HttpRequest::new("GET", &args.host, args.port, &args.path);
            let header_block = headers(&args.headers);
            let status = session.http_action(&request.with_headers(&header_block))?;
            print_http(&session, status)?;
        }
        Command::Post(args) | Command::Put(args) => {
            let method = if matches!(cli.command, Command::Post(_)) {
                "POST"
            } else {
                "PUT"
            };
            let header_block = headers(&args.request.headers);
            let request = HttpRequest::new(method, &args.request.host, args.request.port, &args.request.path)
                .with_headers(&header_block)
                .with_body(&args.body);
            let status = session.http_action(&request)?;
            print_http(&session, status)?;
        }
        Command::TcpSend(args) => send(&mut session, ConnectionKind::Tcp, args)?,
        Command::UdpSend(args) => send(&mut session, ConnectionKind::Udp, args)?,
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
