//! # Peercall CLI Entry Point
//!
//! Main binary for the peercall RPC system. Provides one subcommand per
//! standard procedure plus `serve` for running the demo server.
//!
//! ## Usage
//!
//! ```bash
//! # Start the demo server under the default name
//! peercall serve
//!
//! # Call procedures on it
//! peercall strlen foo
//! peercall strcat foo bar
//! peercall getenv HOME
//! peercall setenv GREETING hello
//! peercall feed 'ls -l'
//! peercall count
//! peercall stat /etc/hosts
//!
//! # Talk to a differently named server, with a longer timeout
//! peercall -s worker --timeout-ms 1000 strlen foo
//! ```
//!
//! Call subcommands print a single human-readable line on success and
//! exit non-zero on any failure. Logging is initialized only for
//! `serve`, keeping call output clean for scripting.

use std::time::Duration;

use anyhow::Result;
use argh::FromArgs;

use peercall_client::Channel;
use peercall_common::procs::{self, IoCounts, StatInfo};
use peercall_common::wire::Value;

/// Main CLI structure parsed from command-line arguments.
///
/// Uses `argh` for declarative argument parsing. The top-level command
/// dispatches to one subcommand per standard procedure, plus `serve`.
#[derive(FromArgs)]
/// peercall - typed RPC calls to a named peer process
struct Cli {
    /// logical name of the server to talk to
    ///
    /// Plain names resolve to a Unix socket in the peercall socket
    /// directory; names of the form tcp://host:port use TCP.
    #[argh(option, short = 's', default = "\"pty\".into()")]
    server: String,

    /// per-call timeout in milliseconds
    ///
    /// Bounds how long a call subcommand blocks waiting for the server's
    /// response. Defaults to 200ms.
    #[argh(option, short = 't', long = "timeout-ms", default = "200")]
    timeout_ms: u64,

    #[argh(subcommand)]
    command: Commands,
}

/// Available CLI subcommands, one per procedure plus `serve`.
#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Count(CountArgs),
    Getenv(GetenvArgs),
    Setenv(SetenvArgs),
    Feed(FeedArgs),
    Strlen(StrlenArgs),
    Strcat(StrcatArgs),
    Stat(StatArgs),
    Serve(ServeArgs),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "count")]
/// retrieve the server's feed-session byte counters
struct CountArgs {}

#[derive(FromArgs)]
#[argh(subcommand, name = "getenv")]
/// read a variable from the server's environment
struct GetenvArgs {
    /// variable name
    #[argh(positional)]
    name: String,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "setenv")]
/// set a variable in the server's environment
struct SetenvArgs {
    /// variable name
    #[argh(positional)]
    name: String,
    /// value to set
    #[argh(positional)]
    value: String,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "feed")]
/// feed text to the server's session
struct FeedArgs {
    /// text to feed
    #[argh(positional)]
    text: String,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "strlen")]
/// compute a string's byte length remotely
struct StrlenArgs {
    /// the string to measure
    #[argh(positional)]
    s: String,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "strcat")]
/// concatenate two strings remotely
struct StrcatArgs {
    /// first string
    #[argh(positional)]
    a: String,
    /// second string
    #[argh(positional)]
    b: String,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "stat")]
/// stat a path on the server's filesystem
struct StatArgs {
    /// path to stat
    #[argh(positional)]
    path: String,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
/// run the demo server exporting the standard procedures
struct ServeArgs {
    /// logical name to register the server under
    #[argh(option, short = 'n', default = "\"pty\".into()")]
    name: String,
}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();
    let timeout = Duration::from_millis(cli.timeout_ms);
    let server = cli.server;

    // Initialize tracing only for serve: call subcommands keep their
    // output clean for unix tool usage
    if let Commands::Serve(args) = &cli.command {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
        return peercall_cli::serve::run(&args.name);
    }

    let mut channel = Channel::connect(&server)?;
    match cli.command {
        Commands::Count(_) => {
            let result = channel.call(timeout, &procs::COUNT, &[])?;
            let counts = IoCounts::from_wire(&expect_blob(result)?)?;
            println!("counts: {} {}", counts.input, counts.output);
        }
        Commands::Getenv(args) => {
            let result = channel.call(timeout, &procs::GETENV, &[Value::Str(args.name.clone())])?;
            println!("getenv({}) = {}", args.name, expect_str(result)?);
        }
        Commands::Setenv(args) => {
            let result = channel.call(
                timeout,
                &procs::SETENV,
                &[Value::Str(args.name.clone()), Value::Str(args.value.clone())],
            )?;
            expect_i32(result)?;
            println!("setenv {} = {} : success", args.name, args.value);
        }
        Commands::Feed(args) => {
            let result = channel.call(timeout, &procs::FEED, &[Value::Str(args.text.clone())])?;
            expect_i32(result)?;
            println!("fed {} : success", args.text);
        }
        Commands::Strlen(args) => {
            let result = channel.call(timeout, &procs::STRLEN, &[Value::Str(args.s.clone())])?;
            println!("strlen({}) = {}", args.s, expect_i32(result)?);
        }
        Commands::Strcat(args) => {
            let result = channel.call(
                timeout,
                &procs::STRCAT,
                &[Value::Str(args.a.clone()), Value::Str(args.b.clone())],
            )?;
            println!("strcat({},{}) = {}", args.a, args.b, expect_str(result)?);
        }
        Commands::Stat(args) => {
            let result = channel.call(timeout, &procs::STAT, &[Value::Str(args.path.clone())])?;
            let info = StatInfo::from_wire(&expect_blob(result)?)?;
            println!(
                "stat(\"{}\"): dev {:04x}, inode {}, mode {:o} (rdev {:04x}), size {}",
                args.path, info.dev, info.ino, info.mode, info.rdev, info.size
            );
        }
        Commands::Serve(_) => {} // handled above
    }

    Ok(())
}

fn expect_str(result: Option<Value>) -> Result<String> {
    match result {
        Some(Value::Str(s)) => Ok(s),
        other => anyhow::bail!("unexpected result type: {other:?}"),
    }
}

fn expect_i32(result: Option<Value>) -> Result<i32> {
    match result {
        Some(Value::I32(v)) => Ok(v),
        other => anyhow::bail!("unexpected result type: {other:?}"),
    }
}

fn expect_blob(result: Option<Value>) -> Result<Vec<u8>> {
    match result {
        Some(Value::Blob(b)) => Ok(b),
        other => anyhow::bail!("unexpected result type: {other:?}"),
    }
}
