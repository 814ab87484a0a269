use std::{
    io::IsTerminal,
    path::PathBuf,
    sync::Arc,
};
use futures::{
    select,
    pin_mut,
    future::FutureExt,
    stream::StreamExt,
};
use tokio::io::{
    AsyncBufReadExt,
    BufReader,
};
use tokio_stream::wrappers::{
    LinesStream,
    WatchStream,
};
use tracing_subscriber::EnvFilter;
use anyhow::{
    self,
    Context
};
use clap::{
    Parser, Subcommand, ValueEnum
};
use log::{info, warn};

use sentinel::{
    config::Config,
    console::{self, Input},
    driver,
    engine::{Command, Engine},
    push::{self, Subscription},
    render::{self, RenderOptions},
    source::{HttpLogSource, LogSource},
};

// CLI
#[derive(Parser, Debug)]
#[command(name = "sentinel")]
#[command(author = "NCV Sentinel team")]
#[command(version = "0.1")]
#[command(about = "NCV Sentinel shows the verification evidence recorded for a monitored node. \
                   It polls the log server and merges updates pushed over the event stream.",
          long_about = None)
]
struct Cli {
    /// Path to a TOML config file, defaults to `~/.sentinel/config.toml`
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base url of the log server, overrides config and environment
    #[arg(long)]
    log_server_url: Option<String>,

    /// Url of the push event stream, overrides config and environment
    #[arg(long)]
    push_url: Option<String>,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Follow the feed, read commands from stdin
    Watch {
        /// Initial search term
        #[arg(short, long, default_value = "")]
        search: String,

        /// Show evidence bundles
        #[arg(long, action)]
        evidence: bool,

        /// Poll only, do not subscribe to pushed updates
        #[arg(long, action)]
        no_push: bool,
    },

    /// Run one poll cycle, print a page and exit
    Snapshot {
        #[arg(short, long, default_value = "")]
        search: String,

        #[arg(long, value_enum)]
        sort: Option<SortArg>,

        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Print the view as JSON
        #[arg(long, action)]
        json: bool,

        #[arg(long, action)]
        evidence: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    Asc,

    Desc,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())
        .context("Failed to load the config.")?;
    if let Some(url) = cli.log_server_url {
        config.source.url = url;
    }
    if let Some(url) = cli.push_url {
        config.push.url = url;
    }
    config.validate()?;

    let client = reqwest::Client::builder()
        .build()
        .context("Failed to set up the http client.")?;
    let source = Arc::new(HttpLogSource::new(
        client.clone(),
        config.logs_endpoint(),
        config.request_timeout(),
    ));

    let mode = cli.mode.unwrap_or(Mode::Watch {
        search: String::new(),
        evidence: false,
        no_push: false,
    });
    match mode {
        Mode::Watch { search, evidence, no_push } => {
            watch(&config, client, source, search, evidence, no_push).await
        },

        Mode::Snapshot { search, sort, page, json, evidence } => {
            snapshot(&config, source, search, sort, page, json, evidence).await
        },
    }
}

async fn watch(
    config: &Config,
    client: reqwest::Client,
    source: Arc<HttpLogSource>,
    search: String,
    evidence: bool,
    no_push: bool,
) -> anyhow::Result<()> {
    info!("<-> NCV Sentinel evidence feed <->");
    info!(
        "Polling `{}` every `{}s`.",
        source.endpoint(),
        config.source.poll_interval_secs
    );
    let subscription = if config.push.enabled && !no_push {
        info!(
            "Listening for `{}` events on `{}`.",
            push::LOG_UPDATE_EVENT,
            config.push.url
        );
        Some(Subscription::connect(client, config.push.url.clone(), config.reconnect_delay()))
    } else {
        None
    };

    let mut engine = Engine::new(config.view.page_size);
    engine.apply(Command::Search(search))?;
    let handle = driver::spawn(engine, source, subscription, config.poll_interval());

    let options = RenderOptions { evidence: evidence };
    let clear_screen = std::io::stdout().is_terminal();
    let mut snapshots = WatchStream::new(handle.subscribe()).fuse();
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines()).fuse();
    let ctrl_c = tokio::signal::ctrl_c().fuse();
    pin_mut!(ctrl_c);

    loop {
        select! {
            snapshot = snapshots.select_next_some() => {
                if clear_screen {
                    print!("\x1b[2J\x1b[H");
                }
                print!("{}", render::render(&snapshot, options));
                println!("{}", console::HELP);
            },

            // stdin may close early, e.g. when detached, keep following until ctrl-c
            line = lines.select_next_some() => match line {
                Ok(line) => match console::parse(&line) {
                    Some(Input::Command(command)) => handle.send(command),

                    Some(Input::Help) => println!("{}", console::HELP),

                    Some(Input::Quit) => break,

                    None => warn!("Unknown command `{}`.", line.trim()),
                },

                Err(e) => warn!("Failed to read stdin: `{e}`"),
            },

            res = ctrl_c => {
                if let Err(e) = res {
                    warn!("Failed to listen for ctrl-c: `{e}`");
                }
                break;
            },

            complete => break,
        }
    }

    let engine = handle.shutdown().await?;
    info!("Stopped, `{}` records were held.", engine.records().len());
    Ok(())
}

async fn snapshot(
    config: &Config,
    source: Arc<HttpLogSource>,
    search: String,
    sort: Option<SortArg>,
    page: usize,
    json: bool,
    evidence: bool,
) -> anyhow::Result<()> {
    let mut engine = Engine::new(config.view.page_size);
    let cycle = engine.begin_cycle();
    let result = source.fetch().await;
    engine.complete_cycle(cycle, result);

    engine.apply(Command::Search(search))?;
    let toggles = match sort {
        None => 0,
        Some(SortArg::Asc) => 1,
        Some(SortArg::Desc) => 2,
    };
    for _ in 0..toggles {
        engine.apply(Command::ToggleSort)?;
    }
    if page != 1 {
        engine.apply(Command::GoToPage(page))?;
    }

    let snapshot = engine.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", render::render(&snapshot, RenderOptions { evidence: evidence }));
    }
    Ok(())
}
