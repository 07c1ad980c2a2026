use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keywedge_classifier::{
    BurstClassifier, ChannelObserver, Classifier, ClassifierHandle, TracingObserver,
};
use keywedge_core::{
    AppConfig, BurstAnalysis, ConfigDiff, ConfigWatcher, ContextTag, MonitorState, ScanResult,
    UiCommand,
};
use keywedge_sink::ScanRouter;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// How many scans and analyses the monitor keeps on screen.
const RECENT_CAPACITY: usize = 50;

#[derive(Parser)]
#[command(
    name = "keywedge",
    about = "Tells barcode scanner bursts apart from typing and routes scans by context"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Classify live terminal input and show the monitor (default)
    Monitor,
    /// Run a recorded keystroke log through the classifier and print each burst
    Replay {
        /// Keystroke log, one `offset_ms kind [value]` event per line
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Monitor) {
        Command::Monitor => {
            let config = AppConfig::load_from_file(&cli.config)
                .with_context(|| format!("failed to load config from {:?}", cli.config))?;
            let log_buffer = Arc::new(Mutex::new(VecDeque::<String>::new()));
            init_tracing(&config, Some(Arc::clone(&log_buffer)))?;
            run_monitor(config, &cli.config, log_buffer).await
        }
        Command::Replay { file } => {
            // Replay works without a config file; tuning falls back to defaults.
            let config = if cli.config.exists() {
                AppConfig::load_from_file(&cli.config)
                    .with_context(|| format!("failed to load config from {:?}", cli.config))?
            } else {
                AppConfig::from_toml_str("").context("failed to build default config")?
            };
            init_tracing(&config, None)?;
            replay_file(&config, &file)
        }
    }
}

fn init_tracing(config: &AppConfig, log_buffer: Option<Arc<Mutex<VecDeque<String>>>>) -> Result<()> {
    let env_filter = EnvFilter::try_new(&config.general.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let monitor_layer = log_buffer
        .map(|buf| keywedge_tui::MonitorLogLayer::new(buf, config.general.log_capacity));

    let subscriber = tracing_subscriber::Registry::default()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(monitor_layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")
}

async fn run_monitor(
    config: AppConfig,
    config_path: &Path,
    log_buffer: Arc<Mutex<VecDeque<String>>>,
) -> Result<()> {
    tracing::info!("keywedge starting");

    let tracing_observer = TracingObserver::new(config.general.trace_analyses);
    let trace_switch = tracing_observer.switch();
    let (analysis_tx, analysis_rx) = mpsc::unbounded_channel();

    let machine = BurstClassifier::new(config.classifier).with_context(config.initial_context());
    let mut classifier = Classifier::from_machine(machine);
    classifier.add_observer(Box::new(tracing_observer));
    classifier.add_observer(Box::new(ChannelObserver::new(analysis_tx)));
    let scan_rx = classifier
        .take_result_receiver()
        .context("classifier result receiver already taken")?;
    let handle = classifier.handle();

    let mut router = ScanRouter::new(scan_rx);
    for context_cfg in &config.context {
        let tag = ContextTag::new(context_cfg.id.clone());
        for route_cfg in &context_cfg.sinks {
            router
                .add_route(
                    &tag,
                    &route_cfg.plugin,
                    &route_cfg.prefix,
                    config.merged_sink_config(route_cfg),
                )
                .await
                .with_context(|| {
                    format!(
                        "failed to add sink '{}' for context '{}'",
                        route_cfg.plugin, tag
                    )
                })?;
            tracing::info!(
                "routed context '{}' → sink '{}' (prefix: {:?})",
                tag,
                route_cfg.plugin,
                route_cfg.prefix,
            );
        }
    }
    if config.context.iter().all(|c| c.sinks.is_empty()) {
        tracing::warn!("no sinks configured, scans will only be shown in the monitor");
    }

    let (tap_tx, tap_rx) = mpsc::unbounded_channel();
    router.set_tap(tap_tx);
    router.start();
    classifier.start();

    // Hot reload is best effort; the monitor runs without it.
    let (_watcher, reload_rx) = match ConfigWatcher::spawn(config_path) {
        Ok((watcher, rx)) => (Some(watcher), Some(rx)),
        Err(e) => {
            tracing::warn!("config hot reload disabled: {e}");
            (None, None)
        }
    };

    let initial_state = MonitorState {
        context: config.initial_context(),
        contexts: config.context_tags(),
        tuning: config.classifier,
        modal_open: false,
        focused: true,
        is_running: true,
        ..Default::default()
    };
    let (state_tx, state_rx) = watch::channel(initial_state.clone());
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let state_task = tokio::spawn(state_loop(StateLoop {
        state: initial_state,
        config,
        state_tx,
        cmd_rx,
        tap_rx,
        analysis_rx,
        reload_rx,
        handle: handle.clone(),
        trace_switch,
    }));

    tracing::info!("monitor active, press Esc to quit");

    keywedge_tui::run(state_rx, cmd_tx, handle, log_buffer)
        .await
        .context("monitor error")?;

    tracing::info!("shutting down");
    let _ = state_task.await;
    classifier.shutdown().await;
    drop(classifier);
    router.shutdown().await;

    Ok(())
}

struct StateLoop {
    state: MonitorState,
    config: AppConfig,
    state_tx: watch::Sender<MonitorState>,
    cmd_rx: mpsc::UnboundedReceiver<UiCommand>,
    tap_rx: mpsc::UnboundedReceiver<ScanResult>,
    analysis_rx: mpsc::UnboundedReceiver<BurstAnalysis>,
    reload_rx: Option<mpsc::UnboundedReceiver<AppConfig>>,
    handle: ClassifierHandle,
    trace_switch: Arc<AtomicBool>,
}

/// Folds scans, analyses, monitor commands and config reloads into the
/// state shown by the monitor. Ends when the monitor quits.
async fn state_loop(mut ctx: StateLoop) {
    loop {
        tokio::select! {
            cmd = ctx.cmd_rx.recv() => match cmd {
                Some(UiCommand::SetContext(tag)) => ctx.state.context = tag,
                Some(UiCommand::SetModal(open)) => ctx.state.modal_open = open,
                Some(UiCommand::SetFocused(focused)) => ctx.state.focused = focused,
                Some(UiCommand::Quit) | None => break,
            },
            Some(scan) = ctx.tap_rx.recv() => push_capped(&mut ctx.state.recent_scans, scan),
            Some(analysis) = ctx.analysis_rx.recv() => {
                push_capped(&mut ctx.state.recent_analyses, analysis)
            }
            Some(new_config) = next_reload(&mut ctx.reload_rx) => apply_reload(&mut ctx, new_config),
        }

        if ctx.state_tx.send(ctx.state.clone()).is_err() {
            break;
        }
    }
}

fn apply_reload(ctx: &mut StateLoop, new_config: AppConfig) {
    let diff = ConfigDiff::diff(&ctx.config, &new_config);
    if diff.is_empty() {
        return;
    }

    if let Some(tuning) = diff.tuning_change {
        ctx.handle.retune(tuning);
        ctx.config.classifier = tuning;
        ctx.state.tuning = tuning;
    }
    if let Some(enabled) = diff.trace_analyses_change {
        ctx.trace_switch.store(enabled, Ordering::Relaxed);
        ctx.config.general.trace_analyses = enabled;
        tracing::info!(enabled, "analysis tracing toggled");
    }
    for warning in diff.non_reloadable {
        tracing::warn!("config reload: {warning}");
        if !ctx.state.warnings.contains(&warning) {
            ctx.state.warnings.push(warning);
        }
    }
}

async fn next_reload(rx: &mut Option<mpsc::UnboundedReceiver<AppConfig>>) -> Option<AppConfig> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn push_capped<T>(items: &mut Vec<T>, item: T) {
    if items.len() >= RECENT_CAPACITY {
        items.remove(0);
    }
    items.push(item);
}

fn replay_file(config: &AppConfig, file: &Path) -> Result<()> {
    let entries = keywedge_classifier::load_replay(file)
        .with_context(|| format!("failed to load replay log {:?}", file))?;
    let report =
        keywedge_classifier::run_replay(&entries, config.classifier, config.initial_context());

    for analysis in &report.analyses {
        println!(
            "{:<15} {:>3} chars {:>8.1} ms/char  fast={} len={} digits={} alnum={}  {:?}",
            analysis.decision.to_string(),
            analysis.char_count,
            analysis.ms_per_char,
            analysis.is_fast,
            analysis.is_barcode_length,
            analysis.all_digits,
            analysis.alnum_no_spaces,
            analysis.text,
        );
    }
    for scan in &report.scans {
        println!("scan [{}] {} ({})", scan.context, scan.text, scan.confidence);
    }
    println!(
        "{} event(s), {} burst(s), {} scan(s)",
        entries.len(),
        report.analyses.len(),
        report.scans.len()
    );
    Ok(())
}
