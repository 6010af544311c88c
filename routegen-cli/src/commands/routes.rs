//! Implementation of the `routegen routes` command.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::time::Duration;

use colored::Colorize;
use notify_debouncer_mini::{DebounceEventResult, new_debouncer, notify::RecursiveMode};
use routegen::{Resolution, ResolvedRoute, RouteTable};

use super::Options;
use crate::colors;

/// Configuration for the routes command.
pub struct RoutesConfig {
    pub manifest: PathBuf,
    pub json: bool,
    pub watch: bool,
}

/// Execute the `routes` command.
pub fn execute(options: &Options, config: RoutesConfig) -> Result<(), String> {
    if config.watch {
        run_watch_mode(options, &config)
    } else {
        run_once(options, &config)
    }
}

fn run_once(options: &Options, config: &RoutesConfig) -> Result<(), String> {
    let (engine, files) = super::prepare(options, &config.manifest)?;
    let resolution = engine.resolve(&files);

    if config.json {
        let json = serde_json::to_string_pretty(&resolution.table)
            .map_err(|e| format!("Failed to serialize routes: {}", e))?;
        println!("{}", json);
    } else {
        print_table(&resolution.table);
    }

    report(&resolution)
}

/// Print the diagnostics, failing if there were any.
fn report(resolution: &Resolution) -> Result<(), String> {
    if resolution.is_clean() {
        return Ok(());
    }
    eprintln!();
    for error in resolution.diagnostics.errors() {
        eprintln!(
            "  {} {} {}",
            "✗".custom_color(colors::error()),
            format!("{}:", error.position).custom_color(colors::muted()),
            error.message
        );
    }
    Err(format!("{} error(s) found", resolution.diagnostics.len()))
}

fn print_table(table: &RouteTable) {
    println!();
    println!(
        "  {:<8} {:<40} {}",
        "METHOD".custom_color(colors::muted()).bold(),
        "PATH".custom_color(colors::muted()).bold(),
        "HANDLER".custom_color(colors::muted()).bold()
    );
    println!("  {}", "─".repeat(70).custom_color(colors::muted()));

    for route in table.routes() {
        print_route(route);
    }

    println!();
    println!(
        "  {} route(s), {} middleware",
        table.len().to_string().custom_color(colors::ok()).bold(),
        table.middlewares().len().to_string().custom_color(colors::middleware())
    );
    println!();
}

fn print_route(route: &ResolvedRoute) {
    let method = route.method.as_str();
    let method_colored = match colors::method(method) {
        Some(color) => method.custom_color(color),
        None => method.normal(),
    };

    let mut pattern = route.pattern.clone();
    if route.is_prefix() {
        pattern.push('*');
    }

    println!(
        "  {:<8} {:<40} {}",
        method_colored.bold(),
        pattern.custom_color(colors::pattern()),
        route.handler.identity().custom_color(colors::muted())
    );
    if !route.middleware.is_empty() {
        println!(
            "  {:<8} {} {}",
            "",
            "↳".custom_color(colors::muted()),
            route.middleware.join(", ").custom_color(colors::middleware())
        );
    }
}

/// Re-resolve whenever the manifest changes.
fn run_watch_mode(options: &Options, config: &RoutesConfig) -> Result<(), String> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| format!("Failed to set Ctrl+C handler: {}", e))?;

    println!();
    println!(
        "{} Watch mode enabled. Press Ctrl+C to stop.",
        "INFO".custom_color(colors::info()).bold()
    );

    if let Err(e) = run_once(options, config) {
        print_error(e);
    }

    let (tx, rx) = mpsc::channel();
    let target = absolute(&config.manifest);
    let watched = target.file_name().map(|name| name.to_os_string());

    let mut debouncer = new_debouncer(
        Duration::from_millis(300),
        move |res: DebounceEventResult| {
            if let Ok(events) = res {
                if events
                    .iter()
                    .any(|event| event.path.file_name() == watched.as_deref())
                {
                    let _ = tx.send(());
                }
            }
        },
    )
    .map_err(|e| format!("Failed to create file watcher: {}", e))?;

    let dir = target.parent().unwrap_or(Path::new("."));
    debouncer
        .watcher()
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(|e| format!("Failed to watch {}: {}", dir.display(), e))?;

    println!(
        "{} Watching {}...",
        "INFO".custom_color(colors::info()).bold(),
        config.manifest.display()
    );

    while running.load(Ordering::SeqCst) {
        if rx.recv_timeout(Duration::from_millis(100)).is_ok() {
            println!();
            println!(
                "{} [{}] Manifest changed, resolving again...",
                "INFO".custom_color(colors::warning()).bold(),
                chrono::Local::now().format("%H:%M:%S")
            );
            if let Err(e) = run_once(options, config) {
                print_error(e);
            }
        }
    }

    println!();
    println!(
        "{} Stopped watching.",
        "INFO".custom_color(colors::info()).bold()
    );

    Ok(())
}

fn print_error(e: String) {
    eprintln!("{} {}", "Error:".red().bold(), e);
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
