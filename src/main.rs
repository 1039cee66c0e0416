mod app;
mod cli;
mod render;

use anyhow::{Context, bail};
use clap::Parser;
use filtertabs::{NullScreen, Silent, TabDraft, TabManager, TabStore};
use tracing::info;

use crate::cli::{Cli, Command, TabArgs, WatchArgs};

type Offline = TabManager<NullScreen, Silent>;

fn open_group(store: TabStore, group: usize) -> anyhow::Result<Offline> {
    let mut manager = TabManager::new(store, NullScreen, Silent);
    let count = manager.groups().len();
    if group == 0 || !manager.select_group(group - 1) {
        bail!("no group {group}, there are {count}");
    }
    Ok(manager)
}

fn save(manager: &Offline) -> anyhow::Result<()> {
    manager
        .store()
        .try_save(manager.groups())
        .with_context(|| format!("cannot save {}", manager.store().path().display()))
}

fn list(store: TabStore) {
    let manager = TabManager::new(store, NullScreen, Silent);
    for (index, group) in manager.groups().iter().enumerate() {
        println!("group {}", index + 1);
        for tab in group {
            let mode = if tab.is_literal() { "keyword" } else { "regex" };
            let list = if tab.is_whitelist() { "show" } else { "hide" };
            print!("  {:<8}  {list} {mode} {:?}", tab.name(), tab.pattern());
            if !tab.prefix().is_empty() {
                print!("  prefix {:?}", tab.prefix());
            }
            if tab.notifies() {
                print!("  notify");
            }
            println!();
        }
    }
}

fn upsert(store: TabStore, args: &TabArgs, editing: bool) -> anyhow::Result<()> {
    let mut manager = open_group(store, args.group)?;
    let draft = TabDraft::new(args.name.as_str(), args.settings());
    draft.validate(manager.active_tab_group(), editing)?;

    if editing {
        manager.edit_tab(&draft.name, &draft.settings)?;
    } else {
        manager.create_tab(&draft.name, &draft.settings)?;
    }
    save(&manager)
}

fn remove(store: TabStore, name: &str, group: usize) -> anyhow::Result<()> {
    let mut manager = open_group(store, group)?;
    if !manager.does_tab_exist_in_active_group(name) {
        bail!("no tab named {name:?} in group {group}");
    }
    manager.delete_tab(name);
    save(&manager)
}

fn send(store: TabStore, tab: &str, message: &str, group: usize) -> anyhow::Result<()> {
    let mut manager = open_group(store, group)?;
    if !manager.does_tab_exist_in_active_group(tab) {
        bail!("no tab named {tab:?} in group {group}");
    }
    manager.make_tab_active(tab);
    println!("{}", manager.compose_outgoing(message));
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli::init_logging(cli.log_file.as_deref(), cli.is_interactive())?;
    let store = cli.store()?;
    info!(save_file = %store.path().display(), "starting");

    match cli.command.unwrap_or_else(|| Command::Watch(WatchArgs::default())) {
        Command::Watch(args) => app::watch(store, cli::history_limit(args.history)),
        Command::List => {
            list(store);
            Ok(())
        }
        Command::Add(args) => upsert(store, &args, false),
        Command::Edit(args) => upsert(store, &args, true),
        Command::Rm { name, group } => remove(store, &name, group),
        Command::Send {
            tab,
            message,
            group,
        } => send(store, &tab, &message, group),
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("ft failed: {err:#}");
        std::process::exit(1);
    }
}
