//! `docsync` binary

use anyhow::Context;
use docsync_cli::{build_cli, commands, init_tracing, AppConfig};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = build_cli().get_matches();

    init_tracing(matches.get_flag("log-json"));
    let config_path = matches.get_one::<PathBuf>("config").map(PathBuf::as_path);

    match matches.subcommand() {
        Some(("is-doc", args)) => {
            let paths: Vec<&String> = args.get_many::<String>("paths").into_iter().flatten().collect();
            for (path, is_doc) in commands::is_doc(&paths) {
                println!("{path}\t{}", if is_doc { "documentation" } else { "other" });
            }
        }
        Some(("classify", args)) => {
            let config = AppConfig::load(config_path)?;
            let verdict = commands::classify(
                &config,
                required::<String>(args, "path")?,
                args.get_one::<PathBuf>("old").map(PathBuf::as_path),
                required::<PathBuf>(args, "new")?,
                required::<PathBuf>(args, "steps")?,
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
        Some(("sync", args)) => {
            let config = AppConfig::load(config_path)?;
            let report = commands::sync(
                &config,
                required::<PathBuf>(args, "store")?,
                required::<String>(args, "repo")?,
                required::<String>(args, "file")?,
                required::<String>(args, "rev")?,
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.failures().is_empty() {
                std::process::exit(2);
            }
        }
        Some(("review", args)) => {
            let store = required::<PathBuf>(args, "store")?;
            if let Some(change_id) = args.get_one::<String>("mark") {
                commands::mark_reviewed(store, change_id)?;
                println!("marked {change_id} reviewed");
            } else {
                for item in commands::pending_reviews(store)? {
                    println!("{}", serde_json::to_string(&item)?);
                }
            }
        }
        _ => {}
    }

    Ok(())
}

fn required<'a, T>(args: &'a clap::ArgMatches, name: &str) -> anyhow::Result<&'a T>
where
    T: std::any::Any + Clone + Send + Sync + 'static,
{
    args.get_one::<T>(name)
        .with_context(|| format!("missing --{name}"))
}
