//! Beescope CLI - run a digest over JSON data
//!
//!   beescope digest <json> --watch <path>...      → change events as JSON
//!
//! Each `--watch` path (dot notation, e.g. `user.tags.0`) registers a watcher
//! that records its changes. The scope is digested once, then every
//! `--set key=<json>` is applied and the scope is digested again, so the
//! second batch of events shows only what the mutations changed.
//!
//! Options:
//!   --deep              Value equality for every watcher (catches in-place edits)
//!   --set key=<json>    Mutation applied between the two digests (repeatable)
//!   --ttl <n>           Dirty pass ceiling (default 10, env BEESCOPE_DIGEST_TTL)
//!   --log <filter>      tracing filter, overrides RUST_LOG
//!   --pretty            Pretty-print JSON (default for tty)

use anyhow::{anyhow, bail, Context, Result};
use beescope::logging::init_logging;
use beescope::{DigestConfig, Scope, Value, Watch};
use serde::Serialize;
use serde_json::json;
use std::cell::RefCell;
use std::env;
use std::io::IsTerminal;
use std::rc::Rc;
use tracing::{debug, info};

fn main() {
    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);
    init_logging(opts.log.as_deref());

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("beescope {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("digest") => cmd_digest(&opts),
        Some(cmd) => Err(anyhow!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = opts.pretty || std::io::stdout().is_terminal();
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({"error": format!("{:#}", e)}), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &serde_json::Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    data: Option<String>,
    watches: Vec<String>,
    sets: Vec<String>,
    ttl: Option<String>,
    log: Option<String>,
    deep: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            let value = args.get(i + 1).cloned();
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--deep" => opts.deep = true,
                "--pretty" => opts.pretty = true,
                "--watch" | "-w" => {
                    if let Some(v) = value { opts.watches.push(v); i += 1; }
                }
                "--set" | "-s" => {
                    if let Some(v) = value { opts.sets.push(v); i += 1; }
                }
                "--ttl" => {
                    if let Some(v) = value { opts.ttl = Some(v); i += 1; }
                }
                "--log" => {
                    if let Some(v) = value { opts.log = Some(v); i += 1; }
                }
                _ if !arg.starts_with('-') => positional.push(arg.clone()),
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        let mut positional = positional.into_iter();
        opts.command = positional.next();
        let rest: Vec<String> = positional.collect();
        if !rest.is_empty() {
            opts.data = Some(rest.join(" "));
        }
        opts
    }

    fn config(&self) -> Result<DigestConfig> {
        let config = DigestConfig::from_env();
        match self.ttl.as_deref() {
            Some(raw) => {
                let ttl = raw.trim().parse().map_err(|_| anyhow!("--ttl expects a pass count, got '{}'", raw))?;
                Ok(config.with_ttl(ttl))
            }
            None => Ok(config),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChangeEvent {
    digest: usize,
    watch: String,
    new: serde_json::Value,
    old: serde_json::Value,
}

fn cmd_digest(opts: &ParsedArgs) -> Result<serde_json::Value> {
    let data = opts.data.as_deref().unwrap_or("{}");
    let data: serde_json::Value = serde_json::from_str(data).context("invalid scope JSON")?;
    if !data.is_object() {
        bail!("scope data must be a JSON object");
    }
    let mutations = opts.sets.iter().map(|s| parse_set(s)).collect::<Result<Vec<_>>>()?;

    let mut scope: Scope = Scope::with_config(opts.config()?);
    scope.extend_from_json(data);

    let events = Rc::new(RefCell::new(Vec::new()));
    let round = Rc::new(RefCell::new(1usize));
    for path in &opts.watches {
        let (read, name, log, round) = (path.clone(), path.clone(), events.clone(), round.clone());
        let mut watch = Watch::new(move |s: &mut Scope| s.field(&read)).with_listener(move |new: &Value, old: &Value, _| {
            log.borrow_mut().push(ChangeEvent { digest: *round.borrow(), watch: name.clone(), new: new.to_json(), old: old.to_json() });
        });
        if opts.deep {
            watch = watch.with_value_equality();
        }
        scope.watch(watch);
    }
    debug!(watchers = scope.watcher_count(), ttl = scope.config().ttl, "scope ready");

    scope.digest()?;
    if !mutations.is_empty() {
        *round.borrow_mut() = 2;
        scope.apply(|s| apply_mutations(s, mutations))??;
    }

    let events = events.take();
    info!(events = events.len(), "digest complete");
    Ok(json!({ "events": events, "scope": scope.to_json() }))
}

/// Write each `--set` through its dot path; the parent must already exist.
fn apply_mutations(scope: &mut Scope, mutations: Vec<(String, Value)>) -> Result<()> {
    for (key, value) in mutations {
        if !scope.set_path(&key, value) {
            bail!("--set '{}': parent is not an object or array, or index is out of range", key);
        }
    }
    Ok(())
}

fn parse_set(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw.split_once('=').ok_or_else(|| anyhow!("--set expects key=<json>, got '{}'", raw))?;
    let json: serde_json::Value = match serde_json::from_str(value) {
        Ok(v) => v,
        // Bare words are taken as strings
        Err(_) => serde_json::Value::String(value.to_string()),
    };
    Ok((key.trim().to_string(), Value::from(json)))
}

fn print_usage() {
    println!(
        r#"beescope - dirty-checking digest over JSON data

USAGE:
    beescope digest <json> --watch <path> [OPTIONS]

OPTIONS:
    -w, --watch <path>     Watch a field (dot notation), repeatable
    -s, --set key=<json>   Mutate a field, then digest again, repeatable
        --deep             Compare by value instead of by reference
        --ttl <n>          Max dirty passes per digest (default 10)
        --log <filter>     tracing filter (overrides RUST_LOG)
        --pretty           Pretty-print output
    -h, --help             Show this help
    -V, --version          Show version

EXAMPLE:
    beescope digest '{{"user": {{"name": "ada"}}}}' -w user.name -s 'user={{"name": "bee"}}'"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> ParsedArgs {
        ParsedArgs::parse(&raw.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn dotted_set_writes_into_the_watched_path() {
        let opts = args(&["digest", r#"{"user": {"name": "ada"}}"#, "-w", "user.name", "-s", r#"user.name="bee""#]);
        let output = cmd_digest(&opts).unwrap();

        assert_eq!(output["scope"], json!({"user": {"name": "bee"}}));
        let events = output["events"].as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1]["digest"], 2);
        assert_eq!(events[1]["new"], "bee");
        assert_eq!(events[1]["old"], "ada");
    }

    #[test]
    fn set_under_a_missing_parent_is_an_error() {
        let opts = args(&["digest", "{}", "-s", "user.name=bee"]);
        let err = cmd_digest(&opts).unwrap_err();
        assert!(err.to_string().contains("user.name"));
    }

    #[test]
    fn unparsable_ttl_is_an_error() {
        let opts = args(&["digest", "{}", "--ttl", "abc"]);
        assert!(opts.config().is_err());
        assert!(cmd_digest(&opts).is_err());
        assert_eq!(args(&["digest", "--ttl", "4"]).config().unwrap().ttl, 4);
    }
}
