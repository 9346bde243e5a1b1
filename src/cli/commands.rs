//! CLI command implementations
//!
//! Each command opens a toolbar session over the storage directory, runs
//! against it exactly as a panel would, and closes the session so deferred
//! writes are flushed.

use std::path::PathBuf;

use serde_json::{json, Value};

use crate::observability::{Logger, Severity};
use crate::overrides::WriteOutcome;
use crate::toolbar::{ToolbarConfig, ToolbarSession};
use crate::view_state::ViewStatePatch;

use super::args::{Cli, Command, DEFAULT_DIR};
use super::errors::{CliError, CliErrorCode, CliResult};
use super::io::print_result;

/// Parse arguments, run the command, print the result
///
/// Every outcome, including a bad config, is printed as one JSON line.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    Logger::set_min_severity(if cli.verbose {
        Severity::Trace
    } else {
        Severity::Warn
    });

    let result = execute(&cli);
    print_result(&result)?;
    result.map(|_| ())
}

/// Resolve config, open a session, run the command and close the session
pub fn execute(cli: &Cli) -> CliResult<Value> {
    let config = resolve_config(cli)?;
    let session = ToolbarSession::open(config)?;

    let result = run_command(&session, &cli.command);
    let flushed = session.close();

    match result {
        Ok(_) if !flushed => Err(CliError::new(
            CliErrorCode::StorageError,
            "pending overrides could not be written",
        )),
        other => other,
    }
}

/// Merge config file and flags: flags win, then file, then defaults
pub fn resolve_config(cli: &Cli) -> CliResult<ToolbarConfig> {
    let mut config = match &cli.config {
        Some(path) => ToolbarConfig::load(path)?,
        None => ToolbarConfig::default(),
    };

    if let Some(dir) = &cli.dir {
        config.storage_dir = Some(dir.clone());
    }
    if config.storage_dir.is_none() {
        config.storage_dir = Some(PathBuf::from(DEFAULT_DIR));
    }
    if let Some(namespace) = &cli.namespace {
        config.namespace = namespace.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Interpret a command-line value: JSON when it parses, else a string
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn outcome_str(outcome: WriteOutcome) -> &'static str {
    match outcome {
        WriteOutcome::Persisted => "persisted",
        WriteOutcome::Pending => "pending",
        WriteOutcome::MemoryOnly => "memory-only",
        WriteOutcome::Unchanged => "unchanged",
    }
}

/// Run one command against an open session
pub fn run_command(session: &ToolbarSession, command: &Command) -> CliResult<Value> {
    let registry = session.overrides();
    let view_states = session.view_states();

    match command {
        Command::List { tool } => {
            let tools = match tool {
                Some(tool) => vec![tool.clone()],
                None => registry.tool_ids(),
            };
            let mut listing = serde_json::Map::new();
            for tool_id in tools {
                listing.insert(
                    tool_id.clone(),
                    serde_json::to_value(registry.overrides(&tool_id))?,
                );
            }
            Ok(Value::Object(listing))
        }

        Command::Set { tool, key, value } => {
            let value = parse_value(value);
            let outcome = registry.set_override(tool, key, value.clone())?;
            Ok(json!({
                "tool": tool,
                "key": key,
                "value": value,
                "outcome": outcome_str(outcome),
            }))
        }

        Command::Clear { tool, key } => {
            let outcome = registry.clear_override(tool, key)?;
            Ok(json!({
                "tool": tool,
                "key": key,
                "removed": outcome.is_applied(),
            }))
        }

        Command::Reset { tool } => match tool {
            Some(tool) => {
                let reset = usize::from(registry.reset_tool(tool)?.is_applied());
                Ok(json!({ "tools_reset": reset }))
            }
            None => {
                let reset = registry.reset_all()?;
                Ok(json!({ "tools_reset": reset }))
            }
        },

        Command::View { tool } => Ok(serde_json::to_value(view_states.get_view_state(tool))?),

        Command::ViewSet {
            tool,
            search,
            filter,
            sort,
        } => {
            let patch = ViewStatePatch {
                search_query: search.clone(),
                filter: filter.clone(),
                sort_order: *sort,
            };
            let state = view_states.try_set_view_state(tool, patch)?;
            Ok(serde_json::to_value(state)?)
        }

        Command::ViewReset { tool } => {
            view_states.reset_view_state(tool)?;
            Ok(serde_json::to_value(view_states.get_view_state(tool))?)
        }

        Command::Snapshot => Ok(serde_json::to_value(session.storage().snapshot())?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::io::write_result;
    use crate::view_state::SortOrder;
    use clap::Parser;
    use tempfile::TempDir;

    fn session(dir: &TempDir) -> ToolbarSession {
        ToolbarSession::open(ToolbarConfig::persistent(dir.path())).unwrap()
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value("[1,2]"), json!([1, 2]));
        assert_eq!(parse_value("\"quoted\""), json!("quoted"));
        assert_eq!(parse_value("de-DE"), json!("de-DE"));
    }

    #[test]
    fn test_set_list_clear() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir);

        let set = Command::Set {
            tool: "feature-flags".into(),
            key: "dark-mode".into(),
            value: "true".into(),
        };
        let data = run_command(&session, &set).unwrap();
        assert_eq!(data["outcome"], "persisted");

        let listing = run_command(&session, &Command::List { tool: None }).unwrap();
        assert_eq!(listing["feature-flags"][0]["key"], "dark-mode");
        assert_eq!(listing["feature-flags"][0]["value"], true);

        let clear = Command::Clear {
            tool: "feature-flags".into(),
            key: "dark-mode".into(),
        };
        assert_eq!(run_command(&session, &clear).unwrap()["removed"], true);
        assert_eq!(run_command(&session, &clear).unwrap()["removed"], false);
    }

    #[test]
    fn test_view_set_merges() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir);

        run_command(
            &session,
            &Command::ViewSet {
                tool: "flags".into(),
                search: Some("beta".into()),
                filter: None,
                sort: Some(SortOrder::Desc),
            },
        )
        .unwrap();
        let state = run_command(
            &session,
            &Command::ViewSet {
                tool: "flags".into(),
                search: None,
                filter: Some("enabled".into()),
                sort: None,
            },
        )
        .unwrap();

        assert_eq!(
            state,
            json!({"searchQuery": "beta", "filter": "enabled", "sortOrder": "desc"})
        );
    }

    #[test]
    fn test_snapshot_lists_namespaced_keys() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir);
        session
            .overrides()
            .set_override("language", "locale", json!("fr"))
            .unwrap();

        let snapshot = run_command(&session, &Command::Snapshot).unwrap();
        assert_eq!(
            snapshot["devbar:language:overrides"]["locale"]["value"],
            "fr"
        );
    }

    #[test]
    fn test_empty_tool_rejected() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir);
        let err = run_command(
            &session,
            &Command::Set {
                tool: "".into(),
                key: "k".into(),
                value: "1".into(),
            },
        )
        .unwrap_err();
        assert_eq!(err.code_str(), "DEVBAR_CLI_OVERRIDE_REJECTED");
    }

    #[test]
    fn test_resolve_config_flags_win() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("devbar.json");
        std::fs::write(&config_path, r#"{"namespace": "from-file", "storage_dir": "/a"}"#).unwrap();

        let cli = Cli::try_parse_from([
            "devbar",
            "--config",
            config_path.to_str().unwrap(),
            "--dir",
            "/b",
            "snapshot",
        ])
        .unwrap();
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.namespace, "from-file");
        assert_eq!(config.storage_dir, Some(PathBuf::from("/b")));

        let cli = Cli::try_parse_from(["devbar", "--namespace", "x:y", "snapshot"]).unwrap();
        assert!(resolve_config(&cli).is_err());
    }

    fn error_line(result: &CliResult<Value>) -> Value {
        let mut buffer = Vec::new();
        write_result(&mut buffer, result).unwrap();
        serde_json::from_slice(&buffer).unwrap()
    }

    #[test]
    fn test_invalid_namespace_reported_as_json() {
        let dir = TempDir::new().unwrap();
        let cli = Cli::try_parse_from([
            "devbar",
            "--dir",
            dir.path().to_str().unwrap(),
            "--namespace",
            "a:b",
            "snapshot",
        ])
        .unwrap();

        let result = execute(&cli);
        assert!(result.is_err());
        let line = error_line(&result);
        assert_eq!(line["status"], "error");
        assert_eq!(line["code"], "DEVBAR_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_missing_config_file_reported_as_json() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nonexistent.json");
        let cli =
            Cli::try_parse_from(["devbar", "--config", missing.to_str().unwrap(), "snapshot"])
                .unwrap();

        let result = execute(&cli);
        let line = error_line(&result);
        assert_eq!(line["status"], "error");
        assert_eq!(line["code"], "DEVBAR_CLI_CONFIG_ERROR");
        assert!(line["message"].as_str().unwrap().contains("nonexistent.json"));
    }

    #[test]
    fn test_execute_success_line() {
        let dir = TempDir::new().unwrap();
        let cli = Cli::try_parse_from([
            "devbar",
            "--dir",
            dir.path().to_str().unwrap(),
            "set",
            "flags",
            "k",
            "1",
        ])
        .unwrap();

        let line = error_line(&execute(&cli));
        assert_eq!(line["status"], "ok");
        assert_eq!(line["data"]["outcome"], "persisted");
    }
}
