//! Command-line front end for the display point registry.
//!
//! # Responsibility
//! - Drive lifecycle hooks against a SQLite file without a host application.
//! - Print view results as JSON; exit non-zero on any rejected request.

use display_editor_core::db::open_db;
use display_editor_core::{
    core_version, default_log_level, init_logging, DisplayEditorHooks, RegistryConfig,
    RegistryService, RequestFields, SqliteConfigStore, FIELD_SEARCH,
};
use log::error;
use serde_json::Value;
use std::process::ExitCode;

const LOG_DIR_ENV: &str = "DISPLAY_EDITOR_LOG_DIR";
const CONFIG_ENV: &str = "DISPLAY_EDITOR_CONFIG";
const USAGE: &str = "usage: display_editor_cli <db-file> <command> [args]

commands:
  install
  uninstall
  new <name>
  save <name> <prev_name> <queries-json>
  rename <prev_name> <name>
  view <admin-path> [search]
  version";

fn main() -> ExitCode {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match run(&args) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<String, String> {
    let [db_path, command, rest @ ..] = args else {
        return Err(USAGE.to_string());
    };

    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        init_logging(default_log_level(), &log_dir)?;
    }
    let config = match std::env::var(CONFIG_ENV) {
        Ok(raw) => RegistryConfig::from_json_str(&raw).map_err(|err| err.to_string())?,
        Err(_) => RegistryConfig::default(),
    };

    let conn = open_db(db_path).map_err(|err| err.to_string())?;
    let store = SqliteConfigStore::try_new(&conn).map_err(|err| err.to_string())?;
    let service = RegistryService::new(store, config).map_err(|err| err.to_string())?;
    let hooks = DisplayEditorHooks::new(service).map_err(|err| err.to_string())?;

    let result = match (command.as_str(), rest) {
        ("install", []) => hooks.install().map(|()| String::new()),
        ("uninstall", []) => hooks.uninstall().map(|()| String::new()),
        ("new", [name]) => hooks
            .handle_admin_action("new", &request([("name", Value::from(name.as_str()))]))
            .map(|()| String::new()),
        ("save", [name, prev_name, queries]) => {
            let queries = serde_json::from_str::<Value>(queries)
                .map_err(|err| format!("queries must be JSON: {err}"))?;
            let input = request([
                ("name", Value::from(name.as_str())),
                ("prev_name", Value::from(prev_name.as_str())),
                ("queries", queries),
            ]);
            hooks
                .handle_admin_action("save", &input)
                .map(|()| String::new())
        }
        ("rename", [prev_name, name]) => {
            let input = request([
                ("prev_name", Value::from(prev_name.as_str())),
                ("name", Value::from(name.as_str())),
            ]);
            hooks
                .handle_admin_action("rename", &input)
                .map(|()| String::new())
        }
        ("view", [path, search @ ..]) if search.len() <= 1 => {
            let input = match search.first() {
                Some(search) => request([(FIELD_SEARCH, Value::from(search.as_str()))]),
                None => RequestFields::new(),
            };
            hooks.handle_admin_view(path, &input).map(|view| {
                serde_json::to_string_pretty(&view).unwrap_or_else(|err| err.to_string())
            })
        }
        ("version", []) => Ok(core_version().to_string()),
        _ => return Err(USAGE.to_string()),
    };

    result.map_err(|err| {
        error!("event=cli_command module=cli status=error command={command} error={err}");
        err.to_string()
    })
}

fn request<const N: usize>(pairs: [(&str, Value); N]) -> RequestFields {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
