use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::AppConfig;
use crate::domain::entities::group::GroupId;
use crate::domain::entities::meter::{join_meter_ids, MeterId, MeterSet};
use crate::domain::reconcile::{validate_and_extract_meter_ids, MeterSelection};
use crate::infra::sqlite::repo::SqliteRepo;
use crate::usecase::ports::form::{
    DropdownInput, FieldValue, MeterIdField, Notifier, SelectOption,
};
use crate::usecase::services::group_service::{GroupEdits, GroupForm, GroupService};
use crate::usecase::services::import_service::ImportService;
use crate::usecase::services::selection_service::SelectionSession;

#[derive(Debug, Parser)]
#[command(name = "meter-groups", version, about = "Manage meter groups")]
pub struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "METER_GROUPS_DB")]
    pub db: Option<PathBuf>,

    /// TOML config file
    #[arg(long, global = true, env = "METER_GROUPS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a group from uploaded files and picked meter ids
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// CSV, TSV/TXT or XLSX file with a meter id column; repeatable
        #[arg(long = "file")]
        files: Vec<PathBuf>,
        /// Meter id picked by hand; repeatable
        #[arg(long = "meter")]
        meters: Vec<MeterId>,
        #[arg(long)]
        created_by: Option<String>,
        #[arg(long)]
        customer_id: Option<String>,
    },
    /// Add meters to a group, rename it or remove members
    Edit {
        group_id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "file")]
        files: Vec<PathBuf>,
        #[arg(long = "meter")]
        meters: Vec<MeterId>,
        #[arg(long = "remove")]
        remove: Vec<MeterId>,
    },
    /// Parse a file and report the meter ids it would contribute
    Inspect {
        file: PathBuf,
        #[arg(long = "existing")]
        existing: Vec<MeterId>,
    },
    List,
    Show {
        group_id: i64,
    },
    Delete {
        group_id: i64,
    },
}

/// Prints upload and selection feedback to stderr.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn on_success(&mut self, ids: &[MeterId]) {
        eprintln!("accepted {} meter ID(s)", ids.len());
    }

    fn on_warning(&mut self, message: &str) {
        eprintln!("warning: {message}");
    }

    fn on_error(&mut self, message: &str) {
        eprintln!("error: {message}");
    }
}

fn feed_session<F, N>(
    session: &mut SelectionSession<F, N>,
    import: &ImportService,
    files: &[PathBuf],
    meters: &[MeterId],
) -> Result<()>
where
    F: MeterIdField,
    N: Notifier,
{
    for file in files {
        let result = match import.load_rows(file) {
            Ok(rows) => session.on_file_parse(&rows),
            Err(err) => session.on_file_load_failed(&err),
        };
        if !result.success() {
            return Err(anyhow!("upload rejected: {}", file.display()));
        }
    }

    if !meters.is_empty() {
        let options = meters.iter().copied().map(SelectOption::from).collect();
        session.on_dropdown_change(DropdownInput::Many(options));
    }

    for line in session.view().summary_lines() {
        println!("{line}");
    }
    Ok(())
}

fn print_group(service: &GroupService, id: GroupId) -> Result<()> {
    let group = service.get(id)?;
    println!("id:          {}", group.id);
    println!("name:        {}", group.name);
    println!("description: {}", group.description);
    println!("created by:  {}", group.created_by);
    if let Some(customer_id) = &group.customer_id {
        println!("customer:    {customer_id}");
    }
    println!("created at:  {}", group.created_at);
    println!("updated at:  {}", group.updated_at);
    println!("meters ({}): {}", group.meter_ids.len(), join_meter_ids(&group.meter_ids));
    Ok(())
}

fn inspect_file(import: &ImportService, file: &Path, existing: &[MeterId]) -> Result<()> {
    let rows = import.load_rows(file)?;
    let headers = rows.first().map(|row| row.headers()).unwrap_or_default();
    let existing: MeterSet = existing.iter().copied().collect();

    let result = validate_and_extract_meter_ids(&headers, &rows, Some(&existing));

    println!("success:    {}", result.success());
    println!("ids ({}): {}", result.data.len(), join_meter_ids(&result.ids()));
    println!(
        "duplicates ({}): {}",
        result.duplicates.len(),
        join_meter_ids(&result.duplicates)
    );
    if let Some(err) = &result.error {
        println!("error:      {err}");
    }
    Ok(())
}

pub fn run(cli: Cli, config: AppConfig) -> Result<()> {
    let db_path = config.resolve_db_path(cli.db.as_deref())?;
    debug!(db = %db_path.display(), "resolved database path");

    let import = ImportService::new();
    let service = GroupService::new(Arc::new(SqliteRepo::new(db_path)));
    let open_store = || service.init().context("failed to initialise group store");

    match cli.command {
        Command::Inspect { file, existing } => inspect_file(&import, &file, &existing)?,
        Command::Create {
            name,
            description,
            files,
            meters,
            created_by,
            customer_id,
        } => {
            open_store()?;
            let mut session = SelectionSession::new(
                MeterSelection::create(),
                FieldValue::default(),
                ConsoleNotifier,
            );
            feed_session(&mut session, &import, &files, &meters)?;

            let form = GroupForm {
                name,
                description,
                created_by: created_by.unwrap_or(config.created_by),
                customer_id: customer_id.or(config.customer_id),
            };
            let (selection, _, _) = session.into_parts();
            let id = service.create_from_session(form, &selection)?;
            println!("created group {id}");
        }
        Command::Edit {
            group_id,
            name,
            description,
            files,
            meters,
            remove,
        } => {
            open_store()?;
            let id = GroupId(group_id);
            let (_, selection) = service.open_edit_session(id)?;
            let mut session =
                SelectionSession::new(selection, FieldValue::default(), ConsoleNotifier);
            feed_session(&mut session, &import, &files, &meters)?;

            let edits = GroupEdits {
                name,
                description,
                remove_meter_ids: remove,
            };
            let (selection, _, _) = session.into_parts();
            let update = service.update_from_session(id, edits, &selection)?;
            println!(
                "updated group {id}: {} added, {} removed",
                update.add_meter_ids.len(),
                update.remove_meter_ids.len()
            );
        }
        Command::List => {
            open_store()?;
            for group in service.list()? {
                println!(
                    "{:>6}  {:<32}  {:>6} meters  {}",
                    group.id, group.name, group.meter_count, group.updated_at
                );
            }
        }
        Command::Show { group_id } => {
            open_store()?;
            print_group(&service, GroupId(group_id))?;
        }
        Command::Delete { group_id } => {
            open_store()?;
            service.delete(GroupId(group_id))?;
            println!("deleted group {group_id}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn repeated_flags_collect_in_order() {
        let cli = Cli::try_parse_from([
            "meter-groups",
            "create",
            "--name",
            "North",
            "--meter",
            "3",
            "--meter",
            "1",
            "--file",
            "a.csv",
        ])
        .expect("should parse");

        match cli.command {
            Command::Create { meters, files, .. } => {
                assert_eq!(meters.iter().map(|m| m.get()).collect::<Vec<_>>(), vec![3, 1]);
                assert_eq!(files, vec![PathBuf::from("a.csv")]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn inspect_does_not_create_the_store() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        let temp_dir = std::env::temp_dir().join(format!("meter-groups-inspect-{nanos}"));
        std::fs::create_dir_all(&temp_dir).expect("should create temp dir");
        let csv_path = temp_dir.join("meters.csv");
        std::fs::write(&csv_path, "meter_id\n7\n").expect("should write csv");
        let db_path = temp_dir.join("store").join("groups.sqlite");

        let cli = Cli::try_parse_from([
            OsString::from("meter-groups"),
            OsString::from("--db"),
            db_path.clone().into_os_string(),
            OsString::from("inspect"),
            csv_path.clone().into_os_string(),
        ])
        .expect("should parse");
        run(cli, AppConfig::default()).expect("inspect should succeed");

        assert!(!db_path.exists(), "inspect should leave the store alone");

        std::fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
    }

    #[test]
    fn zero_meter_id_is_rejected_by_parser() {
        let parsed = Cli::try_parse_from(["meter-groups", "create", "--name", "x", "--meter", "0"]);
        assert!(parsed.is_err());
    }
}
