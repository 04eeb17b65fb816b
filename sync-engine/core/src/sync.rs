//! A single source → target synchronization run.

use crate::{
    alert::{alert_lines_from_script, send_alert},
    error::{CoreError, CoreResult},
    pair::Pair,
    script::{foreign_key_checks, script_file_names, use_statement, ScriptBuffer, ScriptContext, ScriptType},
    sql_renderer::render_steps,
    sql_schema_differ::{calculate_steps, DiffOptions},
};
use sql_connection::{Mysql, MysqlUrl, SqlConnection};
use sql_schema_describer::{
    mysql::{circumstances, SqlSchemaDescriber},
    SqlSchema,
};
use std::{cmp::Ordering, fs, path::PathBuf};

#[derive(Debug, Clone)]
pub struct SyncParams {
    pub source_url: String,
    pub target_url: String,
    /// Version the output file names instead of overwriting previous runs.
    pub version_filename: bool,
    pub output_directory: PathBuf,
    /// Leave the date out of the output file names.
    pub no_date: bool,
    pub tag: Option<String>,
    pub sync_comments: bool,
    pub sync_auto_increment: bool,
    pub tables: Option<Vec<String>>,
    pub views: Option<Vec<String>>,
    pub triggers: Option<Vec<String>>,
    pub procedures: Option<Vec<String>>,
    /// Restrict the run to tables that already exist on the target.
    pub only_sync_exists_tables: bool,
    pub alert_url: Option<String>,
    /// Keep the scripts on disk after a successful alert.
    pub no_delete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The schemas matched, no scripts were written.
    InSync,
    /// Scripts were written for at least one database.
    Differences,
}

pub async fn run_sync(params: &SyncParams) -> CoreResult<SyncOutcome> {
    if !params.output_directory.is_dir() {
        return Err(CoreError::OutputDirectoryMissing {
            path: params.output_directory.clone(),
        });
    }

    let source_url = MysqlUrl::new(&params.source_url)?;
    let target_url = MysqlUrl::new(&params.target_url)?;

    match (source_url.is_wildcard(), target_url.is_wildcard()) {
        (true, true) => run_wildcard(params, &source_url, &target_url).await,
        (false, false) => run_one(params, &source_url, &target_url).await,
        _ => Err(CoreError::WildcardMismatch),
    }
}

/// Sync every database of the source server to its same-named counterpart on
/// the target server.
async fn run_wildcard(
    params: &SyncParams,
    source_url: &MysqlUrl,
    target_url: &MysqlUrl,
) -> CoreResult<SyncOutcome> {
    let source_conn = Mysql::new(source_url.clone());
    let databases = SqlSchemaDescriber::new(&source_conn, Default::default())
        .list_databases()
        .await?;

    tracing::info!("Syncing {} databases from {}", databases.len(), source_url.host());

    let mut outcome = SyncOutcome::InSync;

    for database in databases {
        let source = source_url.with_dbname(&database);
        let target = target_url.with_dbname(&database);

        match run_one(params, &source, &target).await {
            Ok(SyncOutcome::Differences) => outcome = SyncOutcome::Differences,
            Ok(SyncOutcome::InSync) => (),
            Err(error) => tracing::error!("{error} (Ignore)"),
        }
    }

    Ok(outcome)
}

async fn run_one(params: &SyncParams, source_url: &MysqlUrl, target_url: &MysqlUrl) -> CoreResult<SyncOutcome> {
    let source_conn = Mysql::new(source_url.clone());
    let target_conn = Mysql::new(target_url.clone());

    let source_version = server_version(&source_conn, "source").await?;
    let target_version = server_version(&target_conn, "target").await?;

    let mut source_schema = describe(&source_conn, &source_version, source_url.dbname()).await?;
    let mut target_schema = describe(&target_conn, &target_version, target_url.dbname()).await?;

    if params.only_sync_exists_tables {
        let existing = SqlSchemaDescriber::new(&target_conn, circumstances(&target_version))
            .table_names(target_url.dbname())
            .await?;
        source_schema.retain_tables(&existing);
        target_schema.retain_tables(&existing);
    } else if let Some(tables) = &params.tables {
        source_schema.retain_tables(tables);
        target_schema.retain_tables(tables);
    }

    if let Some(views) = &params.views {
        source_schema.retain_views(views);
        target_schema.retain_views(views);
    }

    if let Some(triggers) = &params.triggers {
        source_schema.retain_triggers(triggers);
        target_schema.retain_triggers(triggers);
    }

    if let Some(procedures) = &params.procedures {
        source_schema.retain_procedures(procedures);
        target_schema.retain_procedures(procedures);
    }

    let opts = DiffOptions {
        sync_comments: params.sync_comments,
        sync_auto_increment: params.sync_auto_increment,
    };

    let patch_schemas = Pair::new(&target_schema, &source_schema);
    let patch_steps = calculate_steps(patch_schemas, opts);

    if patch_steps.is_empty() {
        tracing::info!("No migration scripts written. {source_url} and {target_url} were in sync.");
        return Ok(SyncOutcome::InSync);
    }

    let revert_schemas = Pair::new(&source_schema, &target_schema);
    let revert_steps = calculate_steps(revert_schemas, opts);

    let patch_statements = render_steps(&patch_steps, patch_schemas, opts);
    let revert_statements = render_steps(&revert_steps, revert_schemas, opts);

    for (step, statement) in patch_steps.iter().zip(&patch_statements) {
        tracing::debug!(step = step.description(), %statement);
    }

    let (patch_name, revert_name) = script_file_names(target_url.dbname(), params.tag.as_deref(), params.no_date);
    let ctx = ScriptContext::new(
        &target_version,
        target_url.host(),
        target_url.port(),
        target_url.dbname(),
    );

    let mut patch_buffer = ScriptBuffer::new(
        params.output_directory.join(patch_name),
        ScriptType::Patch,
        ctx.clone(),
        params.version_filename,
    );
    let mut revert_buffer = ScriptBuffer::new(
        params.output_directory.join(revert_name),
        ScriptType::Revert,
        ctx,
        params.version_filename,
    );

    write_script(&mut patch_buffer, target_url.dbname(), &patch_statements);
    write_script(&mut revert_buffer, target_url.dbname(), &revert_statements);

    patch_buffer.save()?;
    revert_buffer.save()?;

    tracing::info!(
        "Migration scripts created for {target_url}\nPatch Script: {}\nRevert Script: {}",
        patch_buffer.name().display(),
        revert_buffer.name().display(),
    );

    if let Some(alert_url) = &params.alert_url {
        tracing::warn!("alerting...");

        let target_addr = target_url.display_address();
        let contents = fs::read_to_string(patch_buffer.name())?;
        let lines = alert_lines_from_script(&contents);

        send_alert(alert_url, &target_addr, &lines).await?;

        if !params.no_delete {
            patch_buffer.delete()?;
            tracing::info!("deleted {}", patch_buffer.name().display());
            revert_buffer.delete()?;
            tracing::info!("deleted {}", revert_buffer.name().display());
        }
    }

    Ok(SyncOutcome::Differences)
}

async fn server_version(conn: &Mysql, role: &'static str) -> CoreResult<String> {
    let version = conn
        .version()
        .await?
        .ok_or(CoreError::UnknownServerVersion { role })?;

    if compare_versions(&version, "5.0.0") == Ordering::Less {
        return Err(CoreError::UnsupportedServerVersion { role, version });
    }

    Ok(version)
}

async fn describe(conn: &Mysql, version: &str, database: &str) -> CoreResult<SqlSchema> {
    let describer = SqlSchemaDescriber::new(conn, circumstances(version));

    Ok(describer.describe(database).await?)
}

/// The statements wrapped in a USE and a pair of foreign key guards. An empty
/// statement list writes nothing, so no file gets saved.
fn write_script(buffer: &mut ScriptBuffer, database: &str, statements: &[String]) {
    if statements.is_empty() {
        return;
    }

    buffer.write(&use_statement(database));
    buffer.write(foreign_key_checks(false));

    for statement in statements {
        buffer.write(&format!("{statement};\n"));
    }

    buffer.write(foreign_key_checks(true));
}

/// Compare two server version strings segment by segment. Segments that are
/// not numeric on both sides, like `log` in `5.7.40-log`, do not order.
fn compare_versions(x: &str, y: &str) -> Ordering {
    for (x_part, y_part) in x.split(&['.', '-'][..]).zip(y.split(&['.', '-'][..])) {
        if x_part == y_part {
            continue;
        }

        match (x_part.parse::<u64>(), y_part.parse::<u64>()) {
            (Ok(x_number), Ok(y_number)) => return x_number.cmp(&y_number),
            _ => return Ordering::Equal,
        }
    }

    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_comparisons() {
        assert_eq!(compare_versions("5.7.40-log", "5.0.0"), Ordering::Greater);
        assert_eq!(compare_versions("10.6.12-MariaDB", "5.0.0"), Ordering::Greater);
        assert_eq!(compare_versions("4.1.22", "5.0.0"), Ordering::Less);
        assert_eq!(compare_versions("8.0.32", "8.0.32"), Ordering::Equal);
        assert_eq!(compare_versions("5.0", "5.0.0"), Ordering::Equal);
    }

    #[test]
    fn write_script_skips_empty_statement_lists() {
        let ctx = ScriptContext::new("8.0.32", "db1.example.com", 3306, "biz");
        let mut buffer = ScriptBuffer::new(PathBuf::from("unused.sql"), ScriptType::Patch, ctx, false);

        write_script(&mut buffer, "biz", &[]);

        assert!(!buffer.modified());
    }
}
