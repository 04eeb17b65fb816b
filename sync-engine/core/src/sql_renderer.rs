mod common;
mod mysql_renderer;

use crate::{pair::Pair, sql_schema_differ::DiffOptions, sql_sync_step::SqlSyncStep};
use sql_schema_describer::SqlSchema;

/// Render each step as a single SQL statement, without a trailing semicolon.
///
/// The steps must have been calculated from the same pair of schemas, since
/// they reference tables and columns by name.
pub fn render_steps(steps: &[SqlSyncStep], schemas: Pair<&SqlSchema>, opts: DiffOptions) -> Vec<String> {
    steps
        .iter()
        .map(|step| mysql_renderer::render_step(step, schemas, opts))
        .collect()
}
