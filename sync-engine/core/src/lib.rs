//! The schema sync core: diffing two MySQL schemas, rendering the migration
//! scripts that reconcile them, and dispatching one source over a list of
//! targets.

#![deny(rust_2018_idioms, unsafe_code)]

mod alert;
mod config;
mod dispatch;
mod error;
mod pair;
mod script;
mod sql_renderer;
mod sql_schema_differ;
mod sql_sync_step;
mod sync;

pub use alert::{alert_lines_from_script, send_alert};
pub use config::DispatchConfig;
pub use dispatch::{dispatch, DispatchReport, RunStatus, SyncRunner, TargetOutcome};
pub use error::{CoreError, CoreResult};
pub use pair::Pair;
pub use script::{
    apply_filters, script_file_names, ScriptBuffer, ScriptContext, ScriptType, APPLICATION_NAME,
};
pub use sql_renderer::render_steps;
pub use sql_schema_differ::{calculate_steps, ColumnChange, ColumnChanges, DiffOptions};
pub use sql_sync_step::{SqlSyncStep, TableChange};
pub use sync::{run_sync, SyncOutcome, SyncParams};
