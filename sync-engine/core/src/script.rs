//! Migration script files.
//!
//! A [`ScriptBuffer`] accumulates rendered SQL statements and saves them in a
//! `.patch.sql` / `.revert.sql` pair with a commented header. The whitespace
//! filters reformat the buffer to one statement per line before it is written,
//! which is also the format the alerting code parses back.

use crate::error::{CoreError, CoreResult};
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const APPLICATION_NAME: &str = "Schema Sync";

const DATE_FORMAT: &str = "%Y%m%d";
const TPL_DATE_FORMAT: &str = "%a, %b %d, %Y";

static REGEX_MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s\s+").unwrap());
static REGEX_DISTANT_SEMICOLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\s+;)$").unwrap());
static REGEX_SEMICOLON_EXPLODE_TO_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r";\s+").unwrap());
static REGEX_FILE_COUNTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"_(?P<i>[0-9]+)\.(?:[^.]+)$").unwrap());
static REGEX_TAG: Lazy<Regex> = Lazy::new(|| Regex::new("[^A-Za-z0-9_-]").unwrap());
static REGEX_UNDERSCORE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new("_+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptType {
    Patch,
    Revert,
}

impl ScriptType {
    fn as_str(self) -> &'static str {
        match self {
            ScriptType::Patch => "Patch Script",
            ScriptType::Revert => "Revert Script",
        }
    }
}

/// Everything the script header mentions about the run.
#[derive(Debug, Clone)]
pub struct ScriptContext {
    server_version: String,
    target_host: String,
    target_port: u16,
    target_database: String,
    created: String,
}

impl ScriptContext {
    /// `server_version` is the version of the target server, since that is
    /// the server the script applies to.
    pub fn new(server_version: &str, target_host: &str, target_port: u16, target_database: &str) -> Self {
        ScriptContext {
            server_version: server_version.to_owned(),
            target_host: target_host.to_owned(),
            target_port,
            target_database: target_database.to_owned(),
            created: Local::now().format(TPL_DATE_FORMAT).to_string(),
        }
    }
}

/// An in-memory migration script. Nothing touches the filesystem until
/// [`ScriptBuffer::save`].
#[derive(Debug)]
pub struct ScriptBuffer {
    name: PathBuf,
    script_type: ScriptType,
    ctx: ScriptContext,
    version_filename: bool,
    modified: bool,
    buffer: String,
}

impl ScriptBuffer {
    pub fn new(name: PathBuf, script_type: ScriptType, ctx: ScriptContext, version_filename: bool) -> Self {
        ScriptBuffer {
            name,
            script_type,
            ctx,
            version_filename,
            modified: false,
            buffer: String::new(),
        }
    }

    pub fn write(&mut self, data: &str) {
        self.modified = true;
        self.buffer.push_str(data);
    }

    pub fn modified(&self) -> bool {
        self.modified
    }

    /// The path the script was (or will be) saved under. Versioning can
    /// change it during `save`.
    pub fn name(&self) -> &Path {
        &self.name
    }

    /// Write the script to disk. Returns `false` without touching the
    /// filesystem when nothing was written to the buffer.
    pub fn save(&mut self) -> CoreResult<bool> {
        if self.buffer.is_empty() {
            return Ok(false);
        }

        if self.version_filename {
            self.name = versioned(&self.name)?;
        }

        let data = apply_filters(&self.buffer);
        let contents = render_script(self.script_type, &self.ctx, &data);

        fs::write(&self.name, contents).map_err(|source| CoreError::ScriptWrite { source })?;

        Ok(true)
    }

    pub fn delete(&self) -> CoreResult<()> {
        if self.name.is_file() {
            fs::remove_file(&self.name)?;
        }

        Ok(())
    }
}

fn render_script(script_type: ScriptType, ctx: &ScriptContext, data: &str) -> String {
    format!(
        "--\n-- {} {} {}\n-- Created: {}\n-- Server Version: {}\n-- Apply To: {}:{}/{}\n--\n\n{}",
        APPLICATION_NAME,
        env!("CARGO_PKG_VERSION"),
        script_type.as_str(),
        ctx.created,
        ctx.server_version,
        ctx.target_host,
        ctx.target_port,
        ctx.target_database,
        data,
    )
}

/// Collapse runs of whitespace, then re-break the buffer so each statement
/// ends up on its own line.
pub fn apply_filters(data: &str) -> String {
    let data = REGEX_MULTI_SPACE.replace_all(data, " ");
    let data = REGEX_DISTANT_SEMICOLON.replace_all(&data, ";");

    REGEX_SEMICOLON_EXPLODE_TO_NEWLINE.replace_all(&data, ";\n").into_owned()
}

/// The `.patch.sql` and `.revert.sql` file names for a database, with the
/// sanitized tag and the current date worked in.
pub fn script_file_names(database: &str, tag: Option<&str>, no_date: bool) -> (String, String) {
    let date = Local::now().format(DATE_FORMAT).to_string();

    let basename = match tag {
        Some(tag) => {
            let mut tag = REGEX_TAG.replace_all(tag, "_").into_owned();
            if tag.contains("__") {
                tag = REGEX_UNDERSCORE_RUN.replace_all(&tag, "_").into_owned();
            }
            format!("{database}_{tag}.{date}")
        }
        None if no_date => database.to_owned(),
        None => format!("{database}.{date}"),
    };

    (format!("{basename}.patch.sql"), format!("{basename}.revert.sql"))
}

/// Append `_N` to the file name, where `N` is one more than the highest
/// counter among the already existing files with the same base name. The
/// path is returned unchanged when no such file exists.
fn versioned(path: &Path) -> CoreResult<PathBuf> {
    let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let mut any_match = false;
    let mut counters: Vec<u64> = Vec::new();

    for entry in fs::read_dir(directory)? {
        let candidate = entry?.file_name().to_string_lossy().into_owned();

        if !candidate.starts_with(&stem) || !candidate.ends_with(&ext) {
            continue;
        }

        any_match = true;

        if let Some(captures) = REGEX_FILE_COUNTER.captures(&candidate) {
            if let Ok(counter) = captures["i"].parse() {
                counters.push(counter);
            }
        }
    }

    if !any_match {
        return Ok(path.to_owned());
    }

    let counter = counters.iter().max().map(|max| max + 1).unwrap_or(1);

    Ok(directory.join(format!("{stem}_{counter}{ext}")))
}

pub(crate) fn use_statement(database: &str) -> String {
    format!("USE `{database}`;\n")
}

pub(crate) fn foreign_key_checks(enabled: bool) -> &'static str {
    if enabled {
        "SET FOREIGN_KEY_CHECKS = 1;\n"
    } else {
        "SET FOREIGN_KEY_CHECKS = 0;\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn filters_put_each_statement_on_its_own_line() {
        let buffer = "USE `biz`;\nSET FOREIGN_KEY_CHECKS = 0;\nALTER TABLE `user` ADD COLUMN `email` varchar(191) NOT NULL;\nSET FOREIGN_KEY_CHECKS = 1;\n";

        let filtered = apply_filters(buffer);

        assert_eq!(
            filtered,
            "USE `biz`;\nSET FOREIGN_KEY_CHECKS = 0;\nALTER TABLE `user` ADD COLUMN `email` varchar(191) NOT NULL;\nSET FOREIGN_KEY_CHECKS = 1;\n"
        );
    }

    #[test]
    fn filters_collapse_multiline_statements() {
        let buffer = "ALTER TABLE `user` DROP COLUMN `a`,\n    MODIFY `b` int NOT NULL;\n";

        let filtered = apply_filters(buffer);

        assert_eq!(filtered, "ALTER TABLE `user` DROP COLUMN `a`, MODIFY `b` int NOT NULL;\n");
    }

    #[test]
    fn file_names_with_tag_and_date() {
        let (patch, revert) = script_file_names("biz", Some("release 1/2"), false);
        let date = Local::now().format(DATE_FORMAT).to_string();

        assert_eq!(patch, format!("biz_release_1_2.{date}.patch.sql"));
        assert_eq!(revert, format!("biz_release_1_2.{date}.revert.sql"));
    }

    #[test]
    fn file_names_without_date() {
        let (patch, revert) = script_file_names("biz", None, true);

        assert_eq!(patch, "biz.patch.sql");
        assert_eq!(revert, "biz.revert.sql");
    }

    #[test]
    fn tag_with_consecutive_separators_is_collapsed() {
        let (patch, _) = script_file_names("biz", Some("a!!b"), false);

        assert!(patch.starts_with("biz_a_b."), "{patch}");
    }

    #[test]
    fn versioned_returns_the_path_unchanged_when_nothing_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("biz.patch.sql");

        assert_eq!(versioned(&path).unwrap(), path);
    }

    #[test]
    fn versioned_counts_past_the_highest_existing_counter() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("biz.patch.sql"), "x").unwrap();
        fs::write(dir.path().join("biz.patch_2.sql"), "x").unwrap();
        fs::write(dir.path().join("biz.patch_10.sql"), "x").unwrap();

        let path = dir.path().join("biz.patch.sql");

        // _10 must win over _2, even though "10" sorts before "2" lexically.
        assert_eq!(versioned(&path).unwrap(), dir.path().join("biz.patch_11.sql"));
    }

    #[test]
    fn save_is_a_no_op_for_an_empty_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ScriptContext::new("8.0.32", "db1.example.com", 3306, "biz");
        let mut buffer = ScriptBuffer::new(dir.path().join("biz.patch.sql"), ScriptType::Patch, ctx, false);

        assert!(!buffer.save().unwrap());
        assert!(!buffer.name().exists());
    }

    #[test]
    fn saved_scripts_carry_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ScriptContext::new("8.0.32", "db1.example.com", 3306, "biz");
        let mut buffer = ScriptBuffer::new(dir.path().join("biz.patch.sql"), ScriptType::Patch, ctx, false);

        buffer.write(&use_statement("biz"));
        buffer.write(foreign_key_checks(false));
        buffer.write("DROP TABLE `old`;\n");
        buffer.write(foreign_key_checks(true));

        assert!(buffer.save().unwrap());

        let contents = fs::read_to_string(buffer.name()).unwrap();
        let mut lines = contents.lines();

        assert_eq!(lines.next(), Some("--"));
        assert!(lines.next().unwrap().starts_with("-- Schema Sync "));
        assert!(lines.next().unwrap().starts_with("-- Created: "));
        assert_eq!(lines.next(), Some("-- Server Version: 8.0.32"));
        assert_eq!(lines.next(), Some("-- Apply To: db1.example.com:3306/biz"));
        assert_eq!(lines.next(), Some("--"));
        assert_eq!(lines.next(), Some(""));
        assert_eq!(lines.next(), Some("USE `biz`;"));
        assert_eq!(lines.next(), Some("SET FOREIGN_KEY_CHECKS = 0;"));
        assert_eq!(lines.next(), Some("DROP TABLE `old`;"));
        assert_eq!(lines.next(), Some("SET FOREIGN_KEY_CHECKS = 1;"));
    }

    #[test]
    fn delete_removes_the_saved_script() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ScriptContext::new("8.0.32", "db1.example.com", 3306, "biz");
        let mut buffer = ScriptBuffer::new(dir.path().join("biz.patch.sql"), ScriptType::Patch, ctx, false);

        buffer.write("DROP TABLE `old`;\n");
        buffer.save().unwrap();
        assert!(buffer.name().exists());

        buffer.delete().unwrap();
        assert!(!buffer.name().exists());
    }
}
