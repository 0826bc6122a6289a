use std::collections::BTreeMap;
use std::fs;
use std::io::{
  BufRead,
  BufReader,
  Write
};
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use b2i_shared::postgrest::{
  ApiError,
  Method,
  Request,
  Response
};
use tempfile::NamedTempFile;
use tracing::{
  debug,
  error,
  info
};

use super::Backend;
use super::memory::{
  MemoryBackend,
  Row
};

const TABLE_EXT: &str = "jsonl";

/// File-backed fallback store: the
/// in-memory interpreter, loaded from and
/// saved to one JSONL file per table.
#[derive(Debug)]
pub struct LocalBackend {
  dir:    PathBuf,
  memory: MemoryBackend
}

impl LocalBackend {
  #[tracing::instrument(skip(dir))]
  pub fn open(
    dir: &Path
  ) -> anyhow::Result<Self> {
    fs::create_dir_all(dir).with_context(
      || {
        format!(
          "failed to create {}",
          dir.display()
        )
      }
    )?;

    let mut tables = BTreeMap::new();
    let entries = fs::read_dir(dir)
      .with_context(|| {
        format!(
          "failed to list {}",
          dir.display()
        )
      })?;
    for entry in entries {
      let path = entry?.path();
      if path.extension().and_then(|ext| {
        ext.to_str()
      }) != Some(TABLE_EXT)
      {
        continue;
      }
      let Some(table) = path
        .file_stem()
        .and_then(|stem| stem.to_str())
      else {
        continue;
      };
      let rows =
        load_jsonl(&path).with_context(
          || {
            format!(
              "failed to load {}",
              path.display()
            )
          }
        )?;
      tables.insert(table.to_string(), rows);
    }

    info!(
      dir = %dir.display(),
      tables = tables.len(),
      "opened local store"
    );

    Ok(Self {
      dir:    dir.to_path_buf(),
      memory: MemoryBackend::with_tables(
        tables
      )
    })
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  pub fn table_path(
    &self,
    table: &str
  ) -> PathBuf {
    self
      .dir
      .join(format!("{table}.{TABLE_EXT}"))
  }

  #[tracing::instrument(skip(self))]
  fn persist(
    &self,
    table: &str
  ) -> anyhow::Result<()> {
    let rows = self.memory.rows(table);
    save_jsonl_atomic(
      &self.table_path(table),
      &rows
    )
  }
}

impl Backend for LocalBackend {
  fn execute(
    &self,
    request: &Request
  ) -> Result<Response, ApiError> {
    let response =
      self.memory.execute(request)?;
    if request.method == Method::Get
      || !response.is_success()
    {
      return Ok(response);
    }
    let Some(table) = request.table() else {
      return Ok(response);
    };
    if let Err(err) = self.persist(table) {
      error!(table, error = %format!("{err:#}"), "failed saving local table");
      return Err(ApiError::Transport(
        format!("{err:#}")
      ));
    }
    Ok(response)
  }
}

#[tracing::instrument(skip(path))]
fn load_jsonl(
  path: &Path
) -> anyhow::Result<Vec<Row>> {
  debug!(file = %path.display(), "loading jsonl");
  let file = fs::File::open(path)?;
  let reader = BufReader::new(file);

  let mut out = Vec::new();
  for (idx, line) in
    reader.lines().enumerate()
  {
    let line = line?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
      continue;
    }
    let row: Row =
      serde_json::from_str(trimmed)
        .with_context(|| {
          format!(
            "failed parsing {} line {}",
            path.display(),
            idx + 1
          )
        })?;
    out.push(row);
  }

  debug!(count = out.len(), "loaded rows from jsonl");
  Ok(out)
}

#[tracing::instrument(skip(path, rows))]
fn save_jsonl_atomic(
  path: &Path,
  rows: &[Row]
) -> anyhow::Result<()> {
  debug!(file = %path.display(), count = rows.len(), "saving jsonl atomically");

  let dir = path
    .parent()
    .unwrap_or_else(|| Path::new("."));
  let mut temp =
    NamedTempFile::new_in(dir)?;
  for row in rows {
    let serialized =
      serde_json::to_string(row)?;
    writeln!(temp, "{serialized}")?;
  }
  temp.flush()?;

  temp.persist(path).map_err(|err| {
    anyhow!(
      "failed to persist {}: {}",
      path.display(),
      err
    )
  })?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use b2i_shared::postgrest::{
    ClientConfig,
    from
  };
  use serde_json::json;
  use tempfile::tempdir;

  use super::*;

  #[test]
  fn writes_survive_reopen() {
    let temp = tempdir().expect("tempdir");
    let config =
      ClientConfig::new("http://local", "local");

    {
      let backend = LocalBackend::open(temp.path())
        .expect("open local store");
      let request = from("goals")
        .insert(&json!({
          "user_id": "u1",
          "title": "Run a half marathon",
          "is_completed": false
        }))
        .expect("body")
        .into_request(&config, None);
      backend
        .execute(&request)
        .expect("execute")
        .check(&request)
        .expect("insert");
      assert!(backend.table_path("goals").exists());
    }

    let reopened = LocalBackend::open(temp.path())
      .expect("reopen local store");
    let request = from("goals")
      .select("*")
      .eq("user_id", "u1")
      .into_request(&config, None);
    let rows: Vec<Row> = reopened
      .execute(&request)
      .expect("execute")
      .json()
      .expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(
      rows[0]["title"],
      json!("Run a half marathon")
    );
  }

  #[test]
  fn ignores_unrelated_files() {
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join("user.json"), "{}")
      .expect("write stray file");
    let backend = LocalBackend::open(temp.path())
      .expect("open local store");
    assert!(backend.memory.table_names().is_empty());
  }
}
