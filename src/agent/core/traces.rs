//! Experience trace files.
//!
//! A trace is one [`ExperienceBatch`] stored as JSON in a file whose name
//! starts with [`TRACE_PREFIX`]. Tensors use ndarray's serde layout and
//! structured collections keep their key order.
use crate::agent::{
    core::batch::ExperienceBatch,
    errors::{AgentError, AgentResult},
};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

/// File-name prefix identifying trace files inside a directory.
pub const TRACE_PREFIX: &str = "trace-";

fn io_error(path: &Path, err: impl ToString) -> AgentError {
    AgentError::TraceIo { path: path.display().to_string(), reason: err.to_string() }
}

/// Serialize `batch` to `path`.
pub fn write_trace(path: &Path, batch: &ExperienceBatch) -> AgentResult<()> {
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, batch).map_err(|e| io_error(path, e))?;
    writer.flush().map_err(|e| io_error(path, e))
}

/// Deserialize the batch stored at `path`.
///
/// # Errors
/// - [`AgentError::TraceIo`] when the file cannot be opened.
/// - [`AgentError::InvalidTrace`] when its content is not a batch.
pub fn read_trace(path: &Path) -> AgentResult<ExperienceBatch> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| AgentError::InvalidTrace {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Trace files in `directory`, sorted by path.
///
/// # Errors
/// - [`AgentError::InvalidArgument`] if `directory` is not a directory.
/// - [`AgentError::TraceIo`] if it cannot be listed.
/// - [`AgentError::NoTraces`] if it holds no trace file.
pub fn list_traces(directory: &Path) -> AgentResult<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(AgentError::InvalidArgument {
            name: "directory".to_string(),
            value: directory.display().to_string(),
            hint: "is not a directory",
        });
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(directory).map_err(|e| io_error(directory, e))? {
        let path = entry.map_err(|e| io_error(directory, e))?.path();
        let is_trace = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(TRACE_PREFIX));
        if is_trace && path.is_file() {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(AgentError::NoTraces { directory: directory.display().to_string() });
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structured::Structured;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Write/read of a batch through a trace file.
    // - Directory listing: prefix filter, ordering and error cases.
    // -------------------------------------------------------------------------

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("rust_rlopt_traces_{tag}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    fn batch() -> ExperienceBatch {
        ExperienceBatch {
            states: Structured::from_pairs([("obs", array![[1.0, 2.0], [3.0, 4.0]].into_dyn())])
                .expect("unique"),
            internals: Structured::new(),
            auxiliaries: Structured::from_pairs([(
                "a/mask",
                array![[1.0, 1.0], [1.0, 0.0]].into_dyn(),
            )])
            .expect("unique"),
            actions: Structured::from_pairs([("a", array![1.0, 0.0].into_dyn())]).expect("unique"),
            terminal: array![0, 1],
            reward: array![0.5, -1.0],
        }
    }

    #[test]
    // Purpose
    // -------
    // A written trace reads back as the same batch.
    fn trace_file_preserves_batch() {
        let dir = scratch_dir("roundtrip");
        let path = dir.join("trace-000.json");

        write_trace(&path, &batch()).expect("write");
        let restored = read_trace(&path).expect("read");

        assert_eq!(restored, batch());
        fs::remove_dir_all(&dir).expect("cleanup");
    }

    #[test]
    // Purpose
    // -------
    // Only `trace-*` files are listed, in sorted order.
    fn listing_filters_and_sorts() {
        let dir = scratch_dir("listing");
        for name in ["trace-b.json", "notes.txt", "trace-a.json"] {
            fs::write(dir.join(name), "{}").expect("write");
        }

        let files = list_traces(&dir).expect("list");

        let names: Vec<_> =
            files.iter().filter_map(|p| p.file_name()?.to_str().map(str::to_string)).collect();
        assert_eq!(names, vec!["trace-a.json", "trace-b.json"]);
        fs::remove_dir_all(&dir).expect("cleanup");
    }

    #[test]
    // Purpose
    // -------
    // Missing directories, empty directories and malformed files fail with
    // dedicated errors.
    fn listing_and_reading_errors() {
        let dir = scratch_dir("errors");
        let missing = list_traces(&dir.join("absent"));
        let empty = list_traces(&dir);
        fs::write(dir.join("trace-bad.json"), "not json").expect("write");
        let malformed = read_trace(&dir.join("trace-bad.json"));

        assert!(matches!(missing, Err(AgentError::InvalidArgument { .. })));
        assert!(matches!(empty, Err(AgentError::NoTraces { .. })));
        assert!(matches!(malformed, Err(AgentError::InvalidTrace { .. })));
        fs::remove_dir_all(&dir).expect("cleanup");
    }
}
