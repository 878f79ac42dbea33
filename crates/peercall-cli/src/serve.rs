//! The demo server: the seven standard procedures wired to native
//! handlers.
//!
//! The business logic here is deliberately small (a feed session with
//! byte counters, the process environment, filesystem metadata) but
//! it is real enough that every procedure can be exercised end to end.

use std::os::unix::fs::MetadataExt;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use peercall_common::procs::{self, IoCounts, StatInfo};
use peercall_common::wire::Value;
use peercall_server::{DispatchTable, Server};

/// Byte counters for the text fed into this server instance.
///
/// The demo session echoes fed text into its own log, so input and
/// output advance together.
#[derive(Default)]
pub struct FeedSession {
    input: AtomicI32,
    output: AtomicI32,
}

impl FeedSession {
    fn feed(&self, text: &str) -> i32 {
        let len = text.len() as i32;
        self.input.fetch_add(len, Ordering::SeqCst);
        tracing::info!(text, "feed");
        self.output.fetch_add(len, Ordering::SeqCst);
        len
    }

    fn counts(&self) -> IoCounts {
        IoCounts {
            input: self.input.load(Ordering::SeqCst),
            output: self.output.load(Ordering::SeqCst),
        }
    }
}

fn str_arg(args: &[Value], index: usize) -> Result<&str, String> {
    args[index]
        .as_str()
        .ok_or_else(|| format!("argument {index} is not a string"))
}

/// Builds the dispatch table exporting the standard procedures.
pub fn standard_table() -> DispatchTable {
    let session = Arc::new(FeedSession::default());
    let mut table = DispatchTable::new();

    {
        let session = session.clone();
        table.register(&procs::COUNT, move |_| {
            Ok(Some(Value::Blob(session.counts().to_wire())))
        });
    }

    table.register(&procs::GETENV, |args| {
        let name = str_arg(args, 0)?;
        // an unset (or non-UTF-8) variable is the empty string, matching
        // the environment's own "not set" convention
        Ok(Some(Value::Str(std::env::var(name).unwrap_or_default())))
    });

    table.register(&procs::SETENV, |args| {
        let name = str_arg(args, 0)?;
        let value = str_arg(args, 1)?;
        if name.is_empty() || name.contains('=') {
            return Err(format!("invalid variable name '{name}'"));
        }
        std::env::set_var(name, value);
        Ok(Some(Value::I32(0)))
    });

    table.register(&procs::FEED, move |args| {
        let text = str_arg(args, 0)?;
        Ok(Some(Value::I32(session.feed(text))))
    });

    table.register(&procs::STRLEN, |args| {
        let s = str_arg(args, 0)?;
        Ok(Some(Value::I32(s.len() as i32)))
    });

    table.register(&procs::STRCAT, |args| {
        let a = str_arg(args, 0)?;
        let b = str_arg(args, 1)?;
        Ok(Some(Value::Str(format!("{a}{b}"))))
    });

    table.register(&procs::STAT, |args| {
        let path = str_arg(args, 0)?;
        let meta = std::fs::symlink_metadata(path).map_err(|e| format!("stat {path}: {e}"))?;
        let info = StatInfo {
            dev: meta.dev(),
            ino: meta.ino(),
            mode: meta.mode(),
            rdev: meta.rdev(),
            size: meta.size() as i64,
        };
        Ok(Some(Value::Blob(info.to_wire())))
    });

    table
}

/// Runs the demo server under `name` until interrupted.
pub fn run(name: &str) -> anyhow::Result<()> {
    let server = Server::new(name, standard_table());
    tracing::info!(name, "starting peercall server");
    server.run()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use peercall_common::protocol::{Request, Status};
    use peercall_common::wire;

    fn dispatch(table: &DispatchTable, desc: &wire::ProcedureDesc, args: &[Value]) -> Option<Value> {
        let request = Request::new(1, desc.name, wire::encode_args(desc, args).unwrap());
        let response = table.dispatch(&request);
        assert_eq!(response.status, Status::Ok, "dispatch failed");
        wire::decode_result(desc, &response.payload).unwrap()
    }

    #[test]
    fn test_table_exports_every_standard_procedure() {
        let table = standard_table();
        assert_eq!(table.len(), procs::ALL.len());
    }

    #[test]
    fn test_strlen_and_strcat() {
        let table = standard_table();
        let result = dispatch(&table, &procs::STRLEN, &[Value::Str("foo".into())]);
        assert_eq!(result, Some(Value::I32(3)));

        let result = dispatch(
            &table,
            &procs::STRCAT,
            &[Value::Str("foo".into()), Value::Str("bar".into())],
        );
        assert_eq!(result, Some(Value::Str("foobar".into())));
    }

    #[test]
    fn test_feed_advances_counters() {
        let table = standard_table();
        let result = dispatch(&table, &procs::FEED, &[Value::Str("abcde".into())]);
        assert_eq!(result, Some(Value::I32(5)));

        let result = dispatch(&table, &procs::COUNT, &[]);
        let Some(Value::Blob(bytes)) = result else {
            panic!("count returned {result:?}");
        };
        let counts = IoCounts::from_wire(&bytes).unwrap();
        assert_eq!(counts.input, 5);
        assert_eq!(counts.output, 5);
    }

    #[test]
    fn test_getenv_of_unset_name_is_empty() {
        let table = standard_table();
        let result = dispatch(
            &table,
            &procs::GETENV,
            &[Value::Str("PEERCALL_SERVE_TEST_UNSET".into())],
        );
        assert_eq!(result, Some(Value::Str(String::new())));
    }

    #[test]
    fn test_setenv_then_getenv() {
        let table = standard_table();
        let result = dispatch(
            &table,
            &procs::SETENV,
            &[
                Value::Str("PEERCALL_SERVE_TEST_SET".into()),
                Value::Str("42".into()),
            ],
        );
        assert_eq!(result, Some(Value::I32(0)));

        let result = dispatch(
            &table,
            &procs::GETENV,
            &[Value::Str("PEERCALL_SERVE_TEST_SET".into())],
        );
        assert_eq!(result, Some(Value::Str("42".into())));
    }

    #[test]
    fn test_setenv_rejects_bad_names() {
        let table = standard_table();
        let request = Request::new(
            1,
            procs::SETENV.name,
            wire::encode_args(
                &procs::SETENV,
                &[Value::Str("A=B".into()), Value::Str("x".into())],
            )
            .unwrap(),
        );
        let response = table.dispatch(&request);
        assert!(!response.is_ok());
    }

    #[test]
    fn test_stat_on_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe");
        std::fs::write(&path, b"12345").unwrap();

        let table = standard_table();
        let result = dispatch(
            &table,
            &procs::STAT,
            &[Value::Str(path.to_string_lossy().into_owned())],
        );
        let Some(Value::Blob(bytes)) = result else {
            panic!("stat returned {result:?}");
        };
        let info = StatInfo::from_wire(&bytes).unwrap();
        assert_eq!(info.size, 5);
        assert_ne!(info.ino, 0);
    }

    #[test]
    fn test_stat_of_missing_path_is_a_handler_error() {
        let table = standard_table();
        let request = Request::new(
            1,
            procs::STAT.name,
            wire::encode_args(
                &procs::STAT,
                &[Value::Str("/definitely/not/here".into())],
            )
            .unwrap(),
        );
        let response = table.dispatch(&request);
        assert!(!response.is_ok());
    }
}
