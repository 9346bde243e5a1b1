//! JSON output for the CLI
//!
//! One JSON object per line on stdout.

use std::io::{self, Write};

use serde_json::Value;

use super::errors::CliResult;

fn write_line<W: Write>(writer: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn success(data: Value) -> Value {
    serde_json::json!({
        "status": "ok",
        "data": data
    })
}

fn failure(code: &str, message: &str) -> Value {
    serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

/// Write `result` as one response line
pub fn write_result<W: Write>(writer: &mut W, result: &CliResult<Value>) -> CliResult<()> {
    let line = match result {
        Ok(data) => success(data.clone()),
        Err(err) => failure(err.code_str(), err.message()),
    };
    write_line(writer, &line)
}

/// Write `result` to stdout
pub fn print_result(result: &CliResult<Value>) -> CliResult<()> {
    write_result(&mut io::stdout(), result)
}
