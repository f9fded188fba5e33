//! Capability port for the external minifier processes.
//!
//! The external tools are opaque command-line programs; only the invocation
//! contract lives here. Implementations shell out through
//! [`std::process::Command`], tests substitute fakes.

use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::{PipelineError, PipelineResult};
use crate::models::{OptimizationLevel, OutputFormatting};

/// Poll interval while waiting on a child process under a timeout.
const WAIT_POLL: Duration = Duration::from_millis(25);

/// Feedback captured from one external tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
  /// Exit status code, `-1` when the process was terminated by a signal.
  pub status: i32,
  /// Combined stdout and stderr text, trimmed.
  pub diagnostics: String,
}

/// An external minification tool invoked per combined package.
pub trait MinifierTool {
  /// Short tool name used in logs and errors.
  fn name(&self) -> &str;

  /// Configured location reported when the tool is unavailable.
  fn location(&self) -> PathBuf;

  /// Whether the tool can actually be run on this machine.
  fn is_available(&self) -> bool;

  /// Minify `input` into `output`. A non-zero exit status is an error;
  /// diagnostic output with a zero exit status is returned for the caller to
  /// surface as a warning.
  fn run(
    &self,
    input: &Path,
    output: &Path,
    level: OptimizationLevel,
  ) -> PipelineResult<ToolOutput>;

  /// Fail with [`PipelineError::ToolNotExecutable`] when the tool cannot run.
  fn ensure_available(&self) -> PipelineResult<()> {
    if self.is_available() {
      Ok(())
    } else {
      Err(PipelineError::ToolNotExecutable {
        name: self.name().to_string(),
        path: self.location(),
      })
    }
  }
}

/// Google Closure Compiler invoked as `java -jar compiler.jar`.
#[derive(Debug, Clone)]
pub struct ClosureCompiler {
  java: PathBuf,
  jar: PathBuf,
  timeout: Option<Duration>,
  formatting: Option<OutputFormatting>,
}

impl ClosureCompiler {
  /// Create a compiler invocation around the given java binary and jar.
  pub fn new(java: impl Into<PathBuf>, jar: impl Into<PathBuf>) -> Self {
    Self {
      java: java.into(),
      jar: jar.into(),
      timeout: None,
      formatting: None,
    }
  }

  /// Kill the compiler when it runs longer than `timeout`.
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  /// Request a specific output formatting from the compiler.
  pub fn with_formatting(mut self, formatting: OutputFormatting) -> Self {
    self.formatting = Some(formatting);
    self
  }
}

impl MinifierTool for ClosureCompiler {
  fn name(&self) -> &str {
    "closure-compiler"
  }

  fn location(&self) -> PathBuf {
    if self.jar.is_file() {
      self.java.clone()
    } else {
      self.jar.clone()
    }
  }

  fn is_available(&self) -> bool {
    self.jar.is_file() && java_runs(&self.java)
  }

  fn run(
    &self,
    input: &Path,
    output: &Path,
    level: OptimizationLevel,
  ) -> PipelineResult<ToolOutput> {
    let mut cmd = Command::new(&self.java);
    cmd
      .arg("-jar")
      .arg(&self.jar)
      .arg("--js_output_file")
      .arg(output)
      .arg("--compilation_level")
      .arg(level.flag());
    if let Some(formatting) = self.formatting {
      cmd.arg("--formatting").arg(formatting.flag());
    }
    cmd.arg("--js").arg(input);
    run_tool(self.name(), cmd, self.timeout)
  }
}

/// YUI Compressor invoked as `java -jar yuicompressor.jar`.
#[derive(Debug, Clone)]
pub struct YuiCompressor {
  java: PathBuf,
  jar: PathBuf,
  timeout: Option<Duration>,
}

impl YuiCompressor {
  /// Create a compressor invocation around the given java binary and jar.
  pub fn new(java: impl Into<PathBuf>, jar: impl Into<PathBuf>) -> Self {
    Self {
      java: java.into(),
      jar: jar.into(),
      timeout: None,
    }
  }

  /// Kill the compressor when it runs longer than `timeout`.
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }
}

impl MinifierTool for YuiCompressor {
  fn name(&self) -> &str {
    "yui-compressor"
  }

  fn location(&self) -> PathBuf {
    if self.jar.is_file() {
      self.java.clone()
    } else {
      self.jar.clone()
    }
  }

  fn is_available(&self) -> bool {
    self.jar.is_file() && java_runs(&self.java)
  }

  fn run(
    &self,
    input: &Path,
    output: &Path,
    _level: OptimizationLevel,
  ) -> PipelineResult<ToolOutput> {
    let mut cmd = Command::new(&self.java);
    cmd.arg("-jar").arg(&self.jar).arg("-o").arg(output).arg(input);
    run_tool(self.name(), cmd, self.timeout)
  }
}

/// Probe whether a java runtime answers `-version`.
fn java_runs(java: &Path) -> bool {
  Command::new(java)
    .arg("-version")
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .status()
    .map(|status| status.success())
    .unwrap_or(false)
}

/// Spawn the prepared command, capture its combined output and enforce the
/// optional timeout. Output is captured into unlinked temp files rather than
/// pipes so a chatty tool cannot deadlock against a full pipe buffer.
fn run_tool(
  name: &str,
  mut cmd: Command,
  timeout: Option<Duration>,
) -> PipelineResult<ToolOutput> {
  let mut stdout_capture = tempfile::tempfile()?;
  let mut stderr_capture = tempfile::tempfile()?;
  cmd
    .stdin(Stdio::null())
    .stdout(Stdio::from(stdout_capture.try_clone()?))
    .stderr(Stdio::from(stderr_capture.try_clone()?));

  let mut child = cmd.spawn()?;
  let status = match timeout {
    None => child.wait()?,
    Some(limit) => {
      let deadline = Instant::now() + limit;
      loop {
        if let Some(status) = child.try_wait()? {
          break status;
        }
        if Instant::now() >= deadline {
          let _ = child.kill();
          let _ = child.wait();
          return Err(PipelineError::Timeout {
            tool: name.to_string(),
            seconds: limit.as_secs(),
          });
        }
        std::thread::sleep(WAIT_POLL);
      }
    }
  };

  let mut diagnostics = String::new();
  for capture in [&mut stdout_capture, &mut stderr_capture] {
    capture.seek(SeekFrom::Start(0))?;
    capture.read_to_string(&mut diagnostics)?;
  }
  let diagnostics = diagnostics.trim().to_string();

  let code = status.code().unwrap_or(-1);
  if !status.success() {
    return Err(PipelineError::MinifierFailed {
      tool: name.to_string(),
      status: code,
      diagnostics,
    });
  }

  Ok(ToolOutput {
    status: code,
    diagnostics,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn availability_probe_does_not_panic() {
    let tool = ClosureCompiler::new("/usr/bin/java", "/nonexistent/compiler.jar");
    let _ = tool.is_available();
  }

  #[test]
  fn missing_jar_reports_tool_not_executable() {
    let tool = YuiCompressor::new("/usr/bin/java", "/nonexistent/yuicompressor.jar");
    let err = tool.ensure_available().unwrap_err();
    assert!(matches!(
      err,
      PipelineError::ToolNotExecutable { name, .. } if name == "yui-compressor"
    ));
  }

  #[cfg(unix)]
  #[test]
  fn zero_exit_with_output_is_returned_as_diagnostics() {
    let dir = tempdir().unwrap();
    // /bin/echo prints the jar arguments and exits 0, standing in for a tool
    // that emits warnings on stdout.
    let tool = ClosureCompiler::new("/bin/echo", dir.path().join("compiler.jar"));
    let out = tool
      .run(
        &dir.path().join("in.js"),
        &dir.path().join("out.js"),
        OptimizationLevel::SimpleOptimizations,
      )
      .unwrap();

    assert_eq!(out.status, 0);
    assert!(out.diagnostics.contains("--compilation_level SIMPLE_OPTIMIZATIONS"));
  }

  #[cfg(unix)]
  #[test]
  fn non_zero_exit_is_a_hard_failure() {
    let dir = tempdir().unwrap();
    let tool = YuiCompressor::new("/bin/false", dir.path().join("yuicompressor.jar"));
    let err = tool
      .run(
        &dir.path().join("in.css"),
        &dir.path().join("out.css"),
        OptimizationLevel::SimpleOptimizations,
      )
      .unwrap_err();

    assert!(matches!(
      err,
      PipelineError::MinifierFailed { tool, status, .. }
        if tool == "yui-compressor" && status == 1
    ));
  }

  #[cfg(unix)]
  #[test]
  fn hung_tool_is_killed_after_the_timeout() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let script = dir.path().join("slow-java.sh");
    std::fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let tool = ClosureCompiler::new(&script, dir.path().join("compiler.jar"))
      .with_timeout(Duration::from_millis(100));
    let started = Instant::now();
    let err = tool
      .run(
        &dir.path().join("in.js"),
        &dir.path().join("out.js"),
        OptimizationLevel::SimpleOptimizations,
      )
      .unwrap_err();

    assert!(matches!(err, PipelineError::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(4));
  }
}
