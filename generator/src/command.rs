//! Running external programs (`dot`, `git`).
//!
//! Everything goes through [`CommandRunner`] so the converters and the git
//! snapshot can be exercised in tests without the real binaries.

use std::{
    ffi::OsString,
    fmt, io,
    io::Write as _,
    path::PathBuf,
    process::{Command, Stdio},
    thread,
};

use anyhow::Context as _;

/// A fully described invocation of an external program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cmd {
    pub program: OsString,
    pub args: Vec<OsString>,
    /// Added on top of the inherited environment of this child only.
    pub envs: Vec<(OsString, OsString)>,
    pub current_dir: Option<PathBuf>,
    pub stdin: Option<Vec<u8>>,
}

impl Cmd {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn stdin(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(data.into());
        self
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Run a program to completion and hand back its stdout.
///
/// A program that cannot be started or exits unsuccessfully is an error.
pub trait CommandRunner {
    fn run(&self, cmd: &Cmd) -> anyhow::Result<Vec<u8>>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, cmd: &Cmd) -> anyhow::Result<Vec<u8>> {
        (**self).run(cmd)
    }
}

/// Spawns real processes. Stderr goes straight to our own stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &Cmd) -> anyhow::Result<Vec<u8>> {
        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .envs(cmd.envs.iter().map(|(k, v)| (k, v)))
            .stdin(if cmd.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(dir) = &cmd.current_dir {
            command.current_dir(dir);
        }

        log::debug!("run: {cmd}");
        let mut child = command
            .spawn()
            .with_context(|| format!("failed to start `{cmd}`"))?;

        // stdin is fed from a scoped thread while stdout is drained here,
        // otherwise a child filling its stdout pipe would never finish reading
        let (output, fed) = thread::scope(|scope| {
            let feeder = child.stdin.take().map(|mut pipe| {
                let data = cmd.stdin.as_deref().unwrap_or_default();
                scope.spawn(move || pipe.write_all(data))
            });

            let output = child.wait_with_output();
            let fed = feeder.map_or(Ok(()), |feeder| {
                feeder
                    .join()
                    .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")))
            });

            (output, fed)
        });

        let output = output.with_context(|| format!("failed to wait for `{cmd}`"))?;
        if !output.status.success() {
            anyhow::bail!("`{cmd}` failed: {}", output.status);
        }
        fed.with_context(|| format!("failed to write stdin of `{cmd}`"))?;

        Ok(output.stdout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OneLineError {
    #[error("must not be empty")]
    Empty,
    #[error("must end in newline: {0:?}")]
    MissingNewline(String),
    #[error("must be a single line: {0:?}")]
    MultipleLines(String),
}

/// Parse program output that must be exactly one newline-terminated line.
pub fn one_line(output: &[u8]) -> Result<String, OneLineError> {
    let text = String::from_utf8_lossy(output);

    let Some(line) = text.strip_suffix('\n') else {
        return Err(if text.is_empty() {
            OneLineError::Empty
        } else {
            OneLineError::MissingNewline(text.into_owned())
        });
    };

    if line.contains('\n') {
        return Err(OneLineError::MultipleLines(line.to_string()));
    }

    Ok(line.to_string())
}
