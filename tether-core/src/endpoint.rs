//! Execution endpoints and the transports that reach them.
//!
//! An [`Endpoint`] is constructed once at session start and never mutated:
//! the home directory, operating-system family, and absolutized sync root
//! are all resolved up front so that later phases never deal with relative
//! or tilde-prefixed paths.
//!
//! Commands run through [`Endpoint::run`] (non-zero exit is an error) or
//! [`Endpoint::run_unchecked`] (exit status returned as data). Long-running
//! processes such as daemons, tunnels, and watch pipes go through
//! [`Endpoint::spawn`], which hands back the child with kill-on-drop set.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::address::RemoteAddress;
use crate::error::{io_err, CoreError};

// ---------------------------------------------------------------------------
// Roles and probe results
// ---------------------------------------------------------------------------

/// Which side of the session an endpoint plays. The role is independent of
/// how the endpoint is reached, so tests can stand up a locally-reachable
/// endpoint in the remote role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointId {
    Local,
    Remote,
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointId::Local => write!(f, "local"),
            EndpointId::Remote => write!(f, "remote"),
        }
    }
}

/// Operating-system family of an endpoint. Locally taken from the build
/// target, remotely probed with `uname -s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Linux,
    Darwin,
}

/// Result of probing a path ahead of a destructive operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirState {
    Missing,
    EmptyDir,
    NonEmptyDir,
    NotADirectory,
}

/// How remote commands reach the other host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    /// One ssh connection per command. Requires non-interactive
    /// authentication (keys or an agent).
    Plain,
    /// A shared ControlMaster connection, authenticated once at session
    /// start and reused by every subsequent command.
    #[default]
    Multiplex,
}

/// Connection options for [`Endpoint::remote`].
#[derive(Debug, Clone, Default)]
pub struct SshOptions {
    pub transport: TransportKind,
    pub identity: Option<PathBuf>,
}

/// Output of a tolerant command run.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub status: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

// ---------------------------------------------------------------------------
// Shell helpers
// ---------------------------------------------------------------------------

/// Quote a single argument for a POSIX shell. Plain words pass through
/// untouched so remote command lines stay readable in logs.
pub(crate) fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg.bytes().all(|b| {
            b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'/' | b':' | b'=' | b'@' | b'%' | b'+' | b',')
        });
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

pub(crate) fn shell_join(argv: &[&str]) -> String {
    argv.iter()
        .map(|a| shell_quote(a))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the script a remote endpoint executes for one command: an optional
/// PATH extension for Homebrew installs, an optional `cd`, then the command.
fn command_script(os: OsFamily, dir: Option<&Path>, argv: &[&str]) -> String {
    let mut parts = Vec::new();
    if os == OsFamily::Darwin {
        parts.push(r#"export PATH="$PATH:/usr/local/bin""#.to_string());
    }
    if let Some(dir) = dir {
        parts.push(format!("cd {}", shell_quote(&dir.display().to_string())));
    }
    parts.push(shell_join(argv));
    parts.join(" && ")
}

// ---------------------------------------------------------------------------
// Transports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct SshTransport {
    target: String,
    identity: Option<PathBuf>,
    control_socket: Option<PathBuf>,
}

impl SshTransport {
    /// ssh arguments shared by every connection in this session, suitable
    /// for `rsync -e` as well as direct invocation.
    fn base_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(identity) = &self.identity {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        if let Some(socket) = &self.control_socket {
            args.push("-S".to_string());
            args.push(socket.display().to_string());
        }
        args
    }

    fn command(&self, script: &str) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.args(self.base_args());
        cmd.arg(&self.target);
        cmd.arg(script);
        cmd.stdin(Stdio::null());
        cmd
    }

    /// Start the ControlMaster connection. stdio is inherited so the one
    /// authentication this session performs can prompt the user.
    async fn start_master(&self, socket: &Path) -> Result<(), CoreError> {
        let mut cmd = Command::new("ssh");
        if let Some(identity) = &self.identity {
            cmd.arg("-i").arg(identity);
        }
        cmd.args(["-M", "-N", "-f", "-S"]);
        cmd.arg(socket);
        cmd.arg(&self.target);
        let status = cmd
            .status()
            .await
            .map_err(|e| io_err("ssh control master", e))?;
        if !status.success() {
            return Err(CoreError::CommandFailed {
                endpoint: self.target.clone(),
                command: "ssh -M -N -f".to_string(),
                status: status.code().unwrap_or(-1),
                stderr: "control master did not start".to_string(),
            });
        }
        debug!(target = %self.target, socket = %socket.display(), "ssh control master up");
        Ok(())
    }

    /// Ask the master to exit. Best effort; a dead master is already what
    /// we want.
    async fn stop_master(&self, socket: &Path) {
        let mut cmd = Command::new("ssh");
        cmd.arg("-S").arg(socket);
        cmd.args(["-O", "exit"]);
        cmd.arg(&self.target);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
        match cmd.status().await {
            Ok(status) if status.success() => {
                debug!(target = %self.target, "ssh control master stopped")
            }
            Ok(status) => {
                warn!(target = %self.target, ?status, "ssh control master did not stop cleanly")
            }
            Err(e) => warn!(target = %self.target, error = %e, "failed to signal ssh control master"),
        }
    }
}

#[derive(Debug, Clone)]
enum Transport {
    Local,
    Ssh(SshTransport),
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Endpoint {
    role: EndpointId,
    name: String,
    os: OsFamily,
    home: PathBuf,
    sync_root: PathBuf,
    transport: Transport,
}

impl Endpoint {
    /// Endpoint on this machine, with state under the real home directory.
    pub fn local(role: EndpointId, sync_path: &Path) -> Result<Self, CoreError> {
        let home = dirs::home_dir().ok_or(CoreError::HomeNotFound)?;
        Self::local_at(role, sync_path, home)
    }

    /// Endpoint on this machine with an explicit home directory. Tests use
    /// this to keep builder and config state inside a temporary directory.
    pub fn local_at(role: EndpointId, sync_path: &Path, home: PathBuf) -> Result<Self, CoreError> {
        let os = match std::env::consts::OS {
            "linux" => OsFamily::Linux,
            "macos" => OsFamily::Darwin,
            other => {
                return Err(CoreError::UnsupportedOs {
                    endpoint: "localhost".to_string(),
                    uname: other.to_string(),
                })
            }
        };
        let sync_root = if sync_path.is_absolute() {
            sync_path.to_path_buf()
        } else {
            let cwd = std::env::current_dir().map_err(|e| io_err("current dir", e))?;
            cwd.join(sync_path)
        };
        Ok(Self {
            role,
            name: "localhost".to_string(),
            os,
            home,
            sync_root,
            transport: Transport::Local,
        })
    }

    /// Endpoint reached over ssh. Starts the control master when the
    /// multiplex transport is selected, then resolves the remote home
    /// directory and OS family so every later command is absolute and
    /// non-interactive.
    pub async fn remote(address: &RemoteAddress, options: SshOptions) -> Result<Self, CoreError> {
        let control_socket = match options.transport {
            TransportKind::Plain => None,
            TransportKind::Multiplex => Some(std::env::temp_dir().join(format!(
                "tether-{}-{}.ssh",
                std::process::id(),
                address.host
            ))),
        };
        let ssh = SshTransport {
            target: address.ssh_target(),
            identity: options.identity,
            control_socket,
        };
        if let Some(socket) = &ssh.control_socket {
            ssh.start_master(socket).await?;
        }

        let home_out = run_transport(&ssh, &address.host, "pwd", "pwd").await?;
        let home = PathBuf::from(home_out.trim());
        let uname_out = run_transport(&ssh, &address.host, "uname -s", "uname -s").await?;
        let os = match uname_out.trim() {
            "Linux" => OsFamily::Linux,
            "Darwin" => OsFamily::Darwin,
            other => {
                return Err(CoreError::UnsupportedOs {
                    endpoint: address.host.clone(),
                    uname: other.to_string(),
                })
            }
        };
        let sync_root = resolve_remote_path(&address.path, &home);
        debug!(host = %address.host, home = %home.display(), ?os, "remote endpoint ready");
        Ok(Self {
            role: EndpointId::Remote,
            name: address.host.clone(),
            os,
            home,
            sync_root,
            transport: Transport::Ssh(ssh),
        })
    }

    pub fn role(&self) -> EndpointId {
        self.role
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn os(&self) -> OsFamily {
        self.os
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn sync_root(&self) -> &Path {
        &self.sync_root
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.transport, Transport::Ssh(_))
    }

    /// `host:path` label used in log lines and error messages.
    pub fn label(&self) -> String {
        format!("{}:{}", self.name, self.sync_root.display())
    }

    /// ssh invocation (program plus arguments) that reaches this endpoint,
    /// or `None` for a local endpoint. rsync receives this as its remote
    /// shell so transfers share the session's control master.
    pub fn ssh_invocation(&self) -> Option<Vec<String>> {
        match &self.transport {
            Transport::Local => None,
            Transport::Ssh(ssh) => {
                let mut args = vec!["ssh".to_string()];
                args.extend(ssh.base_args());
                Some(args)
            }
        }
    }

    /// ssh destination (`user@host`), or `None` for a local endpoint.
    pub fn ssh_target(&self) -> Option<&str> {
        match &self.transport {
            Transport::Local => None,
            Transport::Ssh(ssh) => Some(&ssh.target),
        }
    }

    /// Run a command and require success. Returns captured stdout.
    pub async fn run(&self, dir: Option<&Path>, argv: &[&str]) -> Result<String, CoreError> {
        let output = self.output(dir, argv).await?;
        let status = output.status.code().unwrap_or(-1);
        if !output.status.success() {
            return Err(CoreError::CommandFailed {
                endpoint: self.name.clone(),
                command: argv.join(" "),
                status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run a command whose failure is part of the protocol. Spawn errors
    /// still surface; a non-zero exit comes back as data.
    pub async fn run_unchecked(
        &self,
        dir: Option<&Path>,
        argv: &[&str],
    ) -> Result<CommandOutput, CoreError> {
        let output = self.output(dir, argv).await?;
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            status: output.status.code().unwrap_or(-1),
        })
    }

    /// Start a long-running process on this endpoint. stdout is piped so
    /// callers can stream it; the child is killed when dropped.
    pub fn spawn(&self, dir: Option<&Path>, argv: &[&str]) -> Result<Child, CoreError> {
        let mut cmd = match &self.transport {
            Transport::Local => self.local_command(dir, argv),
            Transport::Ssh(ssh) => ssh.command(&command_script(self.os, dir, argv)),
        };
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::null());
        cmd.kill_on_drop(true);
        cmd.spawn().map_err(|e| io_err(argv[0], e))
    }

    pub async fn path_exists(&self, path: &Path) -> Result<bool, CoreError> {
        match &self.transport {
            Transport::Local => tokio::fs::try_exists(path)
                .await
                .map_err(|e| io_err(path, e)),
            Transport::Ssh(_) => {
                let path = path.display().to_string();
                let out = self.run_unchecked(None, &["test", "-e", &path]).await?;
                Ok(out.success())
            }
        }
    }

    /// Probe a path without touching it. One round trip on a remote
    /// endpoint.
    pub async fn dir_state(&self, path: &Path) -> Result<DirState, CoreError> {
        match &self.transport {
            Transport::Local => {
                let meta = match tokio::fs::metadata(path).await {
                    Ok(meta) => meta,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        return Ok(DirState::Missing)
                    }
                    Err(e) => return Err(io_err(path, e)),
                };
                if !meta.is_dir() {
                    return Ok(DirState::NotADirectory);
                }
                let mut entries = tokio::fs::read_dir(path).await.map_err(|e| io_err(path, e))?;
                match entries.next_entry().await.map_err(|e| io_err(path, e))? {
                    Some(_) => Ok(DirState::NonEmptyDir),
                    None => Ok(DirState::EmptyDir),
                }
            }
            Transport::Ssh(ssh) => {
                let q = shell_quote(&path.display().to_string());
                let script = format!(
                    "if [ ! -e {q} ]; then echo missing; \
                     elif [ ! -d {q} ]; then echo not-a-directory; \
                     elif [ -n \"$(ls -A {q})\" ]; then echo non-empty; \
                     else echo empty; fi"
                );
                let out = run_transport(ssh, &self.name, "dir-state probe", &script).await?;
                match out.trim() {
                    "missing" => Ok(DirState::Missing),
                    "not-a-directory" => Ok(DirState::NotADirectory),
                    "non-empty" => Ok(DirState::NonEmptyDir),
                    "empty" => Ok(DirState::EmptyDir),
                    other => Err(CoreError::CommandFailed {
                        endpoint: self.name.clone(),
                        command: "dir-state probe".to_string(),
                        status: 0,
                        stderr: format!("unexpected probe output `{other}`"),
                    }),
                }
            }
        }
    }

    /// Environment the endpoint's commands observe. On Darwin the PATH
    /// carries the same `/usr/local/bin` extension that command scripts
    /// export.
    pub async fn environment(&self) -> Result<HashMap<String, String>, CoreError> {
        let mut env = match &self.transport {
            Transport::Local => std::env::vars().collect(),
            Transport::Ssh(ssh) => parse_env(&run_transport(ssh, &self.name, "env", "env").await?),
        };
        if self.os == OsFamily::Darwin {
            let path = env.get("PATH").cloned().unwrap_or_default();
            env.insert("PATH".to_string(), format!("{path}:/usr/local/bin"));
        }
        Ok(env)
    }

    pub async fn make_dir_all(&self, path: &Path) -> Result<(), CoreError> {
        match &self.transport {
            Transport::Local => tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| io_err(path, e)),
            Transport::Ssh(_) => {
                let path = path.display().to_string();
                self.run(None, &["mkdir", "-p", &path]).await?;
                Ok(())
            }
        }
    }

    /// Write a small file on this endpoint, replacing any existing content.
    /// The file always ends with exactly one newline, whichever transport
    /// carries it. Remote writes go through a quoted heredoc so the content
    /// needs no escaping.
    pub async fn write_file(&self, path: &Path, contents: &str) -> Result<(), CoreError> {
        let body = format!("{}\n", contents.trim_end_matches('\n'));
        match &self.transport {
            Transport::Local => tokio::fs::write(path, &body)
                .await
                .map_err(|e| io_err(path, e)),
            Transport::Ssh(ssh) => {
                let q = shell_quote(&path.display().to_string());
                let script = format!("cat > {q} <<'TETHER_EOF'\n{body}TETHER_EOF");
                run_transport(ssh, &self.name, "write file", &script).await?;
                Ok(())
            }
        }
    }

    /// Tear down session-scoped transport state (the ssh control master).
    pub async fn close(&self) {
        if let Transport::Ssh(ssh) = &self.transport {
            if let Some(socket) = &ssh.control_socket {
                ssh.stop_master(socket).await;
            }
        }
    }

    fn local_command(&self, dir: Option<&Path>, argv: &[&str]) -> Command {
        let mut cmd = Command::new(argv[0]);
        cmd.args(&argv[1..]);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        if self.os == OsFamily::Darwin {
            if let Ok(path) = std::env::var("PATH") {
                cmd.env("PATH", format!("{path}:/usr/local/bin"));
            }
        }
        cmd.stdin(Stdio::null());
        cmd
    }

    async fn output(
        &self,
        dir: Option<&Path>,
        argv: &[&str],
    ) -> Result<std::process::Output, CoreError> {
        debug!(endpoint = %self.name, command = %argv.join(" "), "run");
        let mut cmd = match &self.transport {
            Transport::Local => self.local_command(dir, argv),
            Transport::Ssh(ssh) => ssh.command(&command_script(self.os, dir, argv)),
        };
        cmd.output().await.map_err(|e| io_err(argv[0], e))
    }
}

/// Run a raw script over a transport before or outside an `Endpoint`.
/// Endpoint construction needs this for the `pwd` and `uname` probes.
async fn run_transport(
    ssh: &SshTransport,
    endpoint: &str,
    command_label: &str,
    script: &str,
) -> Result<String, CoreError> {
    let output = ssh
        .command(script)
        .output()
        .await
        .map_err(|e| io_err("ssh", e))?;
    if !output.status.success() {
        return Err(CoreError::CommandFailed {
            endpoint: endpoint.to_string(),
            command: command_label.to_string(),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse `env` output into pairs. Values containing newlines are not
/// handled.
fn parse_env(raw: &str) -> HashMap<String, String> {
    raw.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Absolutize a remote sync path against the remote home directory.
/// `~` and `~/...` are expanded here because no shell will see the path
/// again once it is embedded in quoted scripts.
fn resolve_remote_path(path: &str, home: &Path) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest)
    } else if path == "~" {
        home.to_path_buf()
    } else if path.starts_with('/') {
        PathBuf::from(path)
    } else {
        home.join(path)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    #[rstest]
    #[case("plain-word", "plain-word")]
    #[case("/abs/path/file.txt", "/abs/path/file.txt")]
    #[case("has space", "'has space'")]
    #[case("semi;colon", "'semi;colon'")]
    #[case("don't", r"'don'\''t'")]
    #[case("", "''")]
    fn quoting_covers_shell_metacharacters(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(shell_quote(input), expected);
    }

    #[test]
    fn command_script_prefixes_cd_and_quotes_arguments() {
        let script = command_script(
            OsFamily::Linux,
            Some(Path::new("/srv/my project")),
            &["tgit", "commit", "-m", "auto commit"],
        );
        assert_eq!(script, "cd '/srv/my project' && tgit commit -m 'auto commit'");
    }

    #[test]
    fn command_script_extends_path_on_darwin() {
        let script = command_script(OsFamily::Darwin, None, &["tgit", "version"]);
        assert!(script.starts_with(r#"export PATH="$PATH:/usr/local/bin" && "#));
        assert!(script.ends_with("tgit version"));
    }

    #[rstest]
    #[case("~/projects/app", "/home/bob/projects/app")]
    #[case("~", "/home/bob")]
    #[case("projects/app", "/home/bob/projects/app")]
    #[case("/srv/data", "/srv/data")]
    fn remote_paths_resolve_against_home(#[case] input: &str, #[case] expected: &str) {
        let home = Path::new("/home/bob");
        assert_eq!(resolve_remote_path(input, home), Path::new(expected));
    }

    #[tokio::test]
    async fn local_endpoint_runs_commands_and_captures_stdout() {
        let home = TempDir::new().expect("tempdir");
        let ep = Endpoint::local_at(
            EndpointId::Local,
            home.path(),
            home.path().to_path_buf(),
        )
        .expect("local endpoint");
        let out = ep.run(None, &["echo", "hello"]).await.expect("echo runs");
        assert_eq!(out.trim(), "hello");
    }

    #[tokio::test]
    async fn run_reports_failures_with_stderr() {
        let home = TempDir::new().expect("tempdir");
        let ep = Endpoint::local_at(
            EndpointId::Local,
            home.path(),
            home.path().to_path_buf(),
        )
        .expect("local endpoint");
        let err = ep
            .run(None, &["ls", "/definitely/not/a/path"])
            .await
            .unwrap_err();
        match err {
            CoreError::CommandFailed { status, stderr, .. } => {
                assert_ne!(status, 0);
                assert!(!stderr.is_empty());
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_unchecked_returns_nonzero_exit_as_data() {
        let home = TempDir::new().expect("tempdir");
        let ep = Endpoint::local_at(
            EndpointId::Local,
            home.path(),
            home.path().to_path_buf(),
        )
        .expect("local endpoint");
        let out = ep
            .run_unchecked(None, &["test", "-e", "/definitely/not/a/path"])
            .await
            .expect("spawn succeeds");
        assert!(!out.success());
    }

    #[tokio::test]
    async fn dir_state_distinguishes_the_four_cases() {
        let home = TempDir::new().expect("tempdir");
        let ep = Endpoint::local_at(
            EndpointId::Local,
            home.path(),
            home.path().to_path_buf(),
        )
        .expect("local endpoint");

        let missing = home.path().join("missing");
        assert_eq!(ep.dir_state(&missing).await.expect("probe"), DirState::Missing);

        let empty = home.path().join("empty");
        std::fs::create_dir(&empty).expect("mkdir");
        assert_eq!(ep.dir_state(&empty).await.expect("probe"), DirState::EmptyDir);

        let full = home.path().join("full");
        std::fs::create_dir(&full).expect("mkdir");
        std::fs::write(full.join("f"), "x").expect("write");
        assert_eq!(ep.dir_state(&full).await.expect("probe"), DirState::NonEmptyDir);

        let file = home.path().join("file");
        std::fs::write(&file, "x").expect("write");
        assert_eq!(
            ep.dir_state(&file).await.expect("probe"),
            DirState::NotADirectory
        );
    }

    #[tokio::test]
    async fn write_file_replaces_content() {
        let home = TempDir::new().expect("tempdir");
        let ep = Endpoint::local_at(
            EndpointId::Local,
            home.path(),
            home.path().to_path_buf(),
        )
        .expect("local endpoint");
        let target = home.path().join("notes.txt");
        ep.write_file(&target, "first").await.expect("write");
        ep.write_file(&target, "second").await.expect("rewrite");
        assert_eq!(std::fs::read_to_string(&target).expect("read"), "second\n");
    }

    #[tokio::test]
    async fn written_files_end_with_exactly_one_newline() {
        let home = TempDir::new().expect("tempdir");
        let ep = Endpoint::local_at(
            EndpointId::Local,
            home.path(),
            home.path().to_path_buf(),
        )
        .expect("local endpoint");
        let target = home.path().join("seed");

        ep.write_file(&target, "bare").await.expect("write");
        assert_eq!(std::fs::read_to_string(&target).expect("read"), "bare\n");

        ep.write_file(&target, "a\nb\n").await.expect("write");
        assert_eq!(std::fs::read_to_string(&target).expect("read"), "a\nb\n");
    }

    #[test]
    fn env_output_parses_into_pairs() {
        let parsed = parse_env("HOME=/home/bob\nPATH=/usr/bin:/bin\nEMPTY=\nnoequals\n");
        assert_eq!(parsed.get("HOME").map(String::as_str), Some("/home/bob"));
        assert_eq!(parsed.get("PATH").map(String::as_str), Some("/usr/bin:/bin"));
        assert_eq!(parsed.get("EMPTY").map(String::as_str), Some(""));
        assert!(!parsed.contains_key("noequals"));
    }

    #[tokio::test]
    async fn environment_exposes_the_process_env() {
        let home = TempDir::new().expect("tempdir");
        let ep = Endpoint::local_at(
            EndpointId::Local,
            home.path(),
            home.path().to_path_buf(),
        )
        .expect("local endpoint");
        let env = ep.environment().await.expect("environment");
        assert!(env.contains_key("PATH"));
    }

    #[test]
    fn relative_local_paths_are_absolutized() {
        let home = TempDir::new().expect("tempdir");
        let ep = Endpoint::local_at(
            EndpointId::Local,
            Path::new("some/rel/dir"),
            home.path().to_path_buf(),
        )
        .expect("local endpoint");
        assert!(ep.sync_root().is_absolute());
        assert!(ep.sync_root().ends_with("some/rel/dir"));
    }
}
