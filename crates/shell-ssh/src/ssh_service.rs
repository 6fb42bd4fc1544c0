use shell_core::error::ShellError;
use shell_core::node::Node;
use shell_core::remote::{wrap_command, CommandResult, RemoteCommand, RemoteCommandService, RemoteStatus};
use ssh2::Session;
use std::io::{ErrorKind, Read};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Extra time granted on top of a command's own timeout before the blocking
/// SSH call is abandoned.
const TIMEOUT_GRACE: Duration = Duration::from_secs(5);

/// Runs commands on SSH nodes: one session per command, key-file or agent
/// authentication, stdout and stderr captured together.
///
/// When a command outlives its timeout plus a grace period the TCP
/// connection is shut down, which ends the blocking session and closes the
/// remote channel.
#[derive(Debug, Clone)]
pub struct SshCommandService {
    grace: Duration,
}

impl SshCommandService {
    pub fn new() -> Self {
        Self {
            grace: TIMEOUT_GRACE,
        }
    }

    pub fn with_timeout_grace(grace: Duration) -> Self {
        Self { grace }
    }
}

impl Default for SshCommandService {
    fn default() -> Self {
        Self::new()
    }
}

/// Open the TCP connection to the node's SSH port.
fn open_tcp(node: &Node) -> Result<TcpStream, ShellError> {
    let host = node
        .host
        .as_deref()
        .ok_or_else(|| ShellError::Config(format!("SSH node '{}' requires 'host'", node.name)))?;
    let port = node.ssh_port();

    debug!("Connecting to {}:{}", host, port);
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|e| ShellError::SshConnection(format!("Resolve {}:{}: {}", host, port, e)))?
        .next()
        .ok_or_else(|| ShellError::SshConnection(format!("No address for {}:{}", host, port)))?;
    TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)
        .map_err(|e| ShellError::SshConnection(format!("TCP connect to {}:{}: {}", host, port, e)))
}

fn millis(d: Duration) -> u32 {
    u32::try_from(d.as_millis()).unwrap_or(u32::MAX)
}

/// Handshake and authenticate over `tcp`. The handshake is bounded by the
/// connect timeout; later blocking calls by the command timeout.
fn connect(node: &Node, tcp: TcpStream, timeout: Duration) -> Result<Session, ShellError> {
    let user = node
        .user
        .as_deref()
        .ok_or_else(|| ShellError::Config(format!("SSH node '{}' requires 'user'", node.name)))?;

    let mut sess = Session::new()
        .map_err(|e| ShellError::SshConnection(format!("Session::new: {}", e)))?;
    sess.set_tcp_stream(tcp);
    sess.set_timeout(millis(CONNECT_TIMEOUT));
    sess.handshake()
        .map_err(|e| ShellError::SshConnection(format!("Handshake: {}", e)))?;

    if let Some(key_file) = node.key_file() {
        sess.userauth_pubkey_file(user, None, &key_file, None)
            .map_err(|e| ShellError::SshConnection(format!("Pubkey auth: {}", e)))?;
    } else {
        sess.userauth_agent(user)
            .map_err(|e| ShellError::SshConnection(format!("Agent auth: {}", e)))?;
    }

    if !sess.authenticated() {
        return Err(ShellError::SshConnection("Authentication failed".into()));
    }

    sess.set_timeout(millis(timeout));
    info!("SSH connected to {}@{}", user, node);
    Ok(sess)
}

/// Execute a command on the remote host and collect its outcome.
fn exec_remote(sess: &Session, cmd: &str) -> Result<CommandResult, ShellError> {
    debug!("Remote exec: {}", cmd);
    let mut channel = sess
        .channel_session()
        .map_err(|e| ShellError::SshCommand(format!("Channel: {}", e)))?;
    if let Err(e) = channel.exec(cmd) {
        let io = std::io::Error::from(e);
        if io.kind() == ErrorKind::TimedOut {
            return Ok(CommandResult::new(RemoteStatus::Timeout, io.to_string()));
        }
        return Err(ShellError::SshCommand(format!("Exec: {}", io)));
    }

    let mut output = String::new();
    if let Err(e) = channel.read_to_string(&mut output) {
        if e.kind() == ErrorKind::TimedOut {
            return Ok(CommandResult::new(RemoteStatus::Timeout, output));
        }
        return Err(ShellError::SshCommand(format!("Read output: {}", e)));
    }

    let mut stderr = String::new();
    channel
        .stderr()
        .read_to_string(&mut stderr)
        .map_err(|e| ShellError::SshCommand(format!("Read stderr: {}", e)))?;

    channel.wait_close().ok();
    let exit_status = channel.exit_status().unwrap_or(-1);

    if exit_status != 0 && !stderr.is_empty() {
        debug!("Remote command stderr: {}", stderr.trim());
    }
    output.push_str(&stderr);

    let status = if exit_status == 0 {
        RemoteStatus::Completed
    } else {
        RemoteStatus::Failed
    };
    Ok(CommandResult::new(status, output))
}

#[async_trait::async_trait]
impl RemoteCommandService for SshCommandService {
    async fn execute_command(&self, command: &RemoteCommand) -> Result<CommandResult, ShellError> {
        let timeout = Duration::from_secs(command.timeout);
        let node = command.node.clone();
        let line = wrap_command(command);
        info!("Running '{}' on {}", command.name, node);

        let (control_tx, mut control_rx) = oneshot::channel::<TcpStream>();
        let task = tokio::task::spawn_blocking(move || {
            let tcp = open_tcp(&node)?;
            if let Ok(control) = tcp.try_clone() {
                let _ = control_tx.send(control);
            }
            let sess = connect(&node, tcp, timeout)?;
            exec_remote(&sess, &line)
        });

        match tokio::time::timeout(timeout + self.grace, task).await {
            Ok(joined) => joined.map_err(|e| ShellError::Process(format!("SSH worker: {}", e)))?,
            Err(_) => {
                warn!("'{}' on {} exceeded {}s", command.name, command.node, command.timeout);
                if let Ok(control) = control_rx.try_recv() {
                    if let Err(e) = control.shutdown(Shutdown::Both) {
                        debug!("Shutting down SSH connection to {}: {}", command.node, e);
                    }
                }
                Ok(CommandResult::new(
                    RemoteStatus::Timeout,
                    format!("command timed out after {}s", command.timeout),
                ))
            }
        }
    }
}
