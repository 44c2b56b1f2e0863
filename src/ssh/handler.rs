//! SSH connection handler

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use russh::keys::ssh_key::HashAlg;
use russh::server::{self, Msg, Session};
use russh::{Channel, ChannelId, CryptoVec, Pty};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ansi::KeyParser;
use crate::app;
use crate::config::Config;
use crate::program::{self, Message, PtyInfo};
use crate::ssh::session::SessionOutput;

/// Shown to sessions that open a shell without a terminal
const NO_PTY_MESSAGE: &str = "Requires an active PTY\n";

/// Terminal dimension from the wire, saturating at `u16::MAX`
fn dimension(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

/// Per-connection SSH handler
pub struct SshHandler {
    pub config: Arc<Config>,
    pub peer_addr: Option<SocketAddr>,
    pub session_id: Uuid,
    pub connected_at: Instant,
    pub user: Option<String>,
    /// SHA256 fingerprint of the authenticating key, if any
    pub key_fingerprint: Option<String>,
    pub pty: Option<PtyInfo>,
    parser: KeyParser,
    /// Sender into the running program, once a shell has started
    program: Option<mpsc::UnboundedSender<Message>>,
}

impl SshHandler {
    pub fn new(config: Arc<Config>, peer_addr: Option<SocketAddr>) -> Self {
        Self {
            config,
            peer_addr,
            session_id: Uuid::new_v4(),
            connected_at: Instant::now(),
            user: None,
            key_fingerprint: None,
            pty: None,
            parser: KeyParser::new(),
            program: None,
        }
    }

    /// Start the name prompt on `channel`, or refuse without a PTY
    fn start_program(&mut self, channel: ChannelId, session: &mut Session) {
        let Some(pty) = self.pty.clone() else {
            warn!(session = %self.session_id, peer = ?self.peer_addr, "no active terminal, closing");
            let _ = session.data(channel, CryptoVec::from(NO_PTY_MESSAGE.as_bytes()));
            let _ = session.exit_status_request(channel, 1);
            let _ = session.eof(channel);
            let _ = session.close(channel);
            return;
        };

        if self.program.is_some() {
            warn!(session = %self.session_id, "program already running");
            return;
        }

        info!(
            session = %self.session_id,
            user = self.user.as_deref().unwrap_or(""),
            peer = ?self.peer_addr,
            key = self.key_fingerprint.as_deref().unwrap_or("none"),
            term = %pty.term,
            width = pty.width,
            height = pty.height,
            "connect"
        );

        let (model, options) = app::session_entry(&self.config, &pty);
        let output = SessionOutput::new(session.handle(), channel);
        self.program = Some(program::spawn(
            model,
            options,
            output,
            (pty.width, pty.height),
        ));
    }

    /// Queue a message for the program. Never waits: the handler must keep
    /// polling the connection so the program's own writes can drain.
    fn send(&mut self, msg: Message) {
        let Some(ref tx) = self.program else {
            return;
        };
        if tx.send(msg).is_err() {
            // Program already quit
            self.program = None;
        }
    }
}

impl server::Handler for SshHandler {
    type Error = anyhow::Error;

    async fn auth_none(&mut self, user: &str) -> Result<server::Auth, Self::Error> {
        self.user = Some(user.to_string());
        Ok(server::Auth::Accept)
    }

    async fn auth_password(
        &mut self,
        user: &str,
        _password: &str,
    ) -> Result<server::Auth, Self::Error> {
        self.user = Some(user.to_string());
        Ok(server::Auth::Accept)
    }

    async fn auth_publickey_offered(
        &mut self,
        _user: &str,
        _key: &russh::keys::PublicKey,
    ) -> Result<server::Auth, Self::Error> {
        Ok(server::Auth::Accept)
    }

    async fn auth_publickey(
        &mut self,
        user: &str,
        key: &russh::keys::PublicKey,
    ) -> Result<server::Auth, Self::Error> {
        self.user = Some(user.to_string());
        self.key_fingerprint = Some(key.fingerprint(HashAlg::Sha256).to_string());
        Ok(server::Auth::Accept)
    }

    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        debug!(channel_id = ?channel.id(), "session channel opened");
        Ok(true)
    }

    async fn pty_request(
        &mut self,
        channel: ChannelId,
        term: &str,
        col_width: u32,
        row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(Pty, u32)],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.pty = Some(PtyInfo {
            term: term.to_string(),
            width: dimension(col_width),
            height: dimension(row_height),
        });
        let _ = session.channel_success(channel);
        Ok(())
    }

    async fn shell_request(
        &mut self,
        channel: ChannelId,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        let _ = session.channel_success(channel);
        self.start_program(channel, session);
        Ok(())
    }

    async fn exec_request(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        debug!(command = %String::from_utf8_lossy(data), "exec request, running prompt");
        let _ = session.channel_success(channel);
        self.start_program(channel, session);
        Ok(())
    }

    async fn data(
        &mut self,
        _channel: ChannelId,
        data: &[u8],
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        for key in self.parser.parse(data) {
            self.send(Message::Key(key));
        }
        Ok(())
    }

    async fn window_change_request(
        &mut self,
        _channel: ChannelId,
        col_width: u32,
        row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        let (width, height) = (dimension(col_width), dimension(row_height));
        if let Some(ref mut pty) = self.pty {
            pty.width = width;
            pty.height = height;
        }
        self.send(Message::Resize { width, height });
        Ok(())
    }

    async fn channel_close(
        &mut self,
        channel: ChannelId,
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        debug!(?channel, "channel closed");
        // Dropping the sender ends the program
        self.program = None;
        Ok(())
    }
}

impl Drop for SshHandler {
    fn drop(&mut self) {
        info!(
            session = %self.session_id,
            user = self.user.as_deref().unwrap_or(""),
            peer = ?self.peer_addr,
            duration = ?self.connected_at.elapsed(),
            "disconnect"
        );
    }
}
