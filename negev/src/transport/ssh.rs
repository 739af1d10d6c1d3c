//! SSH transport implementation using russh.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use russh::client::{self, Handle, Msg};
use russh::keys::PublicKey;
use russh::{Channel, ChannelMsg};
use secrecy::ExposeSecret;

use super::Transport;
use super::config::ConnectionConfig;
use crate::error::{Result, TransportError};

/// SSH transport wrapping a russh client and one interactive shell channel.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// PTY shell channel.
    channel: Channel<Msg>,
}

impl SshTransport {
    /// Connect, authenticate with a password and open a PTY shell.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        debug!("Dialing ssh {}", config.socket_addr());

        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: None,
            ..Default::default()
        });

        let mut session = tokio::time::timeout(
            config.timeout,
            client::connect(ssh_config, (config.host.as_str(), config.port), SshHandler),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(TransportError::Ssh)?;

        let success = session
            .authenticate_password(&config.username, config.password.expose_secret())
            .await
            .map_err(TransportError::Ssh)?
            .success();
        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        let channel = Self::open_shell(&session, config).await?;
        Ok(Self { session, channel })
    }

    async fn open_shell(
        session: &Handle<SshHandler>,
        config: &ConnectionConfig,
    ) -> Result<Channel<Msg>> {
        let channel = session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_pty(
                true,
                "vt100",
                config.terminal_width,
                config.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        Ok(channel)
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.channel.data(data).await.map_err(TransportError::Ssh)?;
        Ok(())
    }

    async fn read_chunk(&mut self, poll: Duration) -> Result<Option<Vec<u8>>> {
        match tokio::time::timeout(poll, self.channel.wait()).await {
            Err(_) => Ok(None),
            Ok(Some(ChannelMsg::Data { data })) => Ok(Some(data.to_vec())),
            Ok(Some(ChannelMsg::ExtendedData { data, .. })) => Ok(Some(data.to_vec())),
            Ok(Some(ChannelMsg::Eof | ChannelMsg::Close)) | Ok(None) => {
                Err(TransportError::Disconnected.into())
            }
            // window adjustments, exit status and the like
            Ok(Some(_)) => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<()> {
        let _ = self.channel.eof().await;
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// SSH client handler. Switch host keys are accepted without verification.
struct SshHandler;

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        Ok(true)
    }
}
