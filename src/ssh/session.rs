//! Program output over an SSH channel

use russh::server::Handle;
use russh::{ChannelId, CryptoVec};

use crate::program::Output;

/// Writes program frames to one session channel
pub struct SessionOutput {
    handle: Handle,
    channel: ChannelId,
}

impl SessionOutput {
    pub fn new(handle: Handle, channel: ChannelId) -> Self {
        Self { handle, channel }
    }
}

impl Output for SessionOutput {
    async fn write(&mut self, data: &[u8]) -> bool {
        self.handle
            .data(self.channel, CryptoVec::from(data))
            .await
            .is_ok()
    }

    async fn exit(&mut self, status: u32) {
        let _ = self.handle.exit_status_request(self.channel, status).await;
        let _ = self.handle.eof(self.channel).await;
        let _ = self.handle.close(self.channel).await;
    }
}
