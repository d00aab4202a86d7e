// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

pub mod error;
pub mod http;

use snafu::Snafu;
use tokio::{sync::oneshot::Receiver, task::JoinHandle};
use tokio_util::sync::CancellationToken;

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(transparent)]
    Network { source: NetworkError },
}

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum NetworkError {
    #[snafu(display("Failed to parse address {addr}"))]
    ParseAddressError {
        addr: String,
        #[snafu(source)]
        source: std::net::AddrParseError,
    },
}

type Result<T> = std::result::Result<T, Error>;

/// Handle for the running control-API server.
///
/// Lets a caller wait for the listener to come up, signal a graceful
/// shutdown, and wait for the serve task to actually exit.
pub struct ServiceHandler {
    join_handle: JoinHandle<()>,
    cancellation_token: CancellationToken,
    started_rx: Option<Receiver<()>>,
}

impl ServiceHandler {
    /// Blocks until the server has bound its address and is accepting
    /// connections.
    ///
    /// # Panics
    /// Panics if called more than once; the start signal is consumed.
    pub async fn wait_for_start(&mut self) -> Result<()> {
        self.started_rx
            .take()
            .expect("server start signal already consumed")
            .await
            .expect("failed to receive server start signal");
        Ok(())
    }

    /// Consumes the handle and blocks until the server task has exited.
    pub async fn wait_for_stop(self) -> Result<()> {
        let _ = self.join_handle.await;
        Ok(())
    }

    /// Requests a graceful shutdown without waiting for it to complete.
    pub fn shutdown(&self) { self.cancellation_token.cancel(); }

    pub fn is_finished(&self) -> bool { self.join_handle.is_finished() }
}
