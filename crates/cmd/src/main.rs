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

mod build_info;
mod master;
mod shutdown;
mod worker;

use clap::{Args, Parser, Subcommand};
use cronmesh_config::Config;
use cronmesh_telemetry::{LoggingOptions, init_logging, set_panic_hook};
use snafu::{ResultExt, Whatever};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[clap(name = "cronmesh", about = "cronmesh distributed job scheduler", author = build_info::AUTHOR, version = build_info::FULL_VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the master: job registry, worker directory, and the control API.
    Master(MasterArgs),
    /// Run a worker: job cache, scheduler, and log shipping.
    Worker(WorkerArgs),
}

#[derive(Debug, Clone, Args)]
struct MasterArgs {
    #[arg(long, value_delimiter = ',')]
    etcd_endpoints: Option<Vec<String>>,
    #[arg(long)]
    api_bind_address: Option<String>,
    #[arg(long)]
    mongo_uri: Option<String>,
    #[arg(long)]
    mongo_database: Option<String>,
}

impl MasterArgs {
    fn into_config(self) -> Result<Config, cronmesh_config::ConfigError> {
        Config::builder()
            .maybe_etcd_endpoints(self.etcd_endpoints)
            .maybe_api_bind_address(self.api_bind_address)
            .maybe_mongo_uri(self.mongo_uri)
            .maybe_mongo_database(self.mongo_database)
            .build()
            .layered()
    }
}

#[derive(Debug, Clone, Args)]
struct WorkerArgs {
    #[arg(long)]
    worker_id: Option<String>,
    #[arg(long, value_delimiter = ',')]
    etcd_endpoints: Option<Vec<String>>,
    #[arg(long)]
    mongo_uri: Option<String>,
    #[arg(long)]
    mongo_database: Option<String>,
}

impl WorkerArgs {
    fn into_config(self) -> Result<Config, cronmesh_config::ConfigError> {
        Config::builder()
            .worker_id(self.worker_id.unwrap_or_else(default_worker_id))
            .maybe_etcd_endpoints(self.etcd_endpoints)
            .maybe_mongo_uri(self.mongo_uri)
            .maybe_mongo_database(self.mongo_database)
            .build()
            .layered()
    }
}

/// A worker started without `--worker-id` and without `CRONMESH_WORKER_ID`
/// gets a random one rather than silently colliding with another instance
/// on the same host under the default `worker-1`.
fn default_worker_id() -> String { format!("worker-{}", Uuid::new_v4()) }

#[tokio::main]
async fn main() -> Result<(), Whatever> {
    set_panic_hook();
    let _log_guard = init_logging(&LoggingOptions::default());

    let cli = Cli::parse();
    match cli.command {
        Command::Master(args) => {
            let config = args.into_config().whatever_context("invalid master configuration")?;
            master::run(config).await
        }
        Command::Worker(args) => {
            let config = args.into_config().whatever_context("invalid worker configuration")?;
            worker::run(config).await
        }
    }
}
