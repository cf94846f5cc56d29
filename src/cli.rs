use clap::Parser;

use crate::sync::restore::RestorePolicy;

#[derive(Parser)]
#[command(name = "clipsyncd", about = "Sync the clipboard with a shared remote hub")]
pub struct Cli {
    /// Hub base URL, e.g. https://hub.tailnet-name.ts.net
    #[arg(long)]
    pub url: String,

    /// Device ID stamped on outbound events (must be unique per device)
    #[arg(long)]
    pub device: String,

    /// What to revert the clipboard to after the idle window
    #[arg(long, value_enum, default_value_t = RestorePolicy::Clear)]
    pub restore_policy: RestorePolicy,

    /// Idle window in seconds before a remote-applied clipboard is reverted
    #[arg(long, default_value_t = 120)]
    pub restore_after: u64,
}
