use clap::{Parser, Subcommand};

/// healthd — personal health-tracking backend
#[derive(Parser)]
#[command(name = "healthd", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Port to bind
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Run one delivery sweep across all users and exit
    Sweep,
}
