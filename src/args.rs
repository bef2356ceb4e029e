use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Shardplan - Deployment planning wizard for sharded database clusters
#[derive(Parser, Debug)]
#[command(name = "shardplan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Plans cluster topologies and generates deployment scripts", long_about = None)]
pub struct Cli {
    /// Actions to perform, in order (comma separated)
    #[arg(short = 'a', long = "action", value_delimiter = ',', default_value = "generate")]
    pub actions: Vec<Action>,

    /// Components to act on (comma separated)
    #[arg(short = 'c', long = "component", value_delimiter = ',', default_value = "all")]
    pub components: Vec<Component>,

    /// Extend the existing deployment with new shards instead of starting over
    #[arg(long = "add")]
    pub add: bool,

    /// Accept every default without prompting
    #[arg(long = "non-interactive")]
    pub non_interactive: bool,

    /// Path to the deployment config file (TOML)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Seed for host selection; random when omitted
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Generate,
    Start,
    Stop,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Lockserver,
    Admind,
    Gateway,
    Tablet,
    Mysqld,
    All,
}

impl Component {
    /// Dependency order for starting: the lockserver comes up before
    /// anything that registers in it, and mysqld before its tablets.
    pub const START_ORDER: [Component; 5] = [
        Component::Lockserver,
        Component::Admind,
        Component::Gateway,
        Component::Mysqld,
        Component::Tablet,
    ];

    /// Expands `all` and orders the selection for the given action.
    pub fn resolve(selected: &[Component], action: Action) -> Vec<Component> {
        let mut ordered: Vec<Component> = Self::START_ORDER
            .into_iter()
            .filter(|c| selected.contains(&Component::All) || selected.contains(c))
            .collect();
        if action == Action::Stop {
            ordered.reverse();
        }
        ordered
    }
}
