use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use famcontracts_shared::auth::Role;
use famcontracts_shared::domain::{ContractStatus, RewardType};

use crate::views::{RewardViewStatus, TaskFilter};

const HELP_EPILOG: &str = r#"Config resolution order:
  1) --config/-c PATH
  2) $FAMCONTRACTS_CONFIG
  3) default: ~/.config/famcontracts/client.yaml

$FAMCONTRACTS_API_URL overrides server_url from the config file.
"#;

#[derive(Debug, Parser)]
#[command(
    name = "famcontracts",
    version,
    about = "Track family contracts: tasks for children, rewards on completion",
    long_about = None,
    after_long_help = HELP_EPILOG,
)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Log at debug level (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and persist the session token
    Login {
        /// API base URL (e.g., http://localhost:8080/api). Saved to the config file.
        #[arg(long)]
        server: Option<String>,
        /// Account email. Falls back to prompt.
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account and log in with it
    Register(RegisterArgs),
    /// Forget the persisted token
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Counts of contracts and tasks per status
    Summary,
    #[command(subcommand)]
    Contracts(ContractsCmd),
    #[command(subcommand)]
    Tasks(TasksCmd),
    #[command(subcommand)]
    Rewards(RewardsCmd),
    /// Show or edit the account profile
    #[command(subcommand)]
    Profile(ProfileCmd),
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub server: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    /// parent or child
    #[arg(long, value_parser = parse_role)]
    pub role: Role,
}

#[derive(Debug, Subcommand)]
pub enum ContractsCmd {
    /// List contracts
    List,
    /// Show one contract with its tasks and reward
    Show { id: String },
    /// Create a contract for a child
    Create(CreateContractArgs),
    /// Change a contract's status (pending, active, completed, cancelled)
    Status {
        id: String,
        #[arg(value_parser = parse_contract_status)]
        status: ContractStatus,
    },
    /// Delete a contract
    Delete { id: String },
}

#[derive(Debug, Args)]
pub struct CreateContractArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    /// Child user id
    #[arg(long)]
    pub child: String,
    /// Start date (YYYY-MM-DD or RFC 3339). Defaults to now.
    #[arg(long)]
    pub start: Option<String>,
    #[arg(long)]
    pub end: Option<String>,
    /// Task as TITLE or TITLE:POINTS; repeatable
    #[arg(long = "task")]
    pub tasks: Vec<String>,
    #[arg(long, value_parser = parse_reward_type, requires = "reward_value")]
    pub reward_type: Option<RewardType>,
    #[arg(long, requires = "reward_type")]
    pub reward_value: Option<String>,
    #[arg(long, requires = "reward_type")]
    pub reward_amount: Option<f64>,
}

#[derive(Debug, Subcommand)]
pub enum TasksCmd {
    /// List tasks across all contracts
    List {
        /// all, pending, completed or failed
        #[arg(long, default_value = "all", value_parser = parse_task_filter)]
        filter: TaskFilter,
    },
    /// Add a task to an existing contract
    Add {
        contract_id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value_t = 0)]
        points: i32,
        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        due: Option<String>,
    },
    /// Mark a task completed
    Complete { id: String },
    /// Mark a task failed
    Fail { id: String },
}

#[derive(Debug, Subcommand)]
pub enum RewardsCmd {
    /// Rewards derived from contracts
    List {
        /// money, privilege or item
        #[arg(long = "type", value_parser = parse_reward_type)]
        kind: Option<RewardType>,
        /// available, pending or used
        #[arg(long, value_parser = parse_reward_status)]
        status: Option<RewardViewStatus>,
    },
    /// Rewards as the server tracks them, with claimable ids
    Server {
        #[arg(long)]
        contract: Option<String>,
    },
    /// Claim a reward by server id
    Claim { id: String },
}

#[derive(Debug, Subcommand)]
pub enum ProfileCmd {
    /// Show the profile as the server stores it
    Show,
    /// Change name, email or phone
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Change the password (prompts for the current and the new one)
    Password,
    /// Delete the account together with its contracts
    DeleteAccount {
        /// Required; there is no undo
        #[arg(long)]
        yes: bool,
    },
}

fn parse_role(s: &str) -> Result<Role, String> {
    s.parse()
}

fn parse_contract_status(s: &str) -> Result<ContractStatus, String> {
    s.parse()
}

fn parse_reward_type(s: &str) -> Result<RewardType, String> {
    s.parse()
}

fn parse_reward_status(s: &str) -> Result<RewardViewStatus, String> {
    s.parse()
}

fn parse_task_filter(s: &str) -> Result<TaskFilter, String> {
    s.parse()
}

/// `TITLE` or `TITLE:POINTS`.
pub fn parse_task_spec(spec: &str) -> Result<(String, i32), String> {
    match spec.rsplit_once(':') {
        Some((title, pts)) if !title.trim().is_empty() => {
            let points = pts
                .trim()
                .parse::<i32>()
                .map_err(|e| format!("invalid points in task {spec:?}: {e}"))?;
            Ok((title.trim().to_string(), points))
        }
        Some(_) => Err(format!("task {spec:?} has no title")),
        None if spec.trim().is_empty() => Err("empty task".into()),
        None => Ok((spec.trim().to_string(), 0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_task_list_filter() {
        let cli = Cli::parse_from(["famcontracts", "tasks", "list", "--filter", "pending"]);
        match cli.command {
            Command::Tasks(TasksCmd::List { filter }) => {
                assert_eq!(
                    filter,
                    TaskFilter::Status(famcontracts_shared::domain::TaskStatus::Pending)
                );
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn reward_value_requires_type() {
        let res = Cli::try_parse_from([
            "famcontracts",
            "contracts",
            "create",
            "--title",
            "Room",
            "--child",
            "k1",
            "--reward-value",
            "5",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn profile_update_takes_optional_fields() {
        let cli = Cli::parse_from(["famcontracts", "profile", "update", "--phone", "+100"]);
        match cli.command {
            Command::Profile(ProfileCmd::Update {
                first_name,
                email,
                phone,
                ..
            }) => {
                assert_eq!(first_name, None);
                assert_eq!(email, None);
                assert_eq!(phone.as_deref(), Some("+100"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn task_specs() {
        assert_eq!(parse_task_spec("Vacuum:3"), Ok(("Vacuum".into(), 3)));
        assert_eq!(parse_task_spec("Read a book"), Ok(("Read a book".into(), 0)));
        assert!(parse_task_spec(":3").is_err());
        assert!(parse_task_spec("Dishes:lots").is_err());
    }
}
