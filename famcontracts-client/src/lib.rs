use famcontracts_shared::api::rest::RestError;
use famcontracts_shared::api::{CreateContractReq, NewTaskReq, UpdateProfileReq};
use famcontracts_shared::domain::{self, ContractId, Reward, TaskId};
use famcontracts_shared::storage::StorageError;
use tracing::{error, info, warn};

pub mod app;
pub mod cli;
pub mod config;
pub mod contracts;
pub mod login;
pub mod notify;
pub mod render;
pub mod session;
pub mod storage;
pub mod views;

pub use app::{App, Navigation};
pub use cli::{Cli, Command, ContractsCmd, ProfileCmd, RewardsCmd, TasksCmd};
pub use config::{ClientConfig, load_config, resolve_config_path};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("server error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("session expired; please log in again")]
    SessionExpired,
    #[error("not logged in")]
    NotAuthenticated,
    #[error("invalid input: {0}")]
    Input(String),
    #[error(transparent)]
    Store(#[from] contracts::StoreError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RestError> for AppError {
    fn from(e: RestError) -> Self {
        match e {
            RestError::Status { status: 401, .. } => AppError::SessionExpired,
            RestError::Status {
                status,
                message,
                body,
            } => AppError::Api {
                status,
                message: if message.is_empty() { body } else { message },
            },
            RestError::Http(m) => AppError::Http(m),
            RestError::Serde(m) => AppError::Decode(m),
            RestError::Storage(s) => AppError::Storage(s),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    init_tracing(cli.verbose);

    let server_arg = match &cli.command {
        Command::Login { server, .. } => server.clone(),
        Command::Register(args) => args.server.clone(),
        _ => None,
    };
    let cfg = login::config_with_server(cli.config.clone(), server_arg)?;
    info!(server=%cfg.server_url, storage=?cfg.storage, "config loaded");

    let mut app = App::from_config(&cfg)?;
    let res = dispatch(&mut app, cli.command).await;
    if let Err(AppError::SessionExpired | AppError::NotAuthenticated) = &res {
        // the terminal equivalent of redirecting to the login page
        warn!("authentication required");
        eprintln!("Run `famcontracts login` to sign in.");
    } else if let Err(e) = &res {
        error!(error=%e, "command failed");
    }
    app.shutdown();
    res
}

/// Runs one command. A command that lost the session also raises a notice.
pub async fn dispatch(app: &mut App, command: Command) -> Result<(), AppError> {
    let res = run_command(app, command).await;
    if let Err(AppError::SessionExpired) = &res {
        app.notify_session_expired().await;
    }
    res
}

async fn run_command(app: &mut App, command: Command) -> Result<(), AppError> {
    match command {
        Command::Login { email, .. } => login::login(app, email).await,
        Command::Register(args) => login::register(app, args).await,
        Command::Logout => {
            app.logout()?;
            println!("Logged out.");
            Ok(())
        }
        Command::Whoami => {
            let user = app.whoami().await?;
            println!("{}", render::user(user));
            Ok(())
        }
        Command::Summary => {
            app.refresh_contracts().await?;
            print!("{}", render::summary(&views::summarize(app.contracts().items())));
            Ok(())
        }
        Command::Contracts(cmd) => contracts_cmd(app, cmd).await,
        Command::Tasks(cmd) => tasks_cmd(app, cmd).await,
        Command::Rewards(cmd) => rewards_cmd(app, cmd).await,
        Command::Profile(cmd) => profile_cmd(app, cmd).await,
    }
}

async fn profile_cmd(app: &mut App, cmd: ProfileCmd) -> Result<(), AppError> {
    match cmd {
        ProfileCmd::Show => {
            let user = app.profile().await?;
            println!("{}", render::user(user));
        }
        ProfileCmd::Update {
            first_name,
            last_name,
            email,
            phone,
        } => {
            let user = app
                .update_profile(UpdateProfileReq {
                    first_name,
                    last_name,
                    email,
                    phone,
                })
                .await?;
            println!("Updated: {}", render::user(user));
        }
        ProfileCmd::Password => login::change_password(app).await?,
        ProfileCmd::DeleteAccount { yes } => {
            if !yes {
                return Err(AppError::Input(
                    "pass --yes to delete the account and its contracts".into(),
                ));
            }
            app.delete_account().await?;
            println!("Account deleted.");
        }
    }
    Ok(())
}

async fn contracts_cmd(app: &mut App, cmd: ContractsCmd) -> Result<(), AppError> {
    app.refresh_contracts().await?;
    match cmd {
        ContractsCmd::List => {
            print!("{}", render::contract_list(app.contracts().items()));
        }
        ContractsCmd::Show { id } => {
            let id = ContractId(id);
            let contract = app
                .contracts()
                .get(&id)
                .cloned()
                .ok_or_else(|| contracts::StoreError::NotFound(id.clone()))?;
            app.contracts_mut().select(Some(contract.clone()));
            print!("{}", render::contract_detail(&contract));
        }
        ContractsCmd::Create(args) => {
            let start_date = match args.start {
                Some(s) => domain::normalize_date(&s).map_err(AppError::Input)?,
                None => domain::now_rfc3339(),
            };
            let end_date = args
                .end
                .map(|e| domain::normalize_date(&e).map_err(AppError::Input))
                .transpose()?;
            let tasks = args
                .tasks
                .iter()
                .map(|spec| {
                    cli::parse_task_spec(spec).map(|(title, points)| NewTaskReq {
                        title,
                        description: None,
                        points,
                        due_date: None,
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(AppError::Input)?;
            let reward = match (args.reward_type, args.reward_value) {
                (Some(kind), Some(value)) => Some(Reward {
                    kind,
                    value,
                    amount: args.reward_amount,
                }),
                _ => None,
            };
            let id = app
                .create_contract(CreateContractReq {
                    title: args.title,
                    description: args.description,
                    child_id: args.child.into(),
                    start_date,
                    end_date,
                    tasks,
                    reward,
                })
                .await?;
            println!("Created contract {id}");
        }
        ContractsCmd::Status { id, status } => {
            app.set_contract_status(&ContractId(id.clone()), status).await?;
            println!("Contract {id} is now {status}");
        }
        ContractsCmd::Delete { id } => {
            app.delete_contract(&ContractId(id.clone())).await?;
            println!("Deleted contract {id}");
        }
    }
    Ok(())
}

async fn tasks_cmd(app: &mut App, cmd: TasksCmd) -> Result<(), AppError> {
    app.refresh_contracts().await?;
    match cmd {
        TasksCmd::List { filter } => {
            print!(
                "{}",
                render::task_view(&views::task_view(app.contracts().items(), filter))
            );
        }
        TasksCmd::Add {
            contract_id,
            title,
            description,
            points,
            due,
        } => {
            let due_date = due
                .map(|d| domain::normalize_date(&d).map_err(AppError::Input))
                .transpose()?;
            let id = app
                .add_task(
                    &ContractId(contract_id),
                    NewTaskReq {
                        title,
                        description,
                        points,
                        due_date,
                    },
                )
                .await?;
            println!("Added task {id}");
        }
        TasksCmd::Complete { id } => {
            let task = app.complete_task(&TaskId(id)).await?;
            println!("Task {} ({}) is {}", task.id, task.title, task.status);
        }
        TasksCmd::Fail { id } => {
            let task = app.fail_task(&TaskId(id)).await?;
            println!("Task {} ({}) is {}", task.id, task.title, task.status);
        }
    }
    Ok(())
}

async fn rewards_cmd(app: &mut App, cmd: RewardsCmd) -> Result<(), AppError> {
    match cmd {
        RewardsCmd::List { kind, status } => {
            app.refresh_contracts().await?;
            print!(
                "{}",
                render::reward_view(&views::reward_view(app.contracts().items(), kind, status))
            );
        }
        RewardsCmd::Server { contract } => {
            let contract = contract.map(ContractId);
            let rewards = app.server_rewards(contract.as_ref()).await?;
            print!("{}", render::server_rewards(&rewards));
        }
        RewardsCmd::Claim { id } => {
            let reward = app.claim_reward(&id).await?;
            println!("Reward {} ({}) is {}", reward.id, reward.title, reward.status);
        }
    }
    Ok(())
}
