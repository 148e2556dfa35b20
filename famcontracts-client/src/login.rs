use std::io::{self, Write};
use std::path::PathBuf;

use famcontracts_shared::api::RegisterReq;

use crate::AppError;
use crate::app::App;
use crate::cli::RegisterArgs;
use crate::config::{self, ClientConfig};

/// Resolves the config, persisting `--server` when one was given.
pub fn config_with_server(
    cfg_path_opt: Option<PathBuf>,
    server_arg: Option<String>,
) -> Result<ClientConfig, AppError> {
    let (path, mut cfg) = ClientConfig::find_and_load(cfg_path_opt)?;
    if let Some(s) = server_arg {
        cfg.server_url = config::validate_server_url(&s)?;
        config::save_config(&path, &cfg)?;
        println!("Saved server {} to {}", cfg.server_url, path.display());
    }
    Ok(cfg)
}

pub async fn login(app: &mut App, email_arg: Option<String>) -> Result<(), AppError> {
    let email = match email_arg {
        Some(e) => e,
        None => prompt("Email: ")?,
    };
    let password = read_password()?;
    let res = app
        .login(&email, &password)
        .await
        .map(|user| format!("Logged in as {} ({})", user.display_name(), user.role));
    match res {
        Ok(line) => {
            println!("{line}");
            Ok(())
        }
        Err(e) => Err(report_session_error(app, e)),
    }
}

pub async fn register(app: &mut App, args: RegisterArgs) -> Result<(), AppError> {
    let email = match args.email {
        Some(e) => e,
        None => prompt("Email: ")?,
    };
    let username = match args.username {
        Some(u) => u,
        None => prompt("Username: ")?,
    };
    let password = read_password()?;
    let req = RegisterReq {
        email,
        password,
        username,
        first_name: args.first_name,
        last_name: args.last_name,
        role: args.role,
    };
    let res = app.register(req).await.map(|user| {
        format!(
            "Registered {} as {}; you are now logged in",
            user.display_name(),
            user.role
        )
    });
    match res {
        Ok(line) => {
            println!("{line}");
            Ok(())
        }
        Err(e) => Err(report_session_error(app, e)),
    }
}

pub async fn change_password(app: &mut App) -> Result<(), AppError> {
    let current = rpassword::prompt_password("Current password: ").map_err(AppError::Io)?;
    let new = rpassword::prompt_password("New password: ").map_err(AppError::Io)?;
    let confirm = rpassword::prompt_password("Repeat new password: ").map_err(AppError::Io)?;
    if new != confirm {
        return Err(AppError::Input("passwords do not match".into()));
    }
    match app.change_password(&current, &new).await {
        Ok(()) => {
            println!("Password changed.");
            Ok(())
        }
        Err(e) => Err(report_session_error(app, e)),
    }
}

fn report_session_error(app: &App, e: AppError) -> AppError {
    if let Some(msg) = &app.session().error {
        eprintln!("{msg}");
    }
    e
}

fn read_password() -> Result<String, AppError> {
    rpassword::prompt_password("Password: ").map_err(AppError::Io)
}

fn prompt(msg: &str) -> Result<String, AppError> {
    print!("{}", msg);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).map_err(AppError::Io)?;
    Ok(buf.trim().to_string())
}
