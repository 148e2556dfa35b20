use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use super::API_PREFIX;

fn base_join(base: &str, path: &str) -> String {
    let b = base.trim_end_matches('/');
    let p = path.trim_start_matches('/');
    format!("{}/{}", b, p)
}

fn enc(s: &str) -> String {
    utf8_percent_encode(s, NON_ALPHANUMERIC).to_string()
}

fn with_contract_filter(url: String, contract_id: Option<&str>) -> String {
    match contract_id {
        Some(id) => format!("{}?contract_id={}", url, enc(id)),
        None => url,
    }
}

pub fn auth_login(base: &str) -> String {
    base_join(base, &format!("{}/auth/login", API_PREFIX))
}
pub fn auth_register(base: &str) -> String {
    base_join(base, &format!("{}/auth/register", API_PREFIX))
}
pub fn auth_me(base: &str) -> String {
    base_join(base, &format!("{}/auth/me", API_PREFIX))
}

pub fn contracts(base: &str) -> String {
    base_join(base, &format!("{}/contracts", API_PREFIX))
}
pub fn contract(base: &str, id: &str) -> String {
    base_join(base, &format!("{}/contracts/{}", API_PREFIX, enc(id)))
}

pub fn tasks(base: &str, contract_id: Option<&str>) -> String {
    with_contract_filter(
        base_join(base, &format!("{}/tasks", API_PREFIX)),
        contract_id,
    )
}
pub fn task(base: &str, id: &str) -> String {
    base_join(base, &format!("{}/tasks/{}", API_PREFIX, enc(id)))
}
pub fn task_complete(base: &str, id: &str) -> String {
    base_join(base, &format!("{}/tasks/{}/complete", API_PREFIX, enc(id)))
}

pub fn rewards(base: &str, contract_id: Option<&str>) -> String {
    with_contract_filter(
        base_join(base, &format!("{}/rewards", API_PREFIX)),
        contract_id,
    )
}
pub fn reward(base: &str, id: &str) -> String {
    base_join(base, &format!("{}/rewards/{}", API_PREFIX, enc(id)))
}
pub fn reward_claim(base: &str, id: &str) -> String {
    base_join(base, &format!("{}/rewards/{}/claim", API_PREFIX, enc(id)))
}

pub fn settings_profile(base: &str) -> String {
    base_join(base, &format!("{}/settings/profile", API_PREFIX))
}
pub fn settings_password(base: &str) -> String {
    base_join(base, &format!("{}/settings/password", API_PREFIX))
}
pub fn settings_account(base: &str) -> String {
    base_join(base, &format!("{}/settings/account", API_PREFIX))
}
