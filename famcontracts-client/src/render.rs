//! Plain-text rendering of views for the terminal.

use std::fmt::Write;

use famcontracts_shared::api::RewardDto;
use famcontracts_shared::domain::{Contract, ContractStatus, Reward, TaskStatus, User};

use crate::views::{ContractSummary, RewardView, TaskView};

fn reward_line(r: &Reward) -> String {
    match r.amount {
        Some(a) => format!("{} {} (x{})", r.kind, r.value, a),
        None => format!("{} {}", r.kind, r.value),
    }
}

pub fn user(u: &User) -> String {
    let mut out = format!("{} <{}> [{}] id={}", u.display_name(), u.email, u.role, u.id);
    if let Some(phone) = &u.phone {
        let _ = write!(out, " phone={phone}");
    }
    out
}

pub fn contract_list(contracts: &[Contract]) -> String {
    if contracts.is_empty() {
        return "No contracts.\n".to_string();
    }
    let mut out = String::new();
    for c in contracts {
        let _ = writeln!(
            out,
            "{:<12} {:<10} {}  [{}/{} pts, {} tasks]",
            c.id,
            c.status,
            c.title,
            c.points_earned(),
            c.points_total(),
            c.tasks.len()
        );
    }
    out
}

pub fn contract_detail(c: &Contract) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", c.title, c.id);
    let _ = writeln!(out, "  status:  {}", c.status);
    let _ = writeln!(out, "  parent:  {}   child: {}", c.parent_id, c.child_id);
    if let Some(d) = &c.description {
        let _ = writeln!(out, "  about:   {d}");
    }
    if let Some(s) = &c.start_date {
        let _ = writeln!(
            out,
            "  period:  {} .. {}",
            s,
            c.end_date.as_deref().unwrap_or("open")
        );
    }
    if let Some(r) = &c.reward {
        let _ = writeln!(out, "  reward:  {}", reward_line(r));
    }
    let _ = writeln!(out, "  tasks:");
    if c.tasks.is_empty() {
        let _ = writeln!(out, "    (none)");
    }
    for t in &c.tasks {
        let _ = writeln!(
            out,
            "    {:<10} {:<9} {} ({} pts{})",
            t.id,
            t.status,
            t.title,
            t.points,
            t.due_date
                .as_deref()
                .map(|d| format!(", due {d}"))
                .unwrap_or_default()
        );
    }
    out
}

pub fn task_view(views: &[TaskView<'_>]) -> String {
    if views.is_empty() {
        return "No tasks match the selected filter.\n".to_string();
    }
    let mut out = String::new();
    for v in views {
        let _ = writeln!(
            out,
            "{:<10} {:<9} {}  (contract: {} / {})",
            v.task.id, v.task.status, v.task.title, v.contract_title, v.contract_id
        );
    }
    out
}

pub fn reward_view(views: &[RewardView<'_>]) -> String {
    if views.is_empty() {
        return "No rewards match the selected filter.\n".to_string();
    }
    let mut out = String::new();
    for v in views {
        let _ = writeln!(
            out,
            "{:<9} {}  (contract: {} / {})",
            v.status,
            reward_line(v.reward),
            v.contract_title,
            v.contract_id
        );
    }
    out
}

pub fn server_rewards(rewards: &[RewardDto]) -> String {
    if rewards.is_empty() {
        return "No rewards.\n".to_string();
    }
    let mut out = String::new();
    for r in rewards {
        let _ = writeln!(
            out,
            "{:<12} {:<9} {} ({} pts, contract {})",
            r.id, r.status, r.title, r.points, r.contract_id
        );
    }
    out
}

pub fn summary(s: &ContractSummary) -> String {
    let mut out = String::from("Contracts:\n");
    for status in ContractStatus::ALL {
        let _ = writeln!(out, "  {:<10} {}", status, s.contracts_with(status));
    }
    out.push_str("Tasks:\n");
    for status in TaskStatus::ALL {
        let _ = writeln!(out, "  {:<10} {}", status, s.tasks_with(status));
    }
    let _ = writeln!(out, "Points: {}/{}", s.points_earned, s.points_total);
    out
}
