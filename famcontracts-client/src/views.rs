//! Read-only projections over the contract list. Recomputed on every call.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use famcontracts_shared::domain::{
    Contract, ContractId, ContractStatus, Reward, RewardType, Task, TaskStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Status(TaskStatus),
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Status(s) => task.status == *s,
        }
    }
}

impl FromStr for TaskFilter {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(TaskFilter::All);
        }
        s.parse::<TaskStatus>().map(TaskFilter::Status)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskView<'a> {
    pub task: &'a Task,
    pub contract_id: &'a ContractId,
    pub contract_title: &'a str,
}

/// Every task of every contract, tagged with its contract, in contract order
/// and then task order.
pub fn task_view(contracts: &[Contract], filter: TaskFilter) -> Vec<TaskView<'_>> {
    contracts
        .iter()
        .flat_map(|c| {
            c.tasks.iter().map(move |t| TaskView {
                task: t,
                contract_id: &c.id,
                contract_title: c.title.as_str(),
            })
        })
        .filter(|v| filter.matches(v.task))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewardViewStatus {
    Available,
    Pending,
    Used,
}

impl RewardViewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardViewStatus::Available => "available",
            RewardViewStatus::Pending => "pending",
            RewardViewStatus::Used => "used",
        }
    }
}

impl fmt::Display for RewardViewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RewardViewStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(RewardViewStatus::Available),
            "pending" => Ok(RewardViewStatus::Pending),
            "used" => Ok(RewardViewStatus::Used),
            other => Err(format!("unknown reward status: {other}")),
        }
    }
}

/// A reward's visible status follows its contract, not any stored field.
pub fn reward_status_for(status: ContractStatus) -> RewardViewStatus {
    match status {
        ContractStatus::Completed => RewardViewStatus::Available,
        ContractStatus::Pending => RewardViewStatus::Pending,
        _ => RewardViewStatus::Used,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RewardView<'a> {
    pub reward: &'a Reward,
    pub status: RewardViewStatus,
    pub contract_id: &'a ContractId,
    pub contract_title: &'a str,
}

/// One entry per contract that carries a reward, optionally narrowed by
/// reward type and derived status.
pub fn reward_view(
    contracts: &[Contract],
    kind: Option<RewardType>,
    status: Option<RewardViewStatus>,
) -> Vec<RewardView<'_>> {
    contracts
        .iter()
        .filter_map(|c| {
            c.reward.as_ref().map(|r| RewardView {
                reward: r,
                status: reward_status_for(c.status),
                contract_id: &c.id,
                contract_title: c.title.as_str(),
            })
        })
        .filter(|v| kind.is_none_or(|k| v.reward.kind == k))
        .filter(|v| status.is_none_or(|s| v.status == s))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractSummary {
    pub contracts: BTreeMap<&'static str, usize>,
    pub tasks: BTreeMap<&'static str, usize>,
    pub points_earned: i32,
    pub points_total: i32,
}

impl ContractSummary {
    pub fn contracts_with(&self, status: ContractStatus) -> usize {
        self.contracts.get(status.as_str()).copied().unwrap_or(0)
    }

    pub fn tasks_with(&self, status: TaskStatus) -> usize {
        self.tasks.get(status.as_str()).copied().unwrap_or(0)
    }
}

pub fn summarize(contracts: &[Contract]) -> ContractSummary {
    let mut summary = ContractSummary::default();
    for s in ContractStatus::ALL {
        summary.contracts.insert(s.as_str(), 0);
    }
    for s in TaskStatus::ALL {
        summary.tasks.insert(s.as_str(), 0);
    }
    for c in contracts {
        *summary.contracts.entry(c.status.as_str()).or_default() += 1;
        for t in &c.tasks {
            *summary.tasks.entry(t.status.as_str()).or_default() += 1;
        }
        summary.points_earned += c.points_earned();
        summary.points_total += c.points_total();
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contracts() -> Vec<Contract> {
        serde_json::from_value(json!([
            {
                "id": "c1", "title": "Room", "parent_id": "p", "child_id": "k",
                "status": "pending",
                "tasks": [
                    {"id": "t1", "title": "Vacuum", "status": "pending", "points": 2},
                    {"id": "t2", "title": "Dust", "status": "completed", "points": 1}
                ],
                "reward": {"type": "money", "value": "5"}
            },
            {
                "id": "c2", "title": "School", "parent_id": "p", "child_id": "k",
                "status": "completed",
                "tasks": [
                    {"id": "t3", "title": "Math", "status": "failed", "points": 5},
                    {"id": "t4", "title": "Read", "status": "pending", "points": 3}
                ],
                "reward": {"type": "privilege", "value": "late bedtime"}
            },
            {
                "id": "c3", "title": "Garden", "parent_id": "p", "child_id": "k",
                "status": "cancelled",
                "tasks": [],
                "reward": {"type": "item", "value": "ball", "amount": 1.0}
            },
            {
                "id": "c4", "title": "No reward", "parent_id": "p", "child_id": "k",
                "status": "active",
                "tasks": [{"id": "t5", "title": "Walk dog", "status": "completed"}]
            }
        ]))
        .unwrap()
    }

    fn task_ids(views: &[TaskView<'_>]) -> Vec<String> {
        views.iter().map(|v| v.task.id.to_string()).collect()
    }

    #[test]
    fn all_filter_flattens_in_order() {
        let cs = contracts();
        let all = task_view(&cs, TaskFilter::All);
        assert_eq!(task_ids(&all), ["t1", "t2", "t3", "t4", "t5"]);
        assert_eq!(all[2].contract_id, &ContractId::from("c2"));
        assert_eq!(all[2].contract_title, "School");
    }

    #[test]
    fn status_filter_is_exact_subset() {
        let cs = contracts();
        for status in TaskStatus::ALL {
            let filtered = task_view(&cs, TaskFilter::Status(status));
            let expected: Vec<String> = task_view(&cs, TaskFilter::All)
                .into_iter()
                .filter(|v| v.task.status == status)
                .map(|v| v.task.id.to_string())
                .collect();
            assert_eq!(task_ids(&filtered), expected);
        }
        assert_eq!(
            task_ids(&task_view(&cs, TaskFilter::Status(TaskStatus::Pending))),
            ["t1", "t4"]
        );
    }

    #[test]
    fn filter_parses_all_and_statuses() {
        assert_eq!("all".parse::<TaskFilter>(), Ok(TaskFilter::All));
        assert_eq!(
            "Failed".parse::<TaskFilter>(),
            Ok(TaskFilter::Status(TaskStatus::Failed))
        );
        assert!("done".parse::<TaskFilter>().is_err());
    }

    #[test]
    fn reward_status_follows_contract_status() {
        assert_eq!(
            reward_status_for(ContractStatus::Completed),
            RewardViewStatus::Available
        );
        assert_eq!(
            reward_status_for(ContractStatus::Pending),
            RewardViewStatus::Pending
        );
        assert_eq!(reward_status_for(ContractStatus::Active), RewardViewStatus::Used);
        assert_eq!(
            reward_status_for(ContractStatus::Cancelled),
            RewardViewStatus::Used
        );
    }

    #[test]
    fn reward_view_skips_contracts_without_reward() {
        let cs = contracts();
        let all = reward_view(&cs, None, None);
        let ids: Vec<&str> = all.iter().map(|v| v.contract_id.as_str()).collect();
        assert_eq!(ids, ["c1", "c2", "c3"]);
        assert_eq!(
            all.iter().map(|v| v.status).collect::<Vec<_>>(),
            [
                RewardViewStatus::Pending,
                RewardViewStatus::Available,
                RewardViewStatus::Used
            ]
        );
    }

    #[test]
    fn reward_view_filters_by_type_and_status() {
        let cs = contracts();
        let money = reward_view(&cs, Some(RewardType::Money), None);
        assert_eq!(money.len(), 1);
        assert_eq!(money[0].contract_title, "Room");

        let used_items = reward_view(&cs, Some(RewardType::Item), Some(RewardViewStatus::Used));
        assert_eq!(used_items.len(), 1);
        assert!(reward_view(&cs, Some(RewardType::Money), Some(RewardViewStatus::Used)).is_empty());
    }

    #[test]
    fn summary_counts() {
        let s = summarize(&contracts());
        assert_eq!(s.contracts_with(ContractStatus::Pending), 1);
        assert_eq!(s.contracts_with(ContractStatus::Active), 1);
        assert_eq!(s.tasks_with(TaskStatus::Pending), 2);
        assert_eq!(s.tasks_with(TaskStatus::Completed), 2);
        assert_eq!(s.tasks_with(TaskStatus::Failed), 1);
        assert_eq!(s.points_total, 11);
        assert_eq!(s.points_earned, 1);
        assert_eq!(summarize(&[]).contracts_with(ContractStatus::Completed), 0);
    }
}
