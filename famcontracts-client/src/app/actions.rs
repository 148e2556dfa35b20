use famcontracts_shared::api::{
    CreateContractReq, CreateTaskReq, NewTaskReq, RewardDto, UpdateContractReq, UpdateTaskReq,
};
use famcontracts_shared::domain::{Contract, ContractId, ContractStatus, Task, TaskId, TaskStatus};
use tracing::{debug, info};

use super::App;
use crate::AppError;
use crate::contracts::StoreError;

const FETCH_FAILED: &str = "failed to load contracts";
const CREATE_FAILED: &str = "failed to create contract";
const UPDATE_FAILED: &str = "failed to update contract";
const DELETE_FAILED: &str = "failed to delete contract";
const TASK_FAILED: &str = "failed to update task";
const REWARD_FAILED: &str = "failed to claim reward";

impl App {
    /// Replaces the store with the server's list.
    pub async fn refresh_contracts(&mut self) -> Result<usize, AppError> {
        self.require_auth()?;
        self.begin_contracts();
        let res = self.api.list_contracts().await;
        let list = self.settle(res, FETCH_FAILED)?;
        let n = list.len();
        self.contracts.set_all(list);
        debug!(count = n, "contracts loaded");
        Ok(n)
    }

    pub async fn create_contract(&mut self, req: CreateContractReq) -> Result<ContractId, AppError> {
        self.require_auth()?;
        self.begin_contracts();
        let res = self.api.create_contract(&req).await;
        let created = self.settle(res, CREATE_FAILED)?;
        let id = created.id.clone();
        info!(contract=%id, title=%created.title, "contract created");
        self.contracts.add(created);
        Ok(id)
    }

    /// Sends the whole entity. The write is refused locally when the store has
    /// moved past the version `contract` was read at.
    pub async fn update_contract(&mut self, contract: Contract) -> Result<(), AppError> {
        self.require_auth()?;
        let expected = contract.version;
        match self.contracts.get(&contract.id) {
            None => return Err(StoreError::NotFound(contract.id.clone()).into()),
            Some(current) if current.version != expected => {
                return Err(StoreError::Stale {
                    id: contract.id.clone(),
                    expected,
                    found: current.version,
                }
                .into());
            }
            Some(_) => {}
        }
        let req = UpdateContractReq {
            title: Some(contract.title.clone()),
            description: contract.description.clone(),
            child_id: Some(contract.child_id.clone()),
            status: Some(contract.status),
            start_date: contract.start_date.clone(),
            end_date: contract.end_date.clone(),
            reward: contract.reward.clone(),
        };
        self.begin_contracts();
        let res = self.api.update_contract(contract.id.as_str(), &req).await;
        let mut updated = self.settle(res, UPDATE_FAILED)?;
        // servers that answer without the embedded parts keep the local ones
        if updated.tasks.is_empty() {
            updated.tasks = contract.tasks;
        }
        if updated.reward.is_none() {
            updated.reward = contract.reward;
        }
        self.contracts.update_if_current(updated, expected)?;
        Ok(())
    }

    pub async fn set_contract_status(
        &mut self,
        id: &ContractId,
        status: ContractStatus,
    ) -> Result<(), AppError> {
        let mut contract = self
            .contracts
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        contract.status = status;
        self.update_contract(contract).await?;
        info!(contract=%id, %status, "contract status changed");
        Ok(())
    }

    pub async fn delete_contract(&mut self, id: &ContractId) -> Result<(), AppError> {
        self.require_auth()?;
        self.begin_contracts();
        let res = self.api.delete_contract(id.as_str()).await;
        self.settle(res, DELETE_FAILED)?;
        self.contracts.remove(id);
        info!(contract=%id, "contract deleted");
        Ok(())
    }

    /// Creates a task on the server and appends it to its contract.
    pub async fn add_task(
        &mut self,
        contract_id: &ContractId,
        task: NewTaskReq,
    ) -> Result<TaskId, AppError> {
        self.require_auth()?;
        let req = CreateTaskReq {
            contract_id: contract_id.clone(),
            title: task.title,
            description: task.description,
            points: task.points,
            due_date: task.due_date,
        };
        self.begin_contracts();
        let res = self.api.create_task(&req).await;
        let mut created = self.settle(res, TASK_FAILED)?;
        created.contract_id.get_or_insert_with(|| contract_id.clone());
        let id = created.id.clone();
        if let Some(mut contract) = self.contracts.get(contract_id).cloned() {
            contract.tasks.push(created);
            self.contracts.update(contract);
        }
        Ok(id)
    }

    pub async fn complete_task(&mut self, id: &TaskId) -> Result<Task, AppError> {
        self.require_auth()?;
        self.begin_contracts();
        let res = self.api.complete_task(id.as_str()).await;
        let task = self.settle(res, TASK_FAILED)?;
        self.merge_task(&task);
        self.notify("Task completed", &task.title).await;
        Ok(task)
    }

    pub async fn fail_task(&mut self, id: &TaskId) -> Result<Task, AppError> {
        self.require_auth()?;
        let req = UpdateTaskReq {
            status: Some(TaskStatus::Failed),
            ..Default::default()
        };
        self.begin_contracts();
        let res = self.api.update_task(id.as_str(), &req).await;
        let task = self.settle(res, TASK_FAILED)?;
        self.merge_task(&task);
        Ok(task)
    }

    /// Writes a server-returned task into whichever stored contract owns it.
    fn merge_task(&mut self, task: &Task) {
        let owner = match &task.contract_id {
            Some(cid) => self.contracts.get(cid),
            None => self.contracts.find_by_task(&task.id),
        };
        let Some(mut contract) = owner.cloned() else {
            debug!(task=%task.id, "task not in any cached contract");
            return;
        };
        match contract.task_mut(&task.id) {
            Some(slot) => *slot = task.clone(),
            None => contract.tasks.push(task.clone()),
        }
        self.contracts.update(contract);
    }

    /// Rewards as the server tracks them (with ids usable for claiming).
    pub async fn server_rewards(
        &mut self,
        contract_id: Option<&ContractId>,
    ) -> Result<Vec<RewardDto>, AppError> {
        self.require_auth()?;
        let res = self.api.list_rewards(contract_id.map(|c| c.as_str())).await;
        self.drain_events();
        Ok(res?)
    }

    pub async fn claim_reward(&mut self, reward_id: &str) -> Result<RewardDto, AppError> {
        self.require_auth()?;
        self.begin_contracts();
        let res = self.api.claim_reward(reward_id).await;
        let reward = self.settle(res, REWARD_FAILED)?;
        info!(reward=%reward.id, status=%reward.status, "reward claimed");
        self.notify("Reward claimed", &reward.title).await;
        Ok(reward)
    }
}
