//! Contract store: the in-memory list every view is derived from.

use famcontracts_shared::domain::{Contract, ContractId, TaskId};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("contract {0} not found")]
    NotFound(ContractId),
    #[error("contract {id} changed since it was read (expected version {expected}, found {found})")]
    Stale {
        id: ContractId,
        expected: u64,
        found: u64,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractStore {
    items: Vec<Contract>,
    pub is_loading: bool,
    pub error: Option<String>,
    selected: Option<Contract>,
}

impl ContractStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole list. Versions only exist client-side, so a
    /// contract already held keeps the higher of its local and incoming
    /// version; a reload never makes an older snapshot current again.
    pub fn set_all(&mut self, mut items: Vec<Contract>) {
        for c in &mut items {
            if let Some(local) = self.get(&c.id) {
                c.version = c.version.max(local.version);
            }
        }
        self.items = items;
    }

    /// Appends; ids and timestamps are the caller's business.
    pub fn add(&mut self, contract: Contract) {
        self.items.push(contract);
    }

    /// Replaces the contract with the same id. Returns false (and changes
    /// nothing) when no such contract exists. Last write wins.
    pub fn update(&mut self, contract: Contract) -> bool {
        match self.items.iter_mut().find(|c| c.id == contract.id) {
            Some(slot) => {
                *slot = contract;
                true
            }
            None => false,
        }
    }

    /// Like [`update`](Self::update) but refuses to overwrite a contract whose
    /// version moved past `expected_version`. The stored copy gets
    /// `expected_version + 1`.
    pub fn update_if_current(
        &mut self,
        mut contract: Contract,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        let slot = self
            .items
            .iter_mut()
            .find(|c| c.id == contract.id)
            .ok_or_else(|| StoreError::NotFound(contract.id.clone()))?;
        if slot.version != expected_version {
            return Err(StoreError::Stale {
                id: contract.id.clone(),
                expected: expected_version,
                found: slot.version,
            });
        }
        contract.version = expected_version + 1;
        *slot = contract;
        Ok(())
    }

    pub fn remove(&mut self, id: &ContractId) {
        self.items.retain(|c| &c.id != id);
        if self.selected.as_ref().is_some_and(|c| &c.id == id) {
            self.selected = None;
        }
    }

    pub fn select(&mut self, contract: Option<Contract>) {
        self.selected = contract;
    }

    pub fn selected(&self) -> Option<&Contract> {
        self.selected.as_ref()
    }

    pub fn get(&self, id: &ContractId) -> Option<&Contract> {
        self.items.iter().find(|c| &c.id == id)
    }

    pub fn find_by_task(&self, task_id: &TaskId) -> Option<&Contract> {
        self.items.iter().find(|c| c.task(task_id).is_some())
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    pub fn items(&self) -> &[Contract] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contract> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
