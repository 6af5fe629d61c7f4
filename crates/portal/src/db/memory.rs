//! In-process repositories.
//!
//! Used by unit and integration tests in place of `PostgreSQL`, and handy for
//! running the router without a database. Both stores can be told to fail so
//! tests can exercise the error paths.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use pengawas_core::{ApprovalStatus, Email, Identity, ProgramPlanId, Role, UserId, WizardStep};

use super::{
    AccountRepository, ApprovalCounts, IdentityRepository, NewAccount, PlanSummary, PlanTarget,
    RepositoryError, StepStore,
};
use crate::models::StepData;

/// Error returned by an injected fault.
fn injected() -> RepositoryError {
    RepositoryError::Database(sqlx::Error::PoolTimedOut)
}

fn poisoned() -> RepositoryError {
    RepositoryError::DataCorruption("in-memory store lock poisoned".to_owned())
}

// =============================================================================
// Accounts
// =============================================================================

#[derive(Default)]
struct AccountState {
    next_id: i32,
    accounts: BTreeMap<UserId, (Identity, String)>,
    fail_lookups: bool,
}

/// In-memory account store implementing both account ports.
#[derive(Default)]
pub struct MemoryAccounts {
    state: Mutex<AccountState>,
}

impl MemoryAccounts {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an account directly, bypassing validation. Returns its identity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    pub fn insert(&self, account: NewAccount) -> Result<Identity, RepositoryError> {
        let mut state = self.state.lock().map_err(|_| poisoned())?;
        if state
            .accounts
            .values()
            .any(|(identity, _)| identity.email == account.email)
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        state.next_id += 1;
        let identity = Identity {
            id: UserId::new(state.next_id),
            email: account.email,
            role: account.role,
            status_approval: account.status_approval,
            display_name: account.display_name,
            created_at: Utc::now(),
        };
        state
            .accounts
            .insert(identity.id, (identity.clone(), account.password_hash));
        Ok(identity)
    }

    /// Make every identity lookup fail until switched off again.
    pub fn fail_lookups(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_lookups = fail;
        }
    }
}

#[async_trait]
impl IdentityRepository for MemoryAccounts {
    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, RepositoryError> {
        let state = self.state.lock().map_err(|_| poisoned())?;
        if state.fail_lookups {
            return Err(injected());
        }
        Ok(state.accounts.get(&id).map(|(identity, _)| identity.clone()))
    }
}

#[async_trait]
impl AccountRepository for MemoryAccounts {
    async fn find_login(
        &self,
        email: &Email,
    ) -> Result<Option<(Identity, String)>, RepositoryError> {
        let state = self.state.lock().map_err(|_| poisoned())?;
        if state.fail_lookups {
            return Err(injected());
        }
        Ok(state
            .accounts
            .values()
            .find(|(identity, _)| &identity.email == email)
            .cloned())
    }

    async fn create(&self, account: NewAccount) -> Result<Identity, RepositoryError> {
        self.insert(account)
    }

    async fn update_display_name(&self, id: UserId, name: &str) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().map_err(|_| poisoned())?;
        let (identity, _) = state
            .accounts
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        identity.display_name = Some(name.to_owned());
        Ok(())
    }

    async fn list_by_status(
        &self,
        statuses: &[ApprovalStatus],
    ) -> Result<Vec<Identity>, RepositoryError> {
        let state = self.state.lock().map_err(|_| poisoned())?;
        Ok(state
            .accounts
            .values()
            .map(|(identity, _)| identity)
            .filter(|i| i.role != Role::Admin && statuses.contains(&i.status_approval))
            .cloned()
            .collect())
    }

    async fn count_by_status(&self) -> Result<ApprovalCounts, RepositoryError> {
        let state = self.state.lock().map_err(|_| poisoned())?;
        let mut counts = ApprovalCounts::default();
        for (identity, _) in state.accounts.values() {
            if identity.role == Role::Admin {
                continue;
            }
            match identity.status_approval {
                ApprovalStatus::Pending => counts.pending += 1,
                ApprovalStatus::Approved => counts.approved += 1,
                ApprovalStatus::Rejected => counts.rejected += 1,
            }
        }
        Ok(counts)
    }

    async fn set_approval_status(
        &self,
        id: UserId,
        status: ApprovalStatus,
    ) -> Result<Identity, RepositoryError> {
        let mut state = self.state.lock().map_err(|_| poisoned())?;
        match state.accounts.get_mut(&id) {
            Some((identity, _)) if identity.role != Role::Admin => {
                identity.status_approval = status;
                Ok(identity.clone())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }
}

// =============================================================================
// Program plans
// =============================================================================

struct PlanHeader {
    owner: UserId,
    updated_at: DateTime<Utc>,
    /// Value of `PlanState::writes` at the last save; orders plans that share
    /// a timestamp.
    revision: u64,
}

#[derive(Default)]
struct PlanState {
    next_id: i32,
    writes: u64,
    plans: BTreeMap<ProgramPlanId, PlanHeader>,
    tokens: HashMap<(UserId, Uuid), ProgramPlanId>,
    steps: HashMap<(ProgramPlanId, WizardStep), StepData>,
    failing_steps: HashSet<WizardStep>,
    saves: usize,
}

/// In-memory step store.
#[derive(Default)]
pub struct MemoryStepStore {
    state: Mutex<PlanState>,
}

impl MemoryStepStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make saves of `step` fail (or succeed again).
    pub fn fail_saves_of(&self, step: WizardStep, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            if fail {
                state.failing_steps.insert(step);
            } else {
                state.failing_steps.remove(&step);
            }
        }
    }

    /// Number of successful saves so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.state.lock().map_or(0, |state| state.saves)
    }

    /// Number of plans created so far.
    #[must_use]
    pub fn plan_count(&self) -> usize {
        self.state.lock().map_or(0, |state| state.plans.len())
    }
}

#[async_trait]
impl StepStore for MemoryStepStore {
    async fn load_step(
        &self,
        plan: ProgramPlanId,
        step: WizardStep,
    ) -> Result<Option<StepData>, RepositoryError> {
        let state = self.state.lock().map_err(|_| poisoned())?;
        Ok(state.steps.get(&(plan, step)).cloned())
    }

    async fn save_step(
        &self,
        owner: UserId,
        plan: PlanTarget,
        step: WizardStep,
        data: &StepData,
    ) -> Result<ProgramPlanId, RepositoryError> {
        let mut state = self.state.lock().map_err(|_| poisoned())?;
        if state.failing_steps.contains(&step) {
            return Err(injected());
        }

        let plan_id = match plan {
            PlanTarget::Existing(id) if state.plans.contains_key(&id) => id,
            PlanTarget::Existing(_) => return Err(RepositoryError::NotFound),
            PlanTarget::New { creation_token } => {
                let unused = ProgramPlanId::new(state.next_id + 1);
                let id = *state
                    .tokens
                    .entry((owner, creation_token))
                    .or_insert(unused);
                if id == unused {
                    state.next_id += 1;
                }
                id
            }
        };

        state.writes += 1;
        let revision = state.writes;
        let header = state.plans.entry(plan_id).or_insert(PlanHeader {
            owner,
            updated_at: Utc::now(),
            revision,
        });
        header.updated_at = Utc::now();
        header.revision = revision;

        state.steps.insert((plan_id, step), data.clone());
        state.saves += 1;
        Ok(plan_id)
    }

    async fn owner_of(&self, plan: ProgramPlanId) -> Result<Option<UserId>, RepositoryError> {
        let state = self.state.lock().map_err(|_| poisoned())?;
        Ok(state.plans.get(&plan).map(|header| header.owner))
    }

    async fn list_plans(&self, owner: UserId) -> Result<Vec<PlanSummary>, RepositoryError> {
        let state = self.state.lock().map_err(|_| poisoned())?;
        let mut headers: Vec<_> = state
            .plans
            .iter()
            .filter(|(_, header)| header.owner == owner)
            .collect();
        headers.sort_by(|(a_id, a), (b_id, b)| {
            b.revision.cmp(&a.revision).then_with(|| b_id.cmp(a_id))
        });

        Ok(headers
            .into_iter()
            .map(|(id, header)| PlanSummary {
                id: *id,
                filled_steps: WizardStep::ALL
                    .into_iter()
                    .filter(|step| state.steps.contains_key(&(*id, *step)))
                    .collect(),
                updated_at: header.updated_at,
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn data(value: serde_json::Value) -> StepData {
        serde_json::from_value(value).unwrap()
    }

    fn account(email: &str, role: Role) -> NewAccount {
        NewAccount {
            email: Email::parse(email).unwrap(),
            role,
            display_name: None,
            password_hash: "hash".to_owned(),
            status_approval: ApprovalStatus::Pending,
        }
    }

    #[tokio::test]
    async fn test_first_save_creates_plan() {
        let store = MemoryStepStore::new();
        let owner = UserId::new(1);
        let id = store
            .save_step(owner, PlanTarget::fresh(), WizardStep::Analisis, &data(json!({"a": "1"})))
            .await
            .unwrap();

        assert_eq!(store.owner_of(id).await.unwrap(), Some(owner));
        assert_eq!(
            store.load_step(id, WizardStep::Analisis).await.unwrap(),
            Some(data(json!({"a": "1"})))
        );
        assert_eq!(store.load_step(id, WizardStep::Dokumen).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_to_unknown_plan_is_not_found() {
        let store = MemoryStepStore::new();
        let err = store
            .save_step(
                UserId::new(1),
                PlanTarget::Existing(ProgramPlanId::new(99)),
                WizardStep::Metode,
                &StepData::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
        assert_eq!(store.plan_count(), 0);
    }

    #[tokio::test]
    async fn test_list_plans_only_shows_owner() {
        let store = MemoryStepStore::new();
        let mine = UserId::new(1);
        let id = store
            .save_step(mine, PlanTarget::fresh(), WizardStep::Strategi, &StepData::default())
            .await
            .unwrap();
        store
            .save_step(UserId::new(2), PlanTarget::fresh(), WizardStep::Analisis, &StepData::default())
            .await
            .unwrap();

        let plans = store.list_plans(mine).await.unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].id, id);
        assert_eq!(plans[0].filled_steps, vec![WizardStep::Strategi]);
    }

    #[tokio::test]
    async fn test_list_plans_puts_latest_save_first() {
        let store = MemoryStepStore::new();
        let owner = UserId::new(1);
        let older = store
            .save_step(owner, PlanTarget::fresh(), WizardStep::Analisis, &StepData::default())
            .await
            .unwrap();
        let newer = store
            .save_step(owner, PlanTarget::fresh(), WizardStep::Analisis, &StepData::default())
            .await
            .unwrap();

        let ids: Vec<_> = store.list_plans(owner).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![newer, older]);

        let before = store.list_plans(owner).await.unwrap()[1].updated_at;
        store
            .save_step(owner, PlanTarget::Existing(older), WizardStep::Metode, &StepData::default())
            .await
            .unwrap();

        let plans = store.list_plans(owner).await.unwrap();
        assert_eq!(plans[0].id, older);
        assert_eq!(plans[1].id, newer);
        assert!(plans[0].updated_at >= before);
        assert!(plans[0].updated_at >= plans[1].updated_at);
    }

    #[tokio::test]
    async fn test_same_creation_token_creates_one_plan() {
        let store = MemoryStepStore::new();
        let owner = UserId::new(1);
        let target = PlanTarget::fresh();

        let first = store
            .save_step(owner, target, WizardStep::Analisis, &data(json!({"a": "1"})))
            .await
            .unwrap();
        let second = store
            .save_step(owner, target, WizardStep::Analisis, &data(json!({"a": "2"})))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.plan_count(), 1);
        assert_eq!(
            store.load_step(first, WizardStep::Analisis).await.unwrap(),
            Some(data(json!({"a": "2"})))
        );

        // The token is scoped to its owner.
        let other = store
            .save_step(UserId::new(2), target, WizardStep::Analisis, &StepData::default())
            .await
            .unwrap();
        assert_ne!(other, first);
        assert_eq!(store.owner_of(first).await.unwrap(), Some(owner));
    }

    #[tokio::test]
    async fn test_lookup_fault_injection() {
        let accounts = MemoryAccounts::new();
        let identity = accounts.insert(account("a@b.id", Role::Sekolah)).unwrap();

        accounts.fail_lookups(true);
        assert!(accounts.find_by_id(identity.id).await.is_err());
        accounts.fail_lookups(false);
        assert_eq!(accounts.find_by_id(identity.id).await.unwrap(), Some(identity));
    }

    #[tokio::test]
    async fn test_admins_cannot_be_transitioned() {
        let accounts = MemoryAccounts::new();
        let admin = accounts.insert(account("admin@b.id", Role::Admin)).unwrap();
        let err = accounts
            .set_approval_status(admin.id, ApprovalStatus::Rejected)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
        assert_eq!(accounts.count_by_status().await.unwrap(), ApprovalCounts::default());
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let accounts = MemoryAccounts::new();
        accounts.insert(account("dup@b.id", Role::Pengawas)).unwrap();
        assert!(matches!(
            accounts.insert(account("DUP@b.id", Role::Sekolah)),
            Err(RepositoryError::Conflict(_))
        ));
    }
}
