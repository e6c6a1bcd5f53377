//! In-memory identity provider for reconciler tests.
//!
//! Records every call, answers membership reads from sets, and lets tests
//! script failures per login. A successful invite or team add makes the
//! contributor a member, so a second run observes the new state.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use membership::{
    ConfigurationError, ContributorSet, InvitationTarget, Login, MembershipProvider,
    OrganizationName, ProviderError, TeamSlug,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    VerifyTarget,
    IsOrgMember(String),
    IsTeamMember(String),
    InviteToOrg(String),
    AddToTeam(String),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::InviteToOrg(_) | Self::AddToTeam(_))
    }

    pub fn login(&self) -> Option<&str> {
        match self {
            Self::VerifyTarget => None,
            Self::IsOrgMember(l) | Self::IsTeamMember(l) | Self::InviteToOrg(l) | Self::AddToTeam(l) => {
                Some(l)
            }
        }
    }
}

#[derive(Debug, Default)]
struct State {
    org_members: HashSet<String>,
    team_members: HashSet<String>,
    read_failures: HashMap<String, VecDeque<ProviderError>>,
    mutation_failures: HashMap<String, VecDeque<ProviderError>>,
    mutation_delays: HashMap<String, Duration>,
    target_error: Option<ConfigurationError>,
    calls: Vec<Call>,
}

#[derive(Debug, Default)]
pub struct FakeProvider {
    state: Mutex<State>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_org_members(self, logins: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .org_members
            .extend(logins.iter().map(|l| l.to_string()));
        self
    }

    /// Team members are also organisation members.
    pub fn with_team_members(self, logins: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.org_members.extend(logins.iter().map(|l| l.to_string()));
            state.team_members.extend(logins.iter().map(|l| l.to_string()));
        }
        self
    }

    /// The next membership reads for `login` fail with `errors`, in order.
    pub fn failing_reads(self, login: &str, errors: Vec<ProviderError>) -> Self {
        self.state
            .lock()
            .unwrap()
            .read_failures
            .insert(login.to_string(), errors.into());
        self
    }

    /// The next invites or team adds for `login` fail with `errors`, in order.
    pub fn failing_mutations(self, login: &str, errors: Vec<ProviderError>) -> Self {
        self.state
            .lock()
            .unwrap()
            .mutation_failures
            .insert(login.to_string(), errors.into());
        self
    }

    pub fn slow_mutations(self, login: &str, delay: Duration) -> Self {
        self.state
            .lock()
            .unwrap()
            .mutation_delays
            .insert(login.to_string(), delay);
        self
    }

    pub fn rejecting_target(self, error: ConfigurationError) -> Self {
        self.state.lock().unwrap().target_error = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn calls_for(&self, login: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.login() == Some(login))
            .collect()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn next_read_failure(&self, login: &Login) -> Option<ProviderError> {
        self.state
            .lock()
            .unwrap()
            .read_failures
            .get_mut(login.as_str())
            .and_then(VecDeque::pop_front)
    }

    async fn mutate(&self, call: Call, login: &Login, team: bool) -> Result<(), ProviderError> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(call);
            state.mutation_delays.get(login.as_str()).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        if let Some(error) = state
            .mutation_failures
            .get_mut(login.as_str())
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }
        state.org_members.insert(login.to_string());
        if team {
            state.team_members.insert(login.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipProvider for FakeProvider {
    async fn verify_target(&self, _target: &InvitationTarget) -> Result<(), ConfigurationError> {
        self.record(Call::VerifyTarget);
        match self.state.lock().unwrap().target_error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn is_org_member(
        &self,
        _organization: &OrganizationName,
        login: &Login,
    ) -> Result<bool, ProviderError> {
        self.record(Call::IsOrgMember(login.to_string()));
        if let Some(error) = self.next_read_failure(login) {
            return Err(error);
        }
        Ok(self.state.lock().unwrap().org_members.contains(login.as_str()))
    }

    async fn is_team_member(
        &self,
        _organization: &OrganizationName,
        _team: &TeamSlug,
        login: &Login,
    ) -> Result<bool, ProviderError> {
        self.record(Call::IsTeamMember(login.to_string()));
        if let Some(error) = self.next_read_failure(login) {
            return Err(error);
        }
        Ok(self.state.lock().unwrap().team_members.contains(login.as_str()))
    }

    async fn invite_to_org(
        &self,
        target: &InvitationTarget,
        login: &Login,
    ) -> Result<(), ProviderError> {
        self.mutate(Call::InviteToOrg(login.to_string()), login, target.team.is_some())
            .await
    }

    async fn add_to_team(
        &self,
        _organization: &OrganizationName,
        _team: &TeamSlug,
        login: &Login,
    ) -> Result<(), ProviderError> {
        self.mutate(Call::AddToTeam(login.to_string()), login, true)
            .await
    }
}

pub fn login(name: &str) -> Login {
    Login::new(name).unwrap()
}

pub fn contributors(names: &[&str]) -> ContributorSet {
    names.iter().map(|n| login(n)).collect()
}

pub fn org_target() -> InvitationTarget {
    InvitationTarget::new(OrganizationName::new("acme").unwrap())
}

pub fn team_target() -> InvitationTarget {
    org_target().with_team(TeamSlug::new("contributors").unwrap())
}
