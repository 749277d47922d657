use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::api::{AppApi, GithubError, InstallationApi, RemoveOutcome};
use crate::utils::check_run::{CheckRun, CheckRunPayload};
use crate::utils::pr_info::{PullRequest, RepoRef};
use crate::utils::review_event::{ReviewEvent, TimelineEvent};

/// A write the fake received, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    AddLabels { number: u64, labels: Vec<String> },
    RemoveLabel { number: u64, label: String },
    CreateCheckRun { sha: String, payload: CheckRunPayload },
    UpdateCheckRun { id: u64, payload: CheckRunPayload },
    CreateComment { number: u64, body: String },
}

#[derive(Default)]
struct FakeState {
    installations: Vec<u64>,
    repos: Vec<RepoRef>,
    prs: Vec<PullRequest>,
    labels: HashMap<u64, Vec<String>>,
    check_runs: Vec<(String, CheckRun)>,
    next_check_id: u64,
    reviews: HashMap<u64, Vec<ReviewEvent>>,
    comments: HashMap<u64, Vec<ReviewEvent>>,
    timeline: HashMap<u64, Vec<TimelineEvent>>,
    teams: HashMap<(String, String), Vec<String>>,
    team_lookups: usize,
    failing_prs: HashSet<u64>,
    page_size: usize,
    mutations: Vec<Mutation>,
}

/// In-memory GitHub used by the governance tests. Serves as both the app and
/// every installation.
#[derive(Clone)]
pub struct FakeGithub {
    bot_login: String,
    state: Arc<Mutex<FakeState>>,
}

impl FakeGithub {
    pub fn new(bot_login: &str) -> Self {
        let state = FakeState {
            installations: vec![1],
            next_check_id: 1,
            page_size: 100,
            ..Default::default()
        };
        Self {
            bot_login: bot_login.to_string(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn add_pr(&self, pr: PullRequest) {
        let mut state = self.state();
        if !state.repos.contains(pr.repo()) {
            state.repos.push(pr.repo().clone());
        }
        state.labels.insert(pr.number(), pr.labels().clone());
        state.prs.retain(|p| p.number() != pr.number());
        state.prs.push(pr);
    }

    pub fn set_installations(&self, installations: Vec<u64>) {
        self.state().installations = installations;
    }

    pub fn set_page_size(&self, page_size: usize) {
        self.state().page_size = page_size;
    }

    pub fn set_labels(&self, number: u64, labels: &[&str]) {
        self.state()
            .labels
            .insert(number, labels.iter().map(|l| l.to_string()).collect());
    }

    pub fn add_review(&self, number: u64, review: ReviewEvent) {
        self.state().reviews.entry(number).or_default().push(review);
    }

    pub fn add_comment(&self, number: u64, comment: ReviewEvent) {
        self.state().comments.entry(number).or_default().push(comment);
    }

    pub fn set_comments(&self, number: u64, comments: Vec<ReviewEvent>) {
        self.state().comments.insert(number, comments);
    }

    pub fn add_timeline_event(&self, number: u64, event: TimelineEvent) {
        self.state().timeline.entry(number).or_default().push(event);
    }

    pub fn set_team(&self, org: &str, slug: &str, members: &[&str]) {
        self.state().teams.insert(
            (org.to_string(), slug.to_string()),
            members.iter().map(|m| m.to_string()).collect(),
        );
    }

    pub fn add_check_run(&self, sha: &str, run: CheckRun) {
        let mut state = self.state();
        state.next_check_id = state.next_check_id.max(run.id() + 1);
        state.check_runs.push((sha.to_string(), run));
    }

    pub fn fail_pr(&self, number: u64) {
        self.state().failing_prs.insert(number);
    }

    pub fn labels(&self, number: u64) -> Vec<String> {
        self.state().labels.get(&number).cloned().unwrap_or_default()
    }

    pub fn check_runs(&self, sha: &str) -> Vec<CheckRun> {
        self.state()
            .check_runs
            .iter()
            .filter(|(s, _)| s == sha)
            .map(|(_, run)| run.clone())
            .collect()
    }

    pub fn check_run(&self, sha: &str, name: &str) -> Option<CheckRun> {
        self.check_runs(sha).into_iter().find(|run| run.name() == name)
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.state().mutations.clone()
    }

    pub fn clear_mutations(&self) {
        self.state().mutations.clear();
    }

    pub fn team_lookups(&self) -> usize {
        self.state().team_lookups
    }

    fn fail_if_broken(&self, number: u64) -> Result<(), GithubError> {
        if self.state().failing_prs.contains(&number) {
            return Err(GithubError::Status {
                url: format!("fake://pulls/{}", number),
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(())
    }

    fn with_current_labels(&self, pr: &PullRequest) -> PullRequest {
        let mut pr = pr.clone();
        pr.set_labels(self.labels(pr.number()));
        pr
    }
}

fn stored_run(id: u64, payload: &CheckRunPayload) -> CheckRun {
    CheckRun::new(
        id,
        payload.name(),
        payload.status(),
        payload.conclusion(),
        Some(payload.title().clone()),
        Some(payload.summary().clone()),
    )
}

#[async_trait]
impl AppApi for FakeGithub {
    async fn list_installations(&self) -> Result<Vec<u64>, GithubError> {
        Ok(self.state().installations.clone())
    }

    async fn installation(&self, _installation_id: u64) -> Result<Arc<dyn InstallationApi>, GithubError> {
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl InstallationApi for FakeGithub {
    async fn list_repos(&self) -> Result<Vec<RepoRef>, GithubError> {
        Ok(self.state().repos.clone())
    }

    async fn list_open_prs(&self, repo: &RepoRef, page: u32) -> Result<Vec<PullRequest>, GithubError> {
        let (prs, page_size) = {
            let state = self.state();
            let prs: Vec<PullRequest> = state.prs.iter().filter(|p| p.repo() == repo).cloned().collect();
            (prs, state.page_size)
        };
        let start = (page.max(1) as usize - 1) * page_size;
        Ok(prs
            .iter()
            .skip(start)
            .take(page_size)
            .map(|pr| self.with_current_labels(pr))
            .collect())
    }

    async fn get_pull_request(&self, repo: &RepoRef, number: u64) -> Result<PullRequest, GithubError> {
        self.fail_if_broken(number)?;
        let pr = self
            .state()
            .prs
            .iter()
            .find(|p| p.repo() == repo && p.number() == number)
            .cloned();
        match pr {
            Some(pr) => Ok(self.with_current_labels(&pr)),
            None => Err(GithubError::Status {
                url: format!("fake://{}/pulls/{}", repo, number),
                status: 404,
                body: "Not Found".to_string(),
            }),
        }
    }

    async fn list_labels(&self, _repo: &RepoRef, number: u64) -> Result<Vec<String>, GithubError> {
        self.fail_if_broken(number)?;
        Ok(self.labels(number))
    }

    async fn add_labels(&self, _repo: &RepoRef, number: u64, labels: &[String]) -> Result<(), GithubError> {
        let mut state = self.state();
        state.mutations.push(Mutation::AddLabels {
            number,
            labels: labels.to_vec(),
        });
        let current = state.labels.entry(number).or_default();
        for label in labels {
            if !current.contains(label) {
                current.push(label.clone());
            }
        }
        Ok(())
    }

    async fn remove_label(&self, _repo: &RepoRef, number: u64, label: &str) -> Result<RemoveOutcome, GithubError> {
        let mut state = self.state();
        state.mutations.push(Mutation::RemoveLabel {
            number,
            label: label.to_string(),
        });
        let current = state.labels.entry(number).or_default();
        let before = current.len();
        current.retain(|l| l != label);
        if current.len() == before {
            return Ok(RemoveOutcome::NotFound);
        }
        Ok(RemoveOutcome::Removed)
    }

    async fn list_check_runs_for_ref(&self, _repo: &RepoRef, sha: &str) -> Result<Vec<CheckRun>, GithubError> {
        Ok(self.check_runs(sha))
    }

    async fn create_check_run(&self, _repo: &RepoRef, sha: &str, payload: &CheckRunPayload) -> Result<(), GithubError> {
        let mut state = self.state();
        let id = state.next_check_id;
        state.next_check_id += 1;
        state.mutations.push(Mutation::CreateCheckRun {
            sha: sha.to_string(),
            payload: payload.clone(),
        });
        state.check_runs.push((sha.to_string(), stored_run(id, payload)));
        Ok(())
    }

    async fn update_check_run(
        &self,
        _repo: &RepoRef,
        check_run_id: u64,
        payload: &CheckRunPayload,
    ) -> Result<(), GithubError> {
        let mut state = self.state();
        state.mutations.push(Mutation::UpdateCheckRun {
            id: check_run_id,
            payload: payload.clone(),
        });
        for (_, run) in state.check_runs.iter_mut() {
            if run.id() == check_run_id {
                *run = stored_run(check_run_id, payload);
            }
        }
        Ok(())
    }

    async fn list_reviews(&self, _repo: &RepoRef, number: u64) -> Result<Vec<ReviewEvent>, GithubError> {
        Ok(self.state().reviews.get(&number).cloned().unwrap_or_default())
    }

    async fn list_issue_comments(&self, _repo: &RepoRef, number: u64) -> Result<Vec<ReviewEvent>, GithubError> {
        Ok(self.state().comments.get(&number).cloned().unwrap_or_default())
    }

    async fn create_issue_comment(&self, _repo: &RepoRef, number: u64, body: &str) -> Result<(), GithubError> {
        let now: DateTime<Utc> = Utc::now();
        let mut state = self.state();
        state.mutations.push(Mutation::CreateComment {
            number,
            body: body.to_string(),
        });
        state
            .comments
            .entry(number)
            .or_default()
            .push(ReviewEvent::new(&self.bot_login, body, None, now));
        Ok(())
    }

    async fn list_timeline_events(&self, _repo: &RepoRef, number: u64) -> Result<Vec<TimelineEvent>, GithubError> {
        Ok(self.state().timeline.get(&number).cloned().unwrap_or_default())
    }

    async fn list_team_members(&self, org: &str, team_slug: &str) -> Result<Vec<String>, GithubError> {
        let mut state = self.state();
        state.team_lookups += 1;
        Ok(state
            .teams
            .get(&(org.to_string(), team_slug.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
