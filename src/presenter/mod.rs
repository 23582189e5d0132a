//! View-facing coordinator.
//!
//! [`DiscussionPresenter`] owns the list and detail state a front end renders,
//! turns user intents ([`Command`]) into gateway and identity calls, and
//! reports outcomes through a [`Notifier`]. State sits behind a plain mutex
//! that is never held across an await point.

pub mod control;
pub mod notice;
pub mod state;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::app::{ErrorKind, Result, SyncError};
use crate::config::ListingConfig;
use crate::domain::{Comment, Discussion, Identity, NewDiscussion, ReactionKind};
use crate::gateway::DiscussionGateway;
use crate::identity::{IdentityStore, LoginTransition};

pub use control::{Control, ControlGuard, Controls};
pub use notice::{notice_for, Notice, NoticeLevel, Notifier};
pub use state::{CommentsState, DetailView, ListState, ViewState};

/// Everything a front end can ask the presenter to do.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    LoadList,
    SetFilter(String),
    SetSearch(String),
    SetPage(u32),
    OpenDetail(u64),
    CloseDetail,
    SubmitComment { number: u64, body: String },
    CreateDiscussion(NewDiscussion),
    React { number: u64, kind: ReactionKind },
    Delete(u64),
    Login(String),
    Logout,
    SyncSession,
}

impl Command {
    /// Name for logs. `Login` carries a token, so commands are never logged whole.
    pub fn name(&self) -> &'static str {
        match self {
            Command::LoadList => "load_list",
            Command::SetFilter(_) => "set_filter",
            Command::SetSearch(_) => "set_search",
            Command::SetPage(_) => "set_page",
            Command::OpenDetail(_) => "open_detail",
            Command::CloseDetail => "close_detail",
            Command::SubmitComment { .. } => "submit_comment",
            Command::CreateDiscussion(_) => "create_discussion",
            Command::React { .. } => "react",
            Command::Delete(_) => "delete",
            Command::Login(_) => "login",
            Command::Logout => "logout",
            Command::SyncSession => "sync_session",
        }
    }
}

pub struct DiscussionPresenter {
    gateway: Arc<DiscussionGateway>,
    identity: Arc<IdentityStore>,
    notifier: Arc<dyn Notifier>,
    controls: Controls,
    state: Mutex<ViewState>,
}

impl DiscussionPresenter {
    pub fn new(
        gateway: Arc<DiscussionGateway>,
        identity: Arc<IdentityStore>,
        notifier: Arc<dyn Notifier>,
        listing: &ListingConfig,
    ) -> Self {
        Self {
            gateway,
            identity,
            notifier,
            controls: Controls::default(),
            state: Mutex::new(ViewState::new(
                listing.default_category.clone(),
                listing.page_size,
            )),
        }
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> ViewState {
        self.state().clone()
    }

    pub fn list_state(&self) -> ListState {
        self.state().list.clone()
    }

    pub fn detail(&self) -> Option<DetailView> {
        self.state().detail.clone()
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    fn report(&self, err: &SyncError) {
        self.notifier.notify(notice_for(err));
        if err.kind() == ErrorKind::Authentication {
            self.notifier.prompt_login();
        }
    }

    // ---- list ----

    pub async fn load_list(&self) -> Result<()> {
        let (filter, page, page_size) = {
            let mut state = self.state();
            state.list = ListState::Loading;
            (state.filter.clone(), state.page, state.page_size)
        };

        let result = self.gateway.get_discussions(&filter, page, page_size).await;

        let mut state = self.state();
        if state.filter != filter || state.page != page {
            // A newer load owns the list now.
            tracing::debug!(%filter, page, "discarding stale listing");
            return result.map(|_| ());
        }
        match result {
            Ok(discussions) => {
                state.list = if discussions.is_empty() {
                    ListState::Empty
                } else {
                    ListState::Loaded
                };
                state.discussions = discussions;
                Ok(())
            }
            Err(err) => {
                state.list = ListState::Error(notice_for(&err));
                state.discussions.clear();
                drop(state);
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Reload after a mutation. Failures were already reported by `load_list`.
    async fn refresh(&self) {
        if let Err(err) = self.load_list().await {
            tracing::debug!(error = %err, "refresh after mutation failed");
        }
    }

    pub async fn set_filter(&self, category: &str) -> Result<()> {
        {
            let mut state = self.state();
            state.filter = category.trim().to_string();
            state.page = 1;
        }
        self.load_list().await
    }

    pub async fn set_page(&self, page: u32) -> Result<()> {
        self.state().page = page.max(1);
        self.load_list().await
    }

    /// Narrow the loaded list locally. Never touches the network.
    pub fn set_search(&self, query: &str) {
        self.state().search = query.to_string();
    }

    pub fn visible_discussions(&self) -> Vec<Discussion> {
        self.state().visible()
    }

    // ---- detail ----

    pub async fn show_detail(&self, number: u64) -> Result<()> {
        let loaded = self.state().find(number).cloned();
        let discussion = match loaded {
            Some(discussion) => discussion,
            None => match self.gateway.get_discussion(number).await {
                Ok(discussion) => discussion,
                Err(err) => {
                    self.report(&err);
                    return Err(err);
                }
            },
        };

        let can_delete = self.can_delete(&discussion);
        self.state().detail = Some(DetailView {
            discussion,
            comments: CommentsState::Loading,
            can_delete,
        });

        self.load_comments(number).await;
        Ok(())
    }

    async fn load_comments(&self, number: u64) {
        let comments = match self.gateway.get_comments(number).await {
            Ok(comments) => CommentsState::Loaded(comments),
            Err(err) => {
                tracing::warn!(number, error = %err, "could not load comments");
                CommentsState::Unavailable
            }
        };

        let mut state = self.state();
        if let Some(detail) = state
            .detail
            .as_mut()
            .filter(|d| d.discussion.number == number)
        {
            detail.comments = comments;
        }
    }

    pub fn close_detail(&self) {
        self.state().detail = None;
    }

    pub fn can_delete(&self, discussion: &Discussion) -> bool {
        self.identity
            .identity()
            .is_some_and(|me| discussion.is_authored_by(&me.login))
    }

    // ---- mutations ----

    fn require_session(&self) -> Result<()> {
        if self.identity.is_authenticated() {
            return Ok(());
        }
        let err = SyncError::Authentication("sign in required".into());
        self.report(&err);
        Err(err)
    }

    fn disable(&self, control: Control) -> Result<ControlGuard> {
        self.controls.disable(control).inspect_err(|err| {
            self.notifier.notify(notice_for(err));
        })
    }

    pub async fn submit_comment(&self, number: u64, body: &str) -> Result<Comment> {
        self.require_session()?;
        let guard = self.disable(Control::CommentForm)?;

        let result = self.gateway.add_comment(number, body).await;
        drop(guard);

        match result {
            Ok(comment) => {
                self.notifier.notify(Notice::success("Comment posted."));
                self.refresh().await;
                let detail_open = self
                    .state()
                    .detail
                    .as_ref()
                    .is_some_and(|d| d.discussion.number == number);
                if detail_open {
                    self.load_comments(number).await;
                }
                Ok(comment)
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    pub async fn create_discussion(&self, draft: &NewDiscussion) -> Result<Discussion> {
        self.require_session()?;
        let guard = self.disable(Control::NewDiscussionForm)?;

        let result = self.gateway.create_discussion(draft).await;
        drop(guard);

        match result {
            Ok(discussion) => {
                self.notifier.notify(Notice::success(format!(
                    "Created #{}: {}",
                    discussion.number, discussion.title
                )));
                self.refresh().await;
                Ok(discussion)
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    pub async fn react(&self, number: u64, kind: ReactionKind) -> Result<()> {
        self.require_session()?;
        let guard = self.disable(Control::Reaction)?;

        let result = self.gateway.add_reaction(number, kind).await;
        drop(guard);

        match result {
            Ok(()) => {
                self.refresh().await;
                Ok(())
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Only the author may delete.
    pub async fn delete_discussion(&self, number: u64) -> Result<()> {
        self.require_session()?;

        let known = {
            let state = self.state();
            state.find(number).cloned().or_else(|| {
                state
                    .detail
                    .as_ref()
                    .filter(|d| d.discussion.number == number)
                    .map(|d| d.discussion.clone())
            })
        };
        let discussion = match known {
            Some(discussion) => discussion,
            None => match self.gateway.get_discussion(number).await {
                Ok(discussion) => discussion,
                Err(err) => {
                    self.report(&err);
                    return Err(err);
                }
            },
        };
        if !self.can_delete(&discussion) {
            let err = SyncError::Validation("Only the author can delete this discussion.".into());
            self.report(&err);
            return Err(err);
        }

        let guard = self.disable(Control::Delete)?;
        let result = self.gateway.delete_discussion(number).await;
        drop(guard);

        match result {
            Ok(()) => {
                {
                    let mut state = self.state();
                    if state
                        .detail
                        .as_ref()
                        .is_some_and(|d| d.discussion.number == number)
                    {
                        state.detail = None;
                    }
                }
                self.notifier
                    .notify(Notice::success(format!("Deleted #{}.", number)));
                self.refresh().await;
                Ok(())
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    // ---- session ----

    pub async fn login(&self, token: &str) -> Result<Identity> {
        match self.identity.login(token).await {
            Ok(identity) => {
                self.notifier
                    .notify(Notice::success(format!("Signed in as {}.", identity.login)));
                self.session_changed().await;
                Ok(identity)
            }
            Err(err) => {
                self.notifier.notify(notice_for(&err));
                Err(err)
            }
        }
    }

    pub async fn logout(&self) -> Result<()> {
        self.identity.logout()?;
        self.notifier.notify(Notice::info("Signed out."));
        self.session_changed().await;
        Ok(())
    }

    /// Re-validate the stored credential and pick up changes made by other processes.
    pub async fn sync_session(&self) -> Result<()> {
        let was_authenticated = self.identity.is_authenticated();

        self.identity.sync_account_info().await?;
        match self.identity.poll_external_change()? {
            Some(LoginTransition::LoggedIn(identity)) => self
                .notifier
                .notify(Notice::info(format!("Signed in as {} elsewhere.", identity.login))),
            Some(LoginTransition::LoggedOut) => {
                self.notifier.notify(Notice::info("Signed out elsewhere."))
            }
            None => {}
        }

        if self.identity.is_authenticated() != was_authenticated {
            self.session_changed().await;
        }
        Ok(())
    }

    /// Listing cache keys include the auth flag, so a session change needs a reload.
    async fn session_changed(&self) {
        {
            let mut state = self.state();
            let me = self.identity.identity();
            if let Some(detail) = state.detail.as_mut() {
                detail.can_delete = me
                    .as_ref()
                    .is_some_and(|me| detail.discussion.is_authored_by(&me.login));
            }
        }
        self.refresh().await;
    }

    pub async fn dispatch(&self, command: Command) -> Result<()> {
        tracing::debug!(command = command.name(), "dispatch");
        match command {
            Command::LoadList => self.load_list().await,
            Command::SetFilter(category) => self.set_filter(&category).await,
            Command::SetSearch(query) => {
                self.set_search(&query);
                Ok(())
            }
            Command::SetPage(page) => self.set_page(page).await,
            Command::OpenDetail(number) => self.show_detail(number).await,
            Command::CloseDetail => {
                self.close_detail();
                Ok(())
            }
            Command::SubmitComment { number, body } => {
                self.submit_comment(number, &body).await.map(|_| ())
            }
            Command::CreateDiscussion(draft) => self.create_discussion(&draft).await.map(|_| ()),
            Command::React { number, kind } => self.react(number, kind).await,
            Command::Delete(number) => self.delete_discussion(number).await,
            Command::Login(token) => self.login(&token).await.map(|_| ()),
            Command::Logout => self.logout().await,
            Command::SyncSession => self.sync_session().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::app::AppContext;
    use crate::github::rest::fixtures::{comment, issue, profile};
    use crate::store::{SqliteStorage, Storage};
    use crate::testing;

    #[derive(Default)]
    struct RecordingNotifier {
        notices: Mutex<Vec<Notice>>,
        prompts: AtomicUsize,
    }

    impl RecordingNotifier {
        fn notices(&self) -> Vec<Notice> {
            self.notices.lock().unwrap().clone()
        }

        fn prompts(&self) -> usize {
            self.prompts.load(Ordering::SeqCst)
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }

        fn prompt_login(&self) {
            self.prompts.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Harness {
        ctx: AppContext,
        presenter: DiscussionPresenter,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(server: &MockServer, login: Option<&str>) -> Harness {
        let config = testing::config(&server.uri());
        let storage: Arc<dyn Storage + Send + Sync> = match login {
            Some(login) => Arc::new(testing::seeded_storage(login)),
            None => Arc::new(SqliteStorage::in_memory().unwrap()),
        };
        let ctx = AppContext::with_storage(config, storage).unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let presenter = ctx.presenter(notifier.clone());
        Harness {
            ctx,
            presenter,
            notifier,
        }
    }

    async fn mount_issues(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/repos/acme/site/issues"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn request_count(server: &MockServer) -> usize {
        server.received_requests().await.unwrap().len()
    }

    #[tokio::test]
    async fn load_list_moves_to_loaded_or_empty() {
        let server = MockServer::start().await;
        mount_issues(&server, json!([issue(1, "Hello", &[], "octocat")])).await;
        let h = harness(&server, None);
        assert_eq!(h.presenter.list_state(), ListState::Idle);

        h.presenter.load_list().await.unwrap();
        assert_eq!(h.presenter.list_state(), ListState::Loaded);
        assert_eq!(h.presenter.visible_discussions().len(), 1);

        h.presenter.set_filter("nothing-matches").await.unwrap();
        assert_eq!(h.presenter.list_state(), ListState::Empty);
    }

    #[tokio::test]
    async fn load_failure_sets_error_state_and_notifies() {
        let server = MockServer::start().await;
        Mock::given(path("/repos/acme/site/issues"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let h = harness(&server, None);

        let err = h.presenter.load_list().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        let expected = notice_for(&err);
        assert_eq!(h.presenter.list_state(), ListState::Error(expected.clone()));
        assert_eq!(h.notifier.notices(), vec![expected]);
        assert_eq!(h.notifier.prompts(), 0);
    }

    #[tokio::test]
    async fn set_filter_resets_page() {
        let server = MockServer::start().await;
        mount_issues(&server, json!([issue(1, "Question", &["qa"], "octocat")])).await;
        let h = harness(&server, None);

        h.presenter.set_page(3).await.unwrap();
        assert_eq!(h.presenter.snapshot().page, 3);

        h.presenter.set_filter("qa").await.unwrap();
        let state = h.presenter.snapshot();
        assert_eq!(state.page, 1);
        assert_eq!(state.filter, "qa");

        let last = server.received_requests().await.unwrap().pop().unwrap();
        assert!(last.url.query().unwrap().contains("page=1"));
    }

    #[tokio::test]
    async fn set_page_is_at_least_one() {
        let server = MockServer::start().await;
        Mock::given(path("/repos/acme/site/issues"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        let h = harness(&server, None);

        h.presenter.set_page(0).await.unwrap();
        assert_eq!(h.presenter.snapshot().page, 1);
    }

    #[tokio::test]
    async fn search_is_local() {
        let server = MockServer::start().await;
        mount_issues(
            &server,
            json!([
                issue(1, "Dark mode", &[], "octocat"),
                issue(2, "Crash report", &[], "octocat"),
            ]),
        )
        .await;
        let h = harness(&server, None);
        h.presenter.load_list().await.unwrap();
        let before = request_count(&server).await;

        h.presenter
            .dispatch(Command::SetSearch("DARK".into()))
            .await
            .unwrap();

        let visible = h.presenter.visible_discussions();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].number, 1);
        assert_eq!(request_count(&server).await, before);
        assert_eq!(h.presenter.snapshot().discussions.len(), 2);
    }

    #[tokio::test]
    async fn detail_shows_loaded_discussion_and_comments() {
        let server = MockServer::start().await;
        mount_issues(&server, json!([issue(42, "Hello", &[], "octocat")])).await;
        Mock::given(path("/repos/acme/site/issues/42/comments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                comment(1, "First!", "hubot")
            ])))
            .mount(&server)
            .await;
        let h = harness(&server, Some("octocat"));
        h.presenter.load_list().await.unwrap();

        h.presenter.show_detail(42).await.unwrap();

        let detail = h.presenter.detail().unwrap();
        assert_eq!(detail.discussion.number, 42);
        assert!(detail.can_delete);
        match detail.comments {
            CommentsState::Loaded(comments) => assert_eq!(comments[0].body, "First!"),
            other => panic!("unexpected comments state: {:?}", other),
        }
    }

    #[tokio::test]
    async fn comment_failure_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(path("/repos/acme/site/issues/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(issue(7, "Deep link", &[], "someone")))
            .mount(&server)
            .await;
        Mock::given(path("/repos/acme/site/issues/7/comments"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let h = harness(&server, Some("octocat"));

        h.presenter.show_detail(7).await.unwrap();

        let detail = h.presenter.detail().unwrap();
        assert_eq!(detail.comments, CommentsState::Unavailable);
        assert!(!detail.can_delete);
        assert!(h.notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn unauthenticated_comment_prompts_login_without_network() {
        let server = MockServer::start().await;
        let h = harness(&server, None);

        let err = h.presenter.submit_comment(42, "Thanks!").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(h.notifier.prompts(), 1);
        assert_eq!(h.notifier.notices().len(), 1);
        assert!(h.presenter.controls().is_enabled(Control::CommentForm));
        assert_eq!(request_count(&server).await, 0);
    }

    #[tokio::test]
    async fn busy_control_rejects_second_submission() {
        let server = MockServer::start().await;
        let h = harness(&server, Some("octocat"));
        let _held = h.presenter.controls().disable(Control::CommentForm).unwrap();

        let err = h.presenter.submit_comment(42, "Thanks!").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("already in progress"));
        assert_eq!(request_count(&server).await, 0);
    }

    #[tokio::test]
    async fn comment_success_reenables_control_and_reloads_thread() {
        let server = MockServer::start().await;
        mount_issues(&server, json!([issue(42, "Hello", &[], "octocat")])).await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/site/issues/42/comments"))
            .respond_with(ResponseTemplate::new(201).set_body_json(comment(2, "Thanks!", "octocat")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/site/issues/42/comments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                comment(1, "First!", "hubot"),
                comment(2, "Thanks!", "octocat"),
            ])))
            .mount(&server)
            .await;
        Mock::given(path("/graphql"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let h = harness(&server, Some("octocat"));
        h.presenter.load_list().await.unwrap();
        h.presenter.show_detail(42).await.unwrap();

        let created = h.presenter.submit_comment(42, "Thanks!").await.unwrap();

        assert_eq!(created.id, 2);
        assert!(h.presenter.controls().is_enabled(Control::CommentForm));
        match h.presenter.detail().unwrap().comments {
            CommentsState::Loaded(comments) => assert_eq!(comments.len(), 2),
            other => panic!("unexpected comments state: {:?}", other),
        }
        assert!(h
            .notifier
            .notices()
            .iter()
            .any(|n| n.level == NoticeLevel::Success));
    }

    #[tokio::test]
    async fn overlapping_submissions_only_send_one() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/site/issues/42/comments"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(comment(2, "Thanks!", "octocat"))
                    .set_delay(std::time::Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;
        mount_issues(&server, json!([])).await;
        Mock::given(path("/graphql"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let h = harness(&server, Some("octocat"));

        let (first, second) = futures::join!(
            h.presenter.submit_comment(42, "Thanks!"),
            h.presenter.submit_comment(42, "Thanks!")
        );

        assert!(first.is_ok());
        assert_eq!(second.unwrap_err().kind(), ErrorKind::Validation);
        assert!(h.presenter.controls().is_enabled(Control::CommentForm));
    }

    #[tokio::test]
    async fn invalid_comment_reenables_control() {
        let server = MockServer::start().await;
        let h = harness(&server, Some("octocat"));

        let err = h.presenter.submit_comment(42, "x").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(h.presenter.controls().is_enabled(Control::CommentForm));
        assert_eq!(h.notifier.prompts(), 0);
        assert_eq!(request_count(&server).await, 0);
    }

    #[tokio::test]
    async fn only_author_can_delete() {
        let server = MockServer::start().await;
        mount_issues(&server, json!([issue(5, "Not mine", &[], "someone")])).await;
        Mock::given(path("/graphql"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let h = harness(&server, Some("octocat"));
        h.presenter.load_list().await.unwrap();

        let err = h.presenter.delete_discussion(5).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn author_delete_closes_detail() {
        let server = MockServer::start().await;
        Mock::given(path("/repos/acme/site/issues/5"))
            .and(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(issue(5, "Mine", &[], "octocat")))
            .mount(&server)
            .await;
        Mock::given(path("/repos/acme/site/issues/5/comments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/repos/acme/site/issues/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(issue(5, "[Deleted]", &[], "octocat")))
            .expect(1)
            .mount(&server)
            .await;
        mount_issues(&server, json!([])).await;
        Mock::given(path("/graphql"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let h = harness(&server, Some("octocat"));
        h.presenter.dispatch(Command::OpenDetail(5)).await.unwrap();

        h.presenter.dispatch(Command::Delete(5)).await.unwrap();

        assert!(h.presenter.detail().is_none());
        assert_eq!(h.presenter.list_state(), ListState::Empty);
        assert!(h.presenter.controls().is_enabled(Control::Delete));
    }

    #[tokio::test]
    async fn rejected_login_leaves_session_empty() {
        let server = MockServer::start().await;
        Mock::given(path("/user"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        let h = harness(&server, None);

        let err = h
            .presenter
            .dispatch(Command::Login("ghp_wrong".into()))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert!(!h.ctx.identity.is_authenticated());
        assert_eq!(h.notifier.notices().len(), 1);
    }

    #[tokio::test]
    async fn login_reloads_list_and_enables_delete() {
        let server = MockServer::start().await;
        Mock::given(path("/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile("octocat", Some("Mona"))))
            .mount(&server)
            .await;
        Mock::given(path("/repos/acme/site/issues/9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(issue(9, "Mine", &[], "octocat")))
            .mount(&server)
            .await;
        Mock::given(path("/repos/acme/site/issues/9/comments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(path("/graphql"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        mount_issues(&server, json!([])).await;
        let h = harness(&server, None);
        h.presenter.show_detail(9).await.unwrap();
        assert!(!h.presenter.detail().unwrap().can_delete);

        h.presenter.login("ghp_valid_token").await.unwrap();

        assert!(h.presenter.detail().unwrap().can_delete);
        assert_eq!(h.presenter.list_state(), ListState::Empty);
    }

    #[tokio::test]
    async fn sync_session_follows_logout_elsewhere() {
        let server = MockServer::start().await;
        mount_issues(&server, json!([])).await;
        let h = harness(&server, Some("octocat"));
        let other = IdentityStore::new(
            h.ctx.storage.clone(),
            Arc::new(crate::github::RestClient::new(
                testing::executor(&h.ctx.config),
                &h.ctx.config,
            )),
        )
        .unwrap();
        other.logout().unwrap();

        h.presenter.dispatch(Command::SyncSession).await.unwrap();

        assert!(!h.ctx.identity.is_authenticated());
        assert_eq!(h.presenter.list_state(), ListState::Empty);
    }
}
