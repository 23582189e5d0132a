use std::io::BufRead;
use std::sync::Arc;

use crate::app::{AppContext, Result, SyncError};
use crate::domain::{Discussion, NewDiscussion, ReactionKind};
use crate::presenter::{
    Command, CommentsState, DiscussionPresenter, ListState, Notice, NoticeLevel, Notifier,
};

/// Prints notices to the terminal.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info | NoticeLevel::Success => println!("{}", notice.message),
            NoticeLevel::Warning | NoticeLevel::Error => eprintln!("{}", notice.message),
        }
    }

    fn prompt_login(&self) {
        eprintln!("Run `boardsync login` with a GitHub personal access token first.");
    }
}

fn presenter(ctx: &AppContext) -> DiscussionPresenter {
    ctx.presenter(Arc::new(ConsoleNotifier))
}

fn print_discussion_line(discussion: &Discussion) {
    println!(
        "#{:<5} {}  [{}] by {}, {} comments",
        discussion.number,
        discussion.title,
        discussion.category,
        discussion.author.login,
        discussion.comment_count
    );
}

pub async fn login(ctx: &AppContext, token: Option<String>) -> Result<()> {
    let token = match token {
        Some(token) => token,
        None => {
            eprintln!("Paste a GitHub personal access token and press Enter:");
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line
        }
    };
    presenter(ctx).dispatch(Command::Login(token)).await
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    presenter(ctx).dispatch(Command::Logout).await
}

pub async fn whoami(ctx: &AppContext) -> Result<()> {
    match ctx.identity.sync_account_info().await? {
        Some(identity) => {
            println!("{} ({})", identity.login, identity.display_name);
            if let Some(email) = identity.email {
                println!("{}", email);
            }
        }
        None => println!("Not signed in"),
    }
    Ok(())
}

pub async fn list(
    ctx: &AppContext,
    category: Option<String>,
    page: u32,
    search: Option<String>,
) -> Result<()> {
    let presenter = presenter(ctx);
    if let Some(query) = search {
        presenter.dispatch(Command::SetSearch(query)).await?;
    }
    match category {
        Some(category) => presenter.dispatch(Command::SetFilter(category)).await?,
        None if page <= 1 => presenter.dispatch(Command::LoadList).await?,
        None => {}
    }
    // Changing the filter resets the page, so the page goes last.
    if page > 1 {
        presenter.dispatch(Command::SetPage(page)).await?;
    }

    if presenter.list_state() == ListState::Empty {
        println!("No discussions");
        return Ok(());
    }

    let visible = presenter.visible_discussions();
    if visible.is_empty() {
        println!("No discussions match the search");
    }
    for discussion in &visible {
        print_discussion_line(discussion);
    }
    Ok(())
}

pub async fn show(ctx: &AppContext, number: u64) -> Result<()> {
    let presenter = presenter(ctx);
    presenter.dispatch(Command::OpenDetail(number)).await?;

    let detail = presenter
        .detail()
        .ok_or_else(|| SyncError::NotFound(format!("discussion #{}", number)))?;
    let discussion = &detail.discussion;

    println!("#{} {}", discussion.number, discussion.title);
    println!(
        "{} | {} | {}",
        discussion.author.login,
        discussion.category,
        discussion.created_at.format("%Y-%m-%d %H:%M")
    );
    if !discussion.labels.is_empty() {
        println!("Labels: {}", discussion.labels.join(", "));
    }
    println!("{}", discussion.url);
    println!();
    println!("{}", discussion.body);
    println!();

    match &detail.comments {
        CommentsState::Loaded(comments) if comments.is_empty() => println!("No comments"),
        CommentsState::Loaded(comments) => {
            for comment in comments {
                println!(
                    "--- {} on {}",
                    comment.author.login,
                    comment.created_at.format("%Y-%m-%d %H:%M")
                );
                println!("{}", comment.body);
            }
        }
        CommentsState::Loading => println!("Loading comments..."),
        CommentsState::Unavailable => println!("Comments are unavailable right now"),
    }
    if detail.can_delete {
        println!();
        println!("You can delete this discussion with `boardsync delete {}`", number);
    }
    Ok(())
}

pub async fn comment(ctx: &AppContext, number: u64, body: String) -> Result<()> {
    presenter(ctx)
        .dispatch(Command::SubmitComment { number, body })
        .await
}

pub async fn create(
    ctx: &AppContext,
    title: String,
    body: String,
    category: String,
    tags: Vec<String>,
) -> Result<()> {
    let draft = NewDiscussion {
        title,
        body,
        category,
        tags,
    };
    presenter(ctx).dispatch(Command::CreateDiscussion(draft)).await
}

pub async fn react(ctx: &AppContext, number: u64, reaction: &str) -> Result<()> {
    let kind: ReactionKind = reaction.parse().map_err(SyncError::Validation)?;
    presenter(ctx)
        .dispatch(Command::React { number, kind })
        .await?;
    println!("Reacted {} to #{}", kind.as_content(), number);
    Ok(())
}

pub async fn delete(ctx: &AppContext, number: u64) -> Result<()> {
    presenter(ctx).dispatch(Command::Delete(number)).await
}
