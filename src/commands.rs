//! Command implementations for the `taskdesk` binary.
//!
//! Every command works against one [`ClientContext`]. View commands go through
//! the route guard first, so an anonymous caller is sent to login and a role
//! without access to a page gets the dashboard instead.

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use std::io::{self, BufRead, Write};

use taskdesk::auth::rbac::Role;
use taskdesk::error::ClientError;
use taskdesk::models::{TaskPayload, TaskStatus, User, UserPayload};
use taskdesk::router::{self, Route};
use taskdesk::views::{DashboardView, TaskFilter, TasksView, UsersView};
use taskdesk::ClientContext;

/// Exit codes for taskdesk commands.
pub mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    /// The server rejected the stored session and the user was logged out.
    pub const SESSION_EXPIRED: u8 = 2;
}

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// List visible tasks
    #[command(alias = "ls")]
    List {
        /// Only tasks assigned to this user id
        #[arg(long)]
        assignee: Option<i64>,

        /// Only tasks with this status (todo, "in progress", done)
        #[arg(long)]
        status: Option<TaskStatus>,
    },

    /// Create a task
    Create(TaskFields),

    /// Replace a task's fields
    Update {
        id: i64,

        #[command(flatten)]
        fields: TaskFields,
    },

    /// Change only a task's status
    Status { id: i64, status: TaskStatus },

    /// Assign a task to another user
    Assign { id: i64, assignee: i64 },

    /// Delete a task
    Delete { id: i64 },
}

#[derive(Debug, Args)]
pub struct TaskFields {
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub description: Option<String>,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<NaiveDate>,

    #[arg(long)]
    pub assignee: Option<i64>,

    #[arg(long, default_value = "todo")]
    pub status: TaskStatus,
}

impl From<TaskFields> for TaskPayload {
    fn from(fields: TaskFields) -> Self {
        Self {
            title: fields.title,
            description: fields.description,
            due_date: fields.due,
            assignee_id: fields.assignee,
            status: fields.status,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// List team members
    #[command(alias = "ls")]
    List,

    /// Create a user (Admin only)
    Create(UserFields),

    /// Replace a user's details (Admin only)
    Update {
        id: i64,

        #[command(flatten)]
        fields: UserFields,
    },

    /// Delete a user (Admin only)
    Delete { id: i64 },
}

#[derive(Debug, Args)]
pub struct UserFields {
    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, default_value = "Member")]
    pub role: Role,

    /// Mark the account inactive
    #[arg(long)]
    pub inactive: bool,
}

impl From<UserFields> for UserPayload {
    fn from(fields: UserFields) -> Self {
        Self {
            username: fields.username,
            email: fields.email,
            role: fields.role,
            is_active: !fields.inactive,
        }
    }
}

/// Maps a command result to an exit code, reporting failures on stderr.
pub fn finish(ctx: &ClientContext, result: Result<(), ClientError>) -> u8 {
    match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) if e.is_session_rejection() => {
            tracing::debug!(signals = ctx.signal.raised_count(), "command ended by forced logout");
            eprintln!("Your session has expired. Redirecting to {}", Route::Login);
            eprintln!("Run `taskdesk login <username>` to sign in again.");
            exit_codes::SESSION_EXPIRED
        }
        // the guard already printed the redirect
        Err(ClientError::NotAuthenticated) => exit_codes::ERROR,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            exit_codes::ERROR
        }
    }
}

/// Resolves where `route` lands. `None` means the caller must log in first.
fn enter(ctx: &ClientContext, route: Route) -> Option<Route> {
    let landing = router::guard(route, &ctx.auth.state());
    match landing {
        Route::Login => {
            eprintln!("Not logged in. Redirecting to {}", Route::Login);
            eprintln!("Run `taskdesk login <username>` first.");
            None
        }
        landing if landing != route => {
            eprintln!("{} is not available for your role; showing {}", route.title(), landing.title());
            Some(landing)
        }
        landing => Some(landing),
    }
}

pub async fn login(ctx: &ClientContext, username: &str, password: Option<String>) -> Result<(), ClientError> {
    if ctx.auth.is_authenticated() {
        tracing::info!("replacing the existing session");
    }
    let password = match password {
        Some(password) => password,
        None => read_password()?,
    };
    let user = ctx.auth.login(username, &password).await?;
    println!("Logged in as {} ({})", user.username, user.role);
    print_nav(&user);
    Ok(())
}

fn read_password() -> Result<String, ClientError> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}

pub fn logout(ctx: &ClientContext) -> Result<(), ClientError> {
    ctx.auth.logout();
    println!("Logged out. Redirecting to {}", Route::Login);
    Ok(())
}

pub fn whoami(ctx: &ClientContext) -> Result<(), ClientError> {
    if enter(ctx, Route::Profile).is_none() {
        return Err(ClientError::NotAuthenticated);
    }
    let profile = ctx.profile_view()?;
    println!("Username: {}", profile.username);
    println!("Email:    {}", profile.email);
    println!("Role:     {}", profile.role);
    println!("Status:   {}", profile.status);
    if let Some(user) = ctx.auth.current_user() {
        print_nav(&user);
    }
    Ok(())
}

fn print_nav(user: &User) {
    let items: Vec<&str> = router::nav_items(user).iter().map(|r| r.title()).collect();
    println!("Navigation: {}", items.join(" | "));
}

pub async fn dashboard(ctx: &ClientContext) -> Result<(), ClientError> {
    if enter(ctx, Route::Dashboard).is_none() {
        return Err(ClientError::NotAuthenticated);
    }
    render_dashboard(ctx).await
}

async fn render_dashboard(ctx: &ClientContext) -> Result<(), ClientError> {
    let mut view: DashboardView = ctx.dashboard_view();
    let loaded = view.load().await;
    if let Err(e) = &loaded {
        if e.is_session_rejection() {
            return loaded;
        }
    }

    println!("{}", view.greeting());
    println!();
    for card in view.cards() {
        println!("  {:<14} {:>5}   ({})", card.label, card.value, card.route);
    }
    println!();
    println!("Recent Activity");
    if view.activity().is_empty() {
        println!("  No recent activity.");
    }
    for entry in view.activity() {
        let when = entry
            .updated_on
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {} updated by {}  {}", entry.title, entry.updated_by, when);
    }
    loaded
}

pub async fn tasks(ctx: &ClientContext, command: TaskCommand) -> Result<(), ClientError> {
    match enter(ctx, Route::Tasks) {
        None => return Err(ClientError::NotAuthenticated),
        Some(Route::Tasks) => {}
        Some(_) => return render_dashboard(ctx).await,
    }

    let mut view = ctx.tasks_view();
    view.load().await?;

    match command {
        TaskCommand::List { assignee, status } => {
            view.set_filter(TaskFilter {
                assignee_id: assignee,
                status,
            });
            print_tasks(&view);
            Ok(())
        }
        TaskCommand::Create(fields) => {
            view.create(fields.into()).await?;
            println!("Task created.");
            print_tasks(&view);
            Ok(())
        }
        TaskCommand::Update { id, fields } => {
            view.update(id, fields.into()).await?;
            println!("Task {} updated.", id);
            print_tasks(&view);
            Ok(())
        }
        TaskCommand::Status { id, status } => {
            view.update_status(id, status).await?;
            println!("Task {} is now {}.", id, status);
            print_tasks(&view);
            Ok(())
        }
        TaskCommand::Assign { id, assignee } => {
            view.reassign(id, assignee).await?;
            println!("Task {} assigned to user {}.", id, assignee);
            print_tasks(&view);
            Ok(())
        }
        TaskCommand::Delete { id } => {
            view.delete(id).await?;
            println!("Task {} deleted.", id);
            print_tasks(&view);
            Ok(())
        }
    }
}

fn print_tasks(view: &TasksView) {
    let tasks = view.visible_tasks();
    if tasks.is_empty() {
        println!("No tasks.");
    }
    for task in tasks {
        let assignee = task
            .assignee
            .as_ref()
            .map(|a| a.username.clone().unwrap_or_else(|| format!("#{}", a.id)))
            .unwrap_or_else(|| "unassigned".to_string());
        let due = task
            .due_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let marker = if view.can_edit(task) {
            ""
        } else if view.can_update_status(task) {
            " [status only]"
        } else {
            " [read-only]"
        };
        println!(
            "{:>4}  {:<12} {:<32} {:<12} due {}{}",
            task.id,
            task.status.as_str(),
            task.title,
            assignee,
            due,
            marker
        );
    }
    if let Some(message) = view.last_error() {
        eprintln!("Error: {}", message);
    }
}

pub async fn users(ctx: &ClientContext, command: UserCommand) -> Result<(), ClientError> {
    match enter(ctx, Route::Users) {
        None => return Err(ClientError::NotAuthenticated),
        Some(Route::Users) => {}
        Some(_) => return render_dashboard(ctx).await,
    }

    let mut view = ctx.users_view();
    view.load().await?;
    if let Some(notice) = view.notice() {
        println!("{}", notice);
    }

    match command {
        UserCommand::List => {}
        UserCommand::Create(fields) => {
            view.create(fields.into()).await?;
            println!("User created.");
        }
        UserCommand::Update { id, fields } => {
            view.update(id, fields.into()).await?;
            println!("User {} updated.", id);
        }
        UserCommand::Delete { id } => {
            view.delete(id).await?;
            println!("User {} deleted.", id);
        }
    }
    print_users(&view);
    Ok(())
}

fn print_users(view: &UsersView) {
    for user in view.users() {
        println!(
            "{:>4}  {:<16} {:<28} {:<8} {}",
            user.id,
            user.username,
            user.email,
            user.role.as_str(),
            if user.is_active { "Active" } else { "Inactive" }
        );
    }
    if let Some(message) = view.last_error() {
        eprintln!("Error: {}", message);
    }
}
