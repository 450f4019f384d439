//! Account screen commands.

use std::io::{self, IsTerminal};

use anyhow::anyhow;

use quickfix_api_models::{UserAccount, UserDraft, UserField, UserFilter, UserPatch, UserRole};

use crate::cli::{OutputFormat, UserAddArgs, UserEditArgs, UserListArgs, UserRefArgs};
use crate::context::{AppContext, CliError, CliResult};
use crate::output;

pub(crate) async fn handle_list(
    ctx: &AppContext,
    args: UserListArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let screen = ctx.screen::<UserAccount>(args.page_size);
    let filter = UserFilter { role: args.role };
    let snapshot = screen.load(filter, args.search.as_deref(), args.page).await?;
    output::render_users(&snapshot, format)
}

pub(crate) async fn handle_add(ctx: &AppContext, args: UserAddArgs) -> CliResult<()> {
    let password = resolve_password(args.password)?;
    let screen = ctx.screen::<UserAccount>(None);
    screen.load(UserFilter::default(), None, 1).await?;
    screen
        .create(UserDraft {
            name: args.name,
            email: args.email,
            role: args.role,
            password,
        })
        .await
}

pub(crate) async fn handle_edit(ctx: &AppContext, args: UserEditArgs) -> CliResult<()> {
    let screen = ctx.screen::<UserAccount>(None);
    screen.load(UserFilter::default(), None, 1).await?;
    screen
        .update(
            args.id,
            UserPatch {
                name: args.name,
                email: args.email,
                role: args.role,
            },
        )
        .await
}

pub(crate) async fn handle_remove(ctx: &AppContext, args: UserRefArgs) -> CliResult<()> {
    let screen = ctx.screen::<UserAccount>(None);
    screen.load(UserFilter::default(), None, 1).await?;
    screen.delete(args.id).await
}

pub(crate) async fn handle_activate(ctx: &AppContext, args: UserRefArgs) -> CliResult<()> {
    set_active(ctx, args, true).await
}

pub(crate) async fn handle_deactivate(ctx: &AppContext, args: UserRefArgs) -> CliResult<()> {
    set_active(ctx, args, false).await
}

async fn set_active(ctx: &AppContext, args: UserRefArgs, active: bool) -> CliResult<()> {
    let screen = ctx.screen::<UserAccount>(None);
    screen.load(UserFilter::default(), None, 1).await?;
    screen.set_field(args.id, UserField::Active(active)).await
}

pub(crate) fn parse_role(value: &str) -> Result<UserRole, String> {
    match value.to_ascii_lowercase().as_str() {
        "admin" => Ok(UserRole::Admin),
        "editor" => Ok(UserRole::Editor),
        "support" => Ok(UserRole::Support),
        "member" => Ok(UserRole::Member),
        other => Err(format!(
            "unknown role '{other}' (expected admin, editor, support, or member)"
        )),
    }
}

fn resolve_password(flag: Option<String>) -> CliResult<String> {
    if let Some(value) = flag {
        return Ok(value);
    }

    if io::stdin().is_terminal() {
        rpassword::prompt_password("Initial password: ")
            .map_err(|err| CliError::failure(anyhow!("failed to read password from stdin: {err}")))
    } else {
        Err(CliError::validation(
            "password required; supply via --password when running non-interactively",
        ))
    }
}
