//! Argument parsing and command dispatch for the admin console.

use clap::{Args, Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use quickfix_api_models::{
    GuideStatus, PlanKind, SubscriptionStatus, TicketPriority, TicketStatus, UserRole,
};
use quickfix_telemetry::{GlobalContextGuard, LoggingConfig, init_logging};

use crate::commands::{categories, guides, newsletter, subscriptions, tickets, users};
use crate::context::{AppContext, CliResult};

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

/// Parses CLI arguments, executes the requested command, and returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();

    // Routine controller logs stay off the terminal; RUST_LOG overrides.
    if let Err(err) = init_logging(&LoggingConfig {
        level: "warn",
        ..LoggingConfig::default()
    }) {
        eprintln!("error: failed to initialise logging: {err:#}");
        return 3;
    }
    let _surface = GlobalContextGuard::new("console");

    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let ctx = AppContext::connect(&cli)?;
    let output = cli.output;

    match cli.command {
        Command::Users(command) => match command {
            UserCommand::List(args) => users::handle_list(&ctx, args, output).await,
            UserCommand::Add(args) => users::handle_add(&ctx, args).await,
            UserCommand::Edit(args) => users::handle_edit(&ctx, args).await,
            UserCommand::Remove(args) => users::handle_remove(&ctx, args).await,
            UserCommand::Activate(args) => users::handle_activate(&ctx, args).await,
            UserCommand::Deactivate(args) => users::handle_deactivate(&ctx, args).await,
        },
        Command::Guides(command) => match command {
            GuideCommand::List(args) => guides::handle_list(&ctx, args, output).await,
            GuideCommand::Add(args) => guides::handle_add(&ctx, args).await,
            GuideCommand::Edit(args) => guides::handle_edit(&ctx, args).await,
            GuideCommand::Remove(args) => guides::handle_remove(&ctx, args).await,
            GuideCommand::Feature(args) => guides::handle_feature(&ctx, args, true).await,
            GuideCommand::Unfeature(args) => guides::handle_feature(&ctx, args, false).await,
            GuideCommand::SetStatus(args) => guides::handle_set_status(&ctx, args).await,
        },
        Command::Categories(command) => match command {
            CategoryCommand::List(args) => categories::handle_list(&ctx, args, output).await,
            CategoryCommand::Add(args) => categories::handle_add(&ctx, args).await,
            CategoryCommand::Edit(args) => categories::handle_edit(&ctx, args).await,
            CategoryCommand::Remove(args) => categories::handle_remove(&ctx, args).await,
        },
        Command::Subscriptions(command) => match command {
            SubscriptionCommand::List(args) => {
                subscriptions::handle_list(&ctx, args, output).await
            }
            SubscriptionCommand::Grant(args) => subscriptions::handle_grant(&ctx, args).await,
            SubscriptionCommand::SetPlan(args) => {
                subscriptions::handle_set_plan(&ctx, args).await
            }
            SubscriptionCommand::AutoRenew(args) => {
                subscriptions::handle_auto_renew(&ctx, args).await
            }
            SubscriptionCommand::Revoke(args) => subscriptions::handle_revoke(&ctx, args).await,
        },
        Command::Newsletter(command) => match command {
            NewsletterCommand::List(args) => newsletter::handle_list(&ctx, args, output).await,
            NewsletterCommand::Add(args) => newsletter::handle_add(&ctx, args).await,
            NewsletterCommand::Edit(args) => newsletter::handle_edit(&ctx, args).await,
            NewsletterCommand::Remove(args) => newsletter::handle_remove(&ctx, args).await,
            NewsletterCommand::Confirm(args) => {
                newsletter::handle_confirm(&ctx, args, true).await
            }
            NewsletterCommand::Unconfirm(args) => {
                newsletter::handle_confirm(&ctx, args, false).await
            }
        },
        Command::Tickets(command) => match command {
            TicketCommand::List(args) => tickets::handle_list(&ctx, args, output).await,
            TicketCommand::Open(args) => tickets::handle_open(&ctx, args).await,
            TicketCommand::Edit(args) => tickets::handle_edit(&ctx, args).await,
            TicketCommand::Remove(args) => tickets::handle_remove(&ctx, args).await,
            TicketCommand::SetStatus(args) => tickets::handle_set_status(&ctx, args).await,
            TicketCommand::Assign(args) => tickets::handle_assign(&ctx, args).await,
            TicketCommand::Unassign(args) => tickets::handle_unassign(&ctx, args).await,
        },
    }
}

#[derive(Parser)]
#[command(name = "quickfix-admin", about = "Administrative console for the QuickFix platform")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "QUICKFIX_URL",
        default_value = DEFAULT_API_URL
    )]
    pub(crate) url: String,
    #[arg(long, global = true, env = "QUICKFIX_API_KEY")]
    pub(crate) api_key: Option<String>,
    #[arg(
        long,
        global = true,
        env = "QUICKFIX_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render listings"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    #[command(subcommand)]
    Users(UserCommand),
    #[command(subcommand)]
    Guides(GuideCommand),
    #[command(subcommand)]
    Categories(CategoryCommand),
    #[command(subcommand)]
    Subscriptions(SubscriptionCommand),
    #[command(subcommand)]
    Newsletter(NewsletterCommand),
    #[command(subcommand)]
    Tickets(TicketCommand),
}

#[derive(Subcommand)]
pub(crate) enum UserCommand {
    List(UserListArgs),
    Add(UserAddArgs),
    Edit(UserEditArgs),
    Remove(UserRefArgs),
    Activate(UserRefArgs),
    Deactivate(UserRefArgs),
}

#[derive(Args)]
pub(crate) struct UserListArgs {
    #[arg(long, default_value_t = 1)]
    pub(crate) page: u32,
    #[arg(long)]
    pub(crate) page_size: Option<u32>,
    #[arg(long, help = "Keyword matched against names and addresses")]
    pub(crate) search: Option<String>,
    #[arg(long, value_parser = users::parse_role)]
    pub(crate) role: Option<UserRole>,
}

#[derive(Args)]
pub(crate) struct UserAddArgs {
    #[arg(long)]
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long, value_parser = users::parse_role, default_value = "member")]
    pub(crate) role: UserRole,
    #[arg(long, help = "Initial password; prompted for when omitted")]
    pub(crate) password: Option<String>,
}

#[derive(Args)]
pub(crate) struct UserEditArgs {
    #[arg(help = "Account identifier")]
    pub(crate) id: Uuid,
    #[arg(long)]
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long, value_parser = users::parse_role)]
    pub(crate) role: UserRole,
}

#[derive(Args)]
pub(crate) struct UserRefArgs {
    #[arg(help = "Account identifier")]
    pub(crate) id: Uuid,
}

#[derive(Subcommand)]
pub(crate) enum GuideCommand {
    List(GuideListArgs),
    Add(GuideAddArgs),
    Edit(GuideEditArgs),
    Remove(GuideRefArgs),
    Feature(GuideRefArgs),
    Unfeature(GuideRefArgs),
    SetStatus(GuideStatusArgs),
}

#[derive(Args)]
pub(crate) struct GuideListArgs {
    #[arg(long, default_value_t = 1)]
    pub(crate) page: u32,
    #[arg(long)]
    pub(crate) page_size: Option<u32>,
    #[arg(long, help = "Keyword matched against titles and slugs")]
    pub(crate) search: Option<String>,
    #[arg(long, help = "Category identifier to filter by")]
    pub(crate) category: Option<Uuid>,
    #[arg(long, value_parser = guides::parse_status)]
    pub(crate) status: Option<GuideStatus>,
}

#[derive(Args)]
pub(crate) struct GuideAddArgs {
    #[arg(long)]
    pub(crate) title: String,
    #[arg(long)]
    pub(crate) slug: String,
    #[arg(long, help = "Category identifier")]
    pub(crate) category: Uuid,
}

#[derive(Args)]
pub(crate) struct GuideEditArgs {
    #[arg(help = "Guide identifier")]
    pub(crate) id: Uuid,
    #[arg(long)]
    pub(crate) title: String,
    #[arg(long)]
    pub(crate) slug: String,
    #[arg(long, help = "Category identifier")]
    pub(crate) category: Uuid,
}

#[derive(Args)]
pub(crate) struct GuideRefArgs {
    #[arg(help = "Guide identifier")]
    pub(crate) id: Uuid,
}

#[derive(Args)]
pub(crate) struct GuideStatusArgs {
    #[arg(help = "Guide identifier")]
    pub(crate) id: Uuid,
    #[arg(value_parser = guides::parse_status, help = "draft, published, or archived")]
    pub(crate) status: GuideStatus,
}

#[derive(Subcommand)]
pub(crate) enum CategoryCommand {
    List(CategoryListArgs),
    Add(CategoryAddArgs),
    Edit(CategoryEditArgs),
    Remove(CategoryRefArgs),
}

#[derive(Args)]
pub(crate) struct CategoryListArgs {
    #[arg(long, default_value_t = 1)]
    pub(crate) page: u32,
    #[arg(long)]
    pub(crate) page_size: Option<u32>,
    #[arg(long, help = "Keyword matched against names and slugs")]
    pub(crate) search: Option<String>,
}

#[derive(Args)]
pub(crate) struct CategoryAddArgs {
    #[arg(long)]
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) slug: String,
}

#[derive(Args)]
pub(crate) struct CategoryEditArgs {
    #[arg(help = "Category identifier")]
    pub(crate) id: Uuid,
    #[arg(long)]
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) slug: String,
}

#[derive(Args)]
pub(crate) struct CategoryRefArgs {
    #[arg(help = "Category identifier")]
    pub(crate) id: Uuid,
}

#[derive(Subcommand)]
pub(crate) enum SubscriptionCommand {
    List(SubscriptionListArgs),
    Grant(SubscriptionGrantArgs),
    SetPlan(SubscriptionPlanArgs),
    AutoRenew(SubscriptionRenewArgs),
    Revoke(SubscriptionRefArgs),
}

#[derive(Args)]
pub(crate) struct SubscriptionListArgs {
    #[arg(long, default_value_t = 1)]
    pub(crate) page: u32,
    #[arg(long)]
    pub(crate) page_size: Option<u32>,
    #[arg(long, help = "Keyword matched against subscriber addresses")]
    pub(crate) search: Option<String>,
    #[arg(long, value_parser = subscriptions::parse_plan)]
    pub(crate) plan: Option<PlanKind>,
    #[arg(long, value_parser = subscriptions::parse_status)]
    pub(crate) status: Option<SubscriptionStatus>,
}

#[derive(Args)]
pub(crate) struct SubscriptionGrantArgs {
    #[arg(long, help = "Account to grant the subscription to")]
    pub(crate) user: Uuid,
    #[arg(long, value_parser = subscriptions::parse_plan)]
    pub(crate) plan: PlanKind,
}

#[derive(Args)]
pub(crate) struct SubscriptionPlanArgs {
    #[arg(help = "Subscription identifier")]
    pub(crate) id: Uuid,
    #[arg(value_parser = subscriptions::parse_plan, help = "free, monthly, or annual")]
    pub(crate) plan: PlanKind,
}

#[derive(Args)]
pub(crate) struct SubscriptionRenewArgs {
    #[arg(help = "Subscription identifier")]
    pub(crate) id: Uuid,
    // A bare bool field would become a flag; this positional takes a value.
    #[arg(
        value_parser = subscriptions::parse_switch,
        action = clap::ArgAction::Set,
        help = "on or off"
    )]
    pub(crate) enabled: bool,
}

#[derive(Args)]
pub(crate) struct SubscriptionRefArgs {
    #[arg(help = "Subscription identifier")]
    pub(crate) id: Uuid,
}

#[derive(Subcommand)]
pub(crate) enum NewsletterCommand {
    List(SubscriberListArgs),
    Add(SubscriberAddArgs),
    Edit(SubscriberEditArgs),
    Remove(SubscriberRefArgs),
    Confirm(SubscriberRefArgs),
    Unconfirm(SubscriberRefArgs),
}

#[derive(Args)]
pub(crate) struct SubscriberListArgs {
    #[arg(long, default_value_t = 1)]
    pub(crate) page: u32,
    #[arg(long)]
    pub(crate) page_size: Option<u32>,
    #[arg(long, help = "Keyword matched against addresses")]
    pub(crate) search: Option<String>,
    #[arg(long, help = "true or false")]
    pub(crate) confirmed: Option<bool>,
}

#[derive(Args)]
pub(crate) struct SubscriberAddArgs {
    #[arg(long)]
    pub(crate) email: String,
}

#[derive(Args)]
pub(crate) struct SubscriberEditArgs {
    #[arg(help = "Signup identifier")]
    pub(crate) id: Uuid,
    #[arg(long)]
    pub(crate) email: String,
}

#[derive(Args)]
pub(crate) struct SubscriberRefArgs {
    #[arg(help = "Signup identifier")]
    pub(crate) id: Uuid,
}

#[derive(Subcommand)]
pub(crate) enum TicketCommand {
    List(TicketListArgs),
    Open(TicketOpenArgs),
    Edit(TicketEditArgs),
    Remove(TicketRefArgs),
    SetStatus(TicketStatusArgs),
    Assign(TicketAssignArgs),
    Unassign(TicketRefArgs),
}

#[derive(Args)]
pub(crate) struct TicketListArgs {
    #[arg(long, default_value_t = 1)]
    pub(crate) page: u32,
    #[arg(long)]
    pub(crate) page_size: Option<u32>,
    #[arg(long, help = "Keyword matched against subjects and requesters")]
    pub(crate) search: Option<String>,
    #[arg(long, value_parser = tickets::parse_status)]
    pub(crate) status: Option<TicketStatus>,
    #[arg(long, value_parser = tickets::parse_priority)]
    pub(crate) priority: Option<TicketPriority>,
}

#[derive(Args)]
pub(crate) struct TicketOpenArgs {
    #[arg(long)]
    pub(crate) subject: String,
    #[arg(long, help = "Email address of the person asking")]
    pub(crate) requester: String,
    #[arg(long, value_parser = tickets::parse_priority, default_value = "normal")]
    pub(crate) priority: TicketPriority,
}

#[derive(Args)]
pub(crate) struct TicketEditArgs {
    #[arg(help = "Ticket identifier")]
    pub(crate) id: Uuid,
    #[arg(long)]
    pub(crate) subject: String,
    #[arg(long, value_parser = tickets::parse_priority)]
    pub(crate) priority: TicketPriority,
}

#[derive(Args)]
pub(crate) struct TicketRefArgs {
    #[arg(help = "Ticket identifier")]
    pub(crate) id: Uuid,
}

#[derive(Args)]
pub(crate) struct TicketStatusArgs {
    #[arg(help = "Ticket identifier")]
    pub(crate) id: Uuid,
    #[arg(value_parser = tickets::parse_status, help = "open, pending, resolved, or closed")]
    pub(crate) status: TicketStatus,
}

#[derive(Args)]
pub(crate) struct TicketAssignArgs {
    #[arg(help = "Ticket identifier")]
    pub(crate) id: Uuid,
    #[arg(help = "Account identifier of the agent")]
    pub(crate) assignee: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_reach_subcommands() {
        let cli = Cli::try_parse_from([
            "quickfix-admin",
            "users",
            "list",
            "--page",
            "2",
            "--role",
            "editor",
            "--output",
            "json",
        ])
        .expect("arguments parse");

        assert!(matches!(cli.output, OutputFormat::Json));
        match cli.command {
            Command::Users(UserCommand::List(args)) => {
                assert_eq!(args.page, 2);
                assert_eq!(args.role, Some(UserRole::Editor));
            }
            _ => panic!("expected users list"),
        }
    }

    #[test]
    fn format_alias_still_selects_output() {
        let cli = Cli::try_parse_from(["quickfix-admin", "--format", "json", "categories", "list"])
            .expect("arguments parse");
        assert!(matches!(cli.output, OutputFormat::Json));
    }

    #[test]
    fn field_toggles_parse_their_switch() {
        let cli = Cli::try_parse_from([
            "quickfix-admin",
            "subscriptions",
            "auto-renew",
            "00000000-0000-0000-0000-000000000001",
            "off",
        ])
        .expect("arguments parse");

        match cli.command {
            Command::Subscriptions(SubscriptionCommand::AutoRenew(args)) => {
                assert!(!args.enabled);
            }
            _ => panic!("expected subscriptions auto-renew"),
        }
    }
}
