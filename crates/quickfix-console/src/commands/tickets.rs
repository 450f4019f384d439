//! Support ticket commands.

use quickfix_api_models::{
    SupportTicket, TicketDraft, TicketField, TicketFilter, TicketPatch, TicketPriority,
    TicketStatus,
};

use crate::cli::{
    OutputFormat, TicketAssignArgs, TicketEditArgs, TicketListArgs, TicketOpenArgs, TicketRefArgs,
    TicketStatusArgs,
};
use crate::context::{AppContext, CliResult};
use crate::output;

pub(crate) async fn handle_list(
    ctx: &AppContext,
    args: TicketListArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let screen = ctx.screen::<SupportTicket>(args.page_size);
    let filter = TicketFilter {
        status: args.status,
        priority: args.priority,
    };
    let snapshot = screen.load(filter, args.search.as_deref(), args.page).await?;
    output::render_tickets(&snapshot, format)
}

pub(crate) async fn handle_open(ctx: &AppContext, args: TicketOpenArgs) -> CliResult<()> {
    let screen = ctx.screen::<SupportTicket>(None);
    screen.load(TicketFilter::default(), None, 1).await?;
    screen
        .create(TicketDraft {
            subject: args.subject,
            requester_email: args.requester,
            priority: args.priority,
        })
        .await
}

pub(crate) async fn handle_edit(ctx: &AppContext, args: TicketEditArgs) -> CliResult<()> {
    let screen = ctx.screen::<SupportTicket>(None);
    screen.load(TicketFilter::default(), None, 1).await?;
    screen
        .update(
            args.id,
            TicketPatch {
                subject: args.subject,
                priority: args.priority,
            },
        )
        .await
}

pub(crate) async fn handle_remove(ctx: &AppContext, args: TicketRefArgs) -> CliResult<()> {
    let screen = ctx.screen::<SupportTicket>(None);
    screen.load(TicketFilter::default(), None, 1).await?;
    screen.delete(args.id).await
}

pub(crate) async fn handle_set_status(ctx: &AppContext, args: TicketStatusArgs) -> CliResult<()> {
    let screen = ctx.screen::<SupportTicket>(None);
    screen.load(TicketFilter::default(), None, 1).await?;
    screen
        .set_field(args.id, TicketField::Status(args.status))
        .await
}

pub(crate) async fn handle_assign(ctx: &AppContext, args: TicketAssignArgs) -> CliResult<()> {
    let screen = ctx.screen::<SupportTicket>(None);
    screen.load(TicketFilter::default(), None, 1).await?;
    screen
        .set_field(args.id, TicketField::Assignee(Some(args.assignee)))
        .await
}

pub(crate) async fn handle_unassign(ctx: &AppContext, args: TicketRefArgs) -> CliResult<()> {
    let screen = ctx.screen::<SupportTicket>(None);
    screen.load(TicketFilter::default(), None, 1).await?;
    screen.set_field(args.id, TicketField::Assignee(None)).await
}

pub(crate) fn parse_status(value: &str) -> Result<TicketStatus, String> {
    match value.to_ascii_lowercase().as_str() {
        "open" => Ok(TicketStatus::Open),
        "pending" => Ok(TicketStatus::Pending),
        "resolved" => Ok(TicketStatus::Resolved),
        "closed" => Ok(TicketStatus::Closed),
        other => Err(format!(
            "unknown status '{other}' (expected open, pending, resolved, or closed)"
        )),
    }
}

pub(crate) fn parse_priority(value: &str) -> Result<TicketPriority, String> {
    match value.to_ascii_lowercase().as_str() {
        "low" => Ok(TicketPriority::Low),
        "normal" => Ok(TicketPriority::Normal),
        "high" => Ok(TicketPriority::High),
        "urgent" => Ok(TicketPriority::Urgent),
        other => Err(format!(
            "unknown priority '{other}' (expected low, normal, high, or urgent)"
        )),
    }
}
