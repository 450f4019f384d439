//! Newsletter screen commands.

use quickfix_api_models::{
    NewsletterSubscriber, SubscriberDraft, SubscriberField, SubscriberFilter, SubscriberPatch,
};

use crate::cli::{
    OutputFormat, SubscriberAddArgs, SubscriberEditArgs, SubscriberListArgs, SubscriberRefArgs,
};
use crate::context::{AppContext, CliResult};
use crate::output;

pub(crate) async fn handle_list(
    ctx: &AppContext,
    args: SubscriberListArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let screen = ctx.screen::<NewsletterSubscriber>(args.page_size);
    let filter = SubscriberFilter {
        confirmed: args.confirmed,
    };
    let snapshot = screen.load(filter, args.search.as_deref(), args.page).await?;
    output::render_subscribers(&snapshot, format)
}

pub(crate) async fn handle_add(ctx: &AppContext, args: SubscriberAddArgs) -> CliResult<()> {
    let screen = ctx.screen::<NewsletterSubscriber>(None);
    screen.load(SubscriberFilter::default(), None, 1).await?;
    screen.create(SubscriberDraft { email: args.email }).await
}

pub(crate) async fn handle_edit(ctx: &AppContext, args: SubscriberEditArgs) -> CliResult<()> {
    let screen = ctx.screen::<NewsletterSubscriber>(None);
    screen.load(SubscriberFilter::default(), None, 1).await?;
    screen
        .update(args.id, SubscriberPatch { email: args.email })
        .await
}

pub(crate) async fn handle_remove(ctx: &AppContext, args: SubscriberRefArgs) -> CliResult<()> {
    let screen = ctx.screen::<NewsletterSubscriber>(None);
    screen.load(SubscriberFilter::default(), None, 1).await?;
    screen.delete(args.id).await
}

pub(crate) async fn handle_confirm(
    ctx: &AppContext,
    args: SubscriberRefArgs,
    confirmed: bool,
) -> CliResult<()> {
    let screen = ctx.screen::<NewsletterSubscriber>(None);
    screen.load(SubscriberFilter::default(), None, 1).await?;
    screen
        .set_field(args.id, SubscriberField::Confirmed(confirmed))
        .await
}
