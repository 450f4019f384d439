//! Subscription screen commands.

use quickfix_api_models::{
    PlanKind, Subscription, SubscriptionDraft, SubscriptionField, SubscriptionFilter,
    SubscriptionPatch, SubscriptionStatus,
};

use crate::cli::{
    OutputFormat, SubscriptionGrantArgs, SubscriptionListArgs, SubscriptionPlanArgs,
    SubscriptionRefArgs, SubscriptionRenewArgs,
};
use crate::context::{AppContext, CliResult};
use crate::output;

pub(crate) async fn handle_list(
    ctx: &AppContext,
    args: SubscriptionListArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let screen = ctx.screen::<Subscription>(args.page_size);
    let filter = SubscriptionFilter {
        plan: args.plan,
        status: args.status,
    };
    let snapshot = screen.load(filter, args.search.as_deref(), args.page).await?;
    output::render_subscriptions(&snapshot, format)
}

pub(crate) async fn handle_grant(ctx: &AppContext, args: SubscriptionGrantArgs) -> CliResult<()> {
    let screen = ctx.screen::<Subscription>(None);
    screen.load(SubscriptionFilter::default(), None, 1).await?;
    screen
        .create(SubscriptionDraft {
            user_id: args.user,
            plan: args.plan,
        })
        .await
}

pub(crate) async fn handle_set_plan(ctx: &AppContext, args: SubscriptionPlanArgs) -> CliResult<()> {
    let screen = ctx.screen::<Subscription>(None);
    screen.load(SubscriptionFilter::default(), None, 1).await?;
    screen
        .update(args.id, SubscriptionPatch { plan: args.plan })
        .await
}

pub(crate) async fn handle_auto_renew(
    ctx: &AppContext,
    args: SubscriptionRenewArgs,
) -> CliResult<()> {
    let screen = ctx.screen::<Subscription>(None);
    screen.load(SubscriptionFilter::default(), None, 1).await?;
    screen
        .set_field(args.id, SubscriptionField::AutoRenew(args.enabled))
        .await
}

pub(crate) async fn handle_revoke(ctx: &AppContext, args: SubscriptionRefArgs) -> CliResult<()> {
    let screen = ctx.screen::<Subscription>(None);
    screen.load(SubscriptionFilter::default(), None, 1).await?;
    screen.delete(args.id).await
}

pub(crate) fn parse_plan(value: &str) -> Result<PlanKind, String> {
    match value.to_ascii_lowercase().as_str() {
        "free" => Ok(PlanKind::Free),
        "monthly" => Ok(PlanKind::Monthly),
        "annual" => Ok(PlanKind::Annual),
        other => Err(format!(
            "unknown plan '{other}' (expected free, monthly, or annual)"
        )),
    }
}

pub(crate) fn parse_status(value: &str) -> Result<SubscriptionStatus, String> {
    match value.to_ascii_lowercase().as_str() {
        "active" => Ok(SubscriptionStatus::Active),
        "past-due" | "past_due" => Ok(SubscriptionStatus::PastDue),
        "canceled" => Ok(SubscriptionStatus::Canceled),
        other => Err(format!(
            "unknown status '{other}' (expected active, past-due, or canceled)"
        )),
    }
}

pub(crate) fn parse_switch(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(format!("unknown switch '{other}' (expected on or off)")),
    }
}
