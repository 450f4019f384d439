//! Output renderers and formatting helpers for console commands.

use anyhow::anyhow;
use serde::Serialize;

use quickfix_api_models::{
    Category, Guide, NewsletterSubscriber, Subscription, SupportTicket, UserAccount,
};
use quickfix_controller::ListSnapshot;

use crate::cli::OutputFormat;
use crate::context::{CliError, CliResult};

pub(crate) fn render_users(
    snapshot: &ListSnapshot<UserAccount>,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(snapshot)?,
        OutputFormat::Table => {
            println!("{:<36} {:<8} {:<7} {:<30} NAME", "ID", "ROLE", "ACTIVE", "EMAIL");
            for row in &snapshot.items {
                println!(
                    "{:<36} {:<8} {:<7} {:<30} {}",
                    row.id,
                    row.role.as_str(),
                    yes_no(row.active),
                    row.email,
                    row.name
                );
            }
            print_footer(snapshot);
        }
    }
    Ok(())
}

pub(crate) fn render_guides(snapshot: &ListSnapshot<Guide>, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(snapshot)?,
        OutputFormat::Table => {
            println!("{:<36} {:<10} {:<5} {:<20} TITLE", "ID", "STATUS", "FEAT", "CATEGORY");
            for row in &snapshot.items {
                println!(
                    "{:<36} {:<10} {:<5} {:<20} {}",
                    row.id,
                    row.status.as_str(),
                    yes_no(row.featured),
                    row.category_name.as_deref().unwrap_or("-"),
                    row.title
                );
            }
            print_footer(snapshot);
        }
    }
    Ok(())
}

pub(crate) fn render_categories(
    snapshot: &ListSnapshot<Category>,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(snapshot)?,
        OutputFormat::Table => {
            println!("{:<36} {:>7} {:<24} NAME", "ID", "GUIDES", "SLUG");
            for row in &snapshot.items {
                println!(
                    "{:<36} {:>7} {:<24} {}",
                    row.id, row.guide_count, row.slug, row.name
                );
            }
            print_footer(snapshot);
        }
    }
    Ok(())
}

pub(crate) fn render_subscriptions(
    snapshot: &ListSnapshot<Subscription>,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(snapshot)?,
        OutputFormat::Table => {
            println!("{:<36} {:<8} {:<9} {:<6} EMAIL", "ID", "PLAN", "STATUS", "RENEW");
            for row in &snapshot.items {
                println!(
                    "{:<36} {:<8} {:<9} {:<6} {}",
                    row.id,
                    row.plan.as_str(),
                    row.status.as_str(),
                    yes_no(row.auto_renew),
                    row.user_email
                );
            }
            print_footer(snapshot);
        }
    }
    Ok(())
}

pub(crate) fn render_subscribers(
    snapshot: &ListSnapshot<NewsletterSubscriber>,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(snapshot)?,
        OutputFormat::Table => {
            println!("{:<36} {:<10} {:<7} EMAIL", "ID", "CONFIRMED", "LINKED");
            for row in &snapshot.items {
                println!(
                    "{:<36} {:<10} {:<7} {}",
                    row.id,
                    yes_no(row.confirmed),
                    yes_no(row.user_id.is_some()),
                    row.email
                );
            }
            print_footer(snapshot);
        }
    }
    Ok(())
}

pub(crate) fn render_tickets(
    snapshot: &ListSnapshot<SupportTicket>,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(snapshot)?,
        OutputFormat::Table => {
            println!(
                "{:<36} {:<9} {:<9} {:<20} SUBJECT",
                "ID", "STATUS", "PRIORITY", "ASSIGNEE"
            );
            for row in &snapshot.items {
                println!(
                    "{:<36} {:<9} {:<9} {:<20} {}",
                    row.id,
                    row.status.as_str(),
                    row.priority.as_str(),
                    row.assignee_name.as_deref().unwrap_or("-"),
                    row.subject
                );
            }
            print_footer(snapshot);
        }
    }
    Ok(())
}

/// The slice of a snapshot that scripts consume.
#[derive(Serialize)]
struct PageView<'a, R> {
    items: &'a [R],
    total: u64,
    page: u32,
    page_count: u32,
}

fn print_json<R: Serialize>(snapshot: &ListSnapshot<R>) -> CliResult<()> {
    let view = PageView {
        items: &snapshot.items,
        total: snapshot.total,
        page: snapshot.page,
        page_count: snapshot.page_count,
    };
    let text = serde_json::to_string_pretty(&view)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

fn print_footer<R>(snapshot: &ListSnapshot<R>) {
    if snapshot.is_blank() {
        println!("no rows match");
    }
    if let Some(keyword) = &snapshot.keyword {
        println!("keyword: {keyword}");
    }
    if snapshot.pagination_visible() {
        println!(
            "page {} of {} ({} total)",
            snapshot.page, snapshot.page_count, snapshot.total
        );
    }
}

#[must_use]
pub(crate) const fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
