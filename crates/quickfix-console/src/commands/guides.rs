//! Guide catalogue commands.

use quickfix_api_models::{Guide, GuideDraft, GuideField, GuideFilter, GuidePatch, GuideStatus};

use crate::cli::{
    GuideAddArgs, GuideEditArgs, GuideListArgs, GuideRefArgs, GuideStatusArgs, OutputFormat,
};
use crate::context::{AppContext, CliResult};
use crate::output;

pub(crate) async fn handle_list(
    ctx: &AppContext,
    args: GuideListArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let screen = ctx.screen::<Guide>(args.page_size);
    let filter = GuideFilter {
        category_id: args.category,
        status: args.status,
    };
    let snapshot = screen.load(filter, args.search.as_deref(), args.page).await?;
    output::render_guides(&snapshot, format)
}

pub(crate) async fn handle_add(ctx: &AppContext, args: GuideAddArgs) -> CliResult<()> {
    let screen = ctx.screen::<Guide>(None);
    screen.load(GuideFilter::default(), None, 1).await?;
    screen
        .create(GuideDraft {
            title: args.title,
            slug: args.slug,
            category_id: args.category,
        })
        .await
}

pub(crate) async fn handle_edit(ctx: &AppContext, args: GuideEditArgs) -> CliResult<()> {
    let screen = ctx.screen::<Guide>(None);
    screen.load(GuideFilter::default(), None, 1).await?;
    screen
        .update(
            args.id,
            GuidePatch {
                title: args.title,
                slug: args.slug,
                category_id: args.category,
            },
        )
        .await
}

pub(crate) async fn handle_remove(ctx: &AppContext, args: GuideRefArgs) -> CliResult<()> {
    let screen = ctx.screen::<Guide>(None);
    screen.load(GuideFilter::default(), None, 1).await?;
    screen.delete(args.id).await
}

pub(crate) async fn handle_feature(
    ctx: &AppContext,
    args: GuideRefArgs,
    featured: bool,
) -> CliResult<()> {
    let screen = ctx.screen::<Guide>(None);
    screen.load(GuideFilter::default(), None, 1).await?;
    screen
        .set_field(args.id, GuideField::Featured(featured))
        .await
}

pub(crate) async fn handle_set_status(ctx: &AppContext, args: GuideStatusArgs) -> CliResult<()> {
    let screen = ctx.screen::<Guide>(None);
    screen.load(GuideFilter::default(), None, 1).await?;
    screen
        .set_field(args.id, GuideField::Status(args.status))
        .await
}

pub(crate) fn parse_status(value: &str) -> Result<GuideStatus, String> {
    match value.to_ascii_lowercase().as_str() {
        "draft" => Ok(GuideStatus::Draft),
        "published" => Ok(GuideStatus::Published),
        "archived" => Ok(GuideStatus::Archived),
        other => Err(format!(
            "unknown status '{other}' (expected draft, published, or archived)"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    use quickfix_client::{AdminApi, AuthFeed, ClientConfig};
    use quickfix_events::EventBus;
    use quickfix_telemetry::Metrics;
    use quickfix_test_support::fixtures::sample_guide;

    fn context_for(server: &MockServer) -> AppContext {
        let metrics = Metrics::new().expect("metrics");
        let api = AdminApi::connect(
            &ClientConfig::new(server.base_url()),
            AuthFeed::new(None).subscribe(),
            metrics.clone(),
        )
        .expect("client for mock server");
        AppContext {
            api,
            events: EventBus::new(),
            metrics,
        }
    }

    #[test]
    fn statuses_parse_case_insensitively() {
        assert_eq!(parse_status("Published"), Ok(GuideStatus::Published));
        assert_eq!(parse_status("draft"), Ok(GuideStatus::Draft));
        assert!(parse_status("retired").is_err());
    }

    #[tokio::test]
    async fn publishing_sets_the_status_field() {
        let server = MockServer::start_async().await;
        let mut row = sample_guide(2);
        row.status = GuideStatus::Draft;
        let id = row.id;
        let listed = serde_json::to_value(&row).expect("row serialises");
        server.mock(move |when, then| {
            when.method(GET).path("/v1/guides");
            then.status(200)
                .json_body(json!({ "items": [listed], "total": 1, "page": 1 }));
        });
        row.status = GuideStatus::Published;
        let patched = serde_json::to_value(&row).expect("row serialises");
        let field = server.mock(move |when, then| {
            when.method(PATCH)
                .path(format!("/v1/guides/{id}/field"))
                .json_body(json!({ "field": "status", "value": "published" }));
            then.status(200).json_body(patched.clone());
        });

        let args = GuideStatusArgs {
            id,
            status: GuideStatus::Published,
        };
        handle_set_status(&context_for(&server), args)
            .await
            .expect("status change settles");
        field.assert();
    }

    #[tokio::test]
    async fn list_passes_category_and_status_filters() {
        let server = MockServer::start_async().await;
        let row = sample_guide(1);
        let category = row.category_id;
        let listed = serde_json::to_value(&row).expect("row serialises");
        let mock = server.mock(move |when, then| {
            when.method(GET)
                .path("/v1/guides")
                .query_param("category_id", category.to_string())
                .query_param("status", "published");
            then.status(200)
                .json_body(json!({ "items": [listed], "total": 1, "page": 1 }));
        });

        let args = GuideListArgs {
            page: 1,
            page_size: None,
            search: None,
            category: Some(category),
            status: Some(GuideStatus::Published),
        };
        handle_list(&context_for(&server), args, OutputFormat::Json)
            .await
            .expect("list renders");
        mock.assert();
    }
}
