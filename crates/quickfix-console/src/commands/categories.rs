//! Category screen commands.

use quickfix_api_models::{Category, CategoryDraft, CategoryPatch};

use crate::cli::{
    CategoryAddArgs, CategoryEditArgs, CategoryListArgs, CategoryRefArgs, OutputFormat,
};
use crate::context::{AppContext, CliResult};
use crate::output;

pub(crate) async fn handle_list(
    ctx: &AppContext,
    args: CategoryListArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let screen = ctx.screen::<Category>(args.page_size);
    let snapshot = screen.load((), args.search.as_deref(), args.page).await?;
    output::render_categories(&snapshot, format)
}

pub(crate) async fn handle_add(ctx: &AppContext, args: CategoryAddArgs) -> CliResult<()> {
    let screen = ctx.screen::<Category>(None);
    screen.load((), None, 1).await?;
    screen
        .create(CategoryDraft {
            name: args.name,
            slug: args.slug,
        })
        .await
}

pub(crate) async fn handle_edit(ctx: &AppContext, args: CategoryEditArgs) -> CliResult<()> {
    let screen = ctx.screen::<Category>(None);
    screen.load((), None, 1).await?;
    screen
        .update(
            args.id,
            CategoryPatch {
                name: args.name,
                slug: args.slug,
            },
        )
        .await
}

pub(crate) async fn handle_remove(ctx: &AppContext, args: CategoryRefArgs) -> CliResult<()> {
    let screen = ctx.screen::<Category>(None);
    screen.load((), None, 1).await?;
    screen.delete(args.id).await
}
