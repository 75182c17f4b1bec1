//! Scripted demo of the to-do list running on the async store.
//!
//! Timings come from `TODOS_SORT_DEBOUNCE_MS` / `TODOS_FOCUS_DEFERRAL_MS`;
//! log verbosity from `RUST_LOG`.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tally_core::environment::{RandomUuid, SystemClock};
use tally_runtime::Store;
use tally_todos::{
    FocusSync, FocusedField, TodoFocus, TodosAction, TodosConfig, TodosEnvironment,
    TodosReducer, TodosState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type TodosStore = Store<TodosState, TodosAction, TodosEnvironment, TodosReducer>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todos=debug,tally_todos=debug,tally_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = TodosConfig::from_env().context("invalid to-do timing configuration")?;
    tracing::info!(?config, "Starting to-do demo");

    println!("=== Focused To-Do List ===\n");

    let env = TodosEnvironment::new(Arc::new(SystemClock), Arc::new(RandomUuid), config);
    let store = Store::new(TodosState::seeded(&RandomUuid), TodosReducer::new(), env);
    let mut focus = FocusSync::new(store.state(|s| s.focus).await);
    let _ = focus.appear();

    print_list(&store, "Seeded list").await;

    println!("\n>>> Tapping add");
    let mut added = store.send(TodosAction::AddButtonTapped).await?;
    added.wait().await;
    sync_focus(&store, &mut focus).await;
    let new_id = store
        .state(|s| s.focus.map(|f| f.id))
        .await
        .context("new item was not focused")?;

    println!("\n>>> Typing a description");
    let _ = store
        .send(TodosAction::text_field_changed(new_id, "Buy stamps"))
        .await?;

    println!("\n>>> Moving focus to the due date");
    for action in focus.platform_focus_changed(Some(TodoFocus {
        id: new_id,
        field: FocusedField::DueDate,
    })) {
        let _ = store.send(action).await?;
    }
    sync_focus(&store, &mut focus).await;
    print_list(&store, "After editing").await;

    let first = store
        .state(|s| s.todos.iter().nth(1).map(|t| t.id))
        .await
        .context("seeded list is empty")?;

    println!("\n>>> Toggling '{new_id}' and then '{first}' within the debounce window");
    let _ = store.send(TodosAction::toggle_complete(new_id)).await?;
    tokio::time::sleep(config.sort_debounce / 2).await;
    let mut sort = store.send(TodosAction::toggle_complete(first)).await?;
    print_list(&store, "Before the sort fires").await;

    sort.wait_with_timeout(config.sort_debounce * 2)
        .await
        .map_err(|()| anyhow::anyhow!("sort did not run in time"))?;
    print_list(&store, "After the sort").await;

    println!("\n>>> Blurring");
    for action in focus.platform_focus_changed(None) {
        let _ = store.send(action).await?;
    }

    store.shutdown(Duration::from_secs(5)).await?;

    let state = store.state(Clone::clone).await;
    println!("\nFinal state:\n{}", serde_json::to_string_pretty(&state)?);

    println!("\n=== Demo Complete ===");
    Ok(())
}

/// Push list focus to the (imaginary) platform
async fn sync_focus(store: &TodosStore, focus: &mut FocusSync) {
    let model = store.state(|s| s.focus).await;
    if let Some(apply) = focus.model_changed(model) {
        println!("  platform focus -> {apply:?}");
    }
}

async fn print_list(store: &TodosStore, title: &str) {
    let rows = store.state(TodosState::rows).await;
    println!("\n{title}:");
    for row in rows {
        let check = if row.todo.is_complete { "x" } else { " " };
        let cursor = match row.focus {
            Some(FocusedField::Description) => " <- editing",
            Some(FocusedField::DueDate) => " <- picking date",
            None => "",
        };
        let due = row
            .todo
            .due_date
            .map(|d| format!(" (due {})", d.format("%Y-%m-%d")))
            .unwrap_or_default();
        println!("  [{check}] {}{due}{cursor}", row.todo.description);
    }
}
