//! Watch list command handlers

use shiori_api::traits::ListBackend;
use shiori_api::ApiClient;
use shiori_core::models::{ListEntry, ListFilter, Subject};
use shiori_core::status::EntryStatus;
use shiori_core::Status;
use shiori_runtime::WatchListStore;

use crate::cli::Context;

/// Store loaded with the caller's own list, ready for mutations.
async fn own_list(ctx: &Context) -> anyhow::Result<WatchListStore<ApiClient>> {
    let store = WatchListStore::new(ctx.authed_client()?, ctx.events.clone());
    store.try_load(Subject::Me).await?;
    ctx.report_warnings();
    Ok(store)
}

fn status_text(status: &EntryStatus) -> String {
    match status {
        EntryStatus::Known(s) => s.label().to_string(),
        EntryStatus::Unknown(raw) => format!("{} ({raw})", status.label()),
    }
}

fn print_entry(entry: &ListEntry) {
    let star = if entry.favorite { "★" } else { " " };
    println!(
        "{star} {:<14} {}",
        status_text(&entry.status),
        entry.anime.title
    );
    println!(
        "  ID: {} | Genres: {}",
        entry.anime_id(),
        entry.anime.genre_line()
    );
    if let Some(notes) = &entry.notes {
        println!("  Note: {notes}");
    }
}

pub async fn cmd_list(ctx: &Context, subject: Subject, filter: ListFilter) -> anyhow::Result<()> {
    let store = WatchListStore::new(ctx.authed_client()?, ctx.events.clone());
    store.try_load(subject).await?;
    ctx.report_warnings();

    let entries = store.filtered(filter).await;
    let total = store.stats().await.total;

    if entries.is_empty() {
        println!("Nothing under {}.", filter.label());
        if total == 0 && store.subject().await.is_me() {
            println!();
            println!("Add anime with: shiori add <anime id>");
        }
        return Ok(());
    }

    println!("{} ({} of {total})", filter.label(), entries.len());
    println!("{:-<70}", "");
    for entry in &entries {
        print_entry(entry);
    }
    Ok(())
}

pub async fn cmd_add(ctx: &Context, anime_id: &str) -> anyhow::Result<()> {
    let store = own_list(ctx).await?;
    let anime = store.backend().fetch_anime(anime_id).await?;
    let entry = store.add(&anime).await?;
    println!(
        "✓ Added: {} ({})",
        entry.anime.title,
        status_text(&entry.status)
    );
    Ok(())
}

pub async fn cmd_set_status(ctx: &Context, anime_id: &str, status: Status) -> anyhow::Result<()> {
    let store = own_list(ctx).await?;
    store.set_status(anime_id, status).await?;
    match store.get(anime_id).await {
        Some(entry) => println!("✓ {}: {status}", entry.anime.title),
        None => println!("✓ {anime_id}: {status}"),
    }
    Ok(())
}

pub async fn cmd_note(ctx: &Context, anime_id: &str, text: Option<String>) -> anyhow::Result<()> {
    let store = own_list(ctx).await?;
    let clearing = text.as_deref().is_none_or(|t| t.trim().is_empty());
    store.set_notes(anime_id, text).await?;
    if clearing {
        println!("✓ Note cleared");
    } else {
        println!("✓ Note saved");
    }
    Ok(())
}

pub async fn cmd_favorite(ctx: &Context, anime_id: &str) -> anyhow::Result<()> {
    let store = own_list(ctx).await?;
    let favorite = store.toggle_favorite(anime_id).await?;
    let title = store
        .get(anime_id)
        .await
        .map(|e| e.anime.title)
        .unwrap_or_else(|| anime_id.to_string());
    if favorite {
        println!("★ {title} is now a favorite");
    } else {
        println!("✓ {title} is no longer a favorite");
    }
    Ok(())
}

pub async fn cmd_remove(ctx: &Context, anime_id: &str) -> anyhow::Result<()> {
    let store = own_list(ctx).await?;
    let title = store.get(anime_id).await.map(|e| e.anime.title);
    store.remove(anime_id).await?;
    println!("✓ Removed: {}", title.as_deref().unwrap_or(anime_id));
    Ok(())
}

pub async fn cmd_stats(ctx: &Context, subject: Subject) -> anyhow::Result<()> {
    let store = WatchListStore::new(ctx.authed_client()?, ctx.events.clone());
    store.try_load(subject).await?;
    ctx.report_warnings();

    let stats = store.stats().await;
    for status in Status::ALL {
        println!("{:<14} {:>4}", status.label(), stats.count(*status));
    }
    if stats.unknown > 0 {
        println!("{:<14} {:>4}", "Unknown", stats.unknown);
    }
    println!("{:-<19}", "");
    println!("{:<14} {:>4}", "Favorites", stats.favorites);
    println!("{:<14} {:>4}", "Total", stats.total);
    Ok(())
}
