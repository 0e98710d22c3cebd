//! Catalog browsing command handlers

use shiori_api::traits::ListBackend;
use shiori_core::catalog::{CatalogQuery, SortOrder, GENRES};

use crate::cli::Context;

pub async fn cmd_catalog(
    ctx: &Context,
    genre: Option<String>,
    search: Option<String>,
    sort: SortOrder,
) -> anyhow::Result<()> {
    // Match the catalog's own spelling so "sci-fi" finds "Sci-Fi".
    let genre = match genre {
        Some(g) => match GENRES.iter().find(|known| known.eq_ignore_ascii_case(g.trim())) {
            Some(known) => Some(known.to_string()),
            None => {
                println!("Unknown genre: {g}");
                println!("Genres: {}", GENRES.join(", "));
                return Ok(());
            }
        },
        None => None,
    };

    let client = ctx.client()?;
    let catalog = client.fetch_catalog().await?;
    let query = CatalogQuery {
        genre,
        text: search,
        sort,
    };
    let animes = query.apply(&catalog);

    if animes.is_empty() {
        println!("No anime found.");
        return Ok(());
    }

    println!("Catalog ({} of {})", animes.len(), catalog.len());
    println!("{:-<70}", "");
    for anime in animes {
        println!("{:<26} {}", anime.id, anime.title);
        if !anime.genre.is_empty() {
            println!("{:<26} {}", "", anime.genre_line());
        }
    }
    Ok(())
}

pub async fn cmd_anime(ctx: &Context, id: &str) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let anime = client.fetch_anime(id).await?;

    println!("{}", anime.title);
    println!("{:-<70}", "");
    println!("ID:     {}", anime.id);
    println!("Genres: {}", anime.genre_line());
    if let Some(image) = &anime.image {
        println!("Image:  {image}");
    }
    if !anime.description.is_empty() {
        println!();
        println!("{}", anime.description);
    }
    Ok(())
}
