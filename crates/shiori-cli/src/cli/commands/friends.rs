//! Friend list command handlers

use shiori_runtime::FriendsStore;

use crate::cli::{Context, FriendsCommands};

pub async fn cmd_friends(ctx: &Context, command: FriendsCommands) -> anyhow::Result<()> {
    let client = ctx.authed_client()?;
    let store = FriendsStore::new(client.clone(), ctx.events.clone());

    match command {
        FriendsCommands::List => {
            let state = store.load().await?;
            if state.friends.is_empty() {
                println!("No friends yet.");
                println!();
                println!("Find people with: shiori friends search <name>");
                return Ok(());
            }
            println!("Friends ({})", state.friends.len());
            println!("{:-<50}", "");
            for friend in &state.friends {
                println!("{:<26} {}", friend.id, friend.username);
            }
        }
        FriendsCommands::Requests => {
            let state = store.load().await?;
            if state.requests.is_empty() {
                println!("No pending requests.");
                return Ok(());
            }
            println!("Pending requests ({})", state.requests.len());
            println!("{:-<50}", "");
            for request in &state.requests {
                let from = request
                    .from
                    .as_ref()
                    .map(|u| u.username.as_str())
                    .unwrap_or("(unknown user)");
                println!("{:<26} from {from}", request.id);
            }
        }
        FriendsCommands::Send { user_id } => {
            store.send_request(&user_id).await?;
            println!("✓ Request sent to {user_id}");
        }
        FriendsCommands::Accept { request_id } => {
            let state = store.accept(&request_id).await?;
            println!("✓ Accepted; you have {} friends", state.friends.len());
        }
        FriendsCommands::Reject { request_id } => {
            let state = store.reject(&request_id).await?;
            println!("✓ Rejected; {} requests left", state.requests.len());
        }
        FriendsCommands::Remove { friend_id } => {
            store.remove_friend(&friend_id).await?;
            println!("✓ Removed {friend_id}");
        }
        FriendsCommands::Search { query } => {
            let users = client.search_users(&query).await?;
            store.load().await?;
            let candidates = store.candidates(users, ctx.user_id()).await;
            if candidates.is_empty() {
                println!("No one new matches {query:?}.");
                return Ok(());
            }
            for user in &candidates {
                println!("{:<26} {}", user.id, user.username);
            }
            println!();
            println!("Send a request with: shiori friends send <id>");
        }
    }
    Ok(())
}
