use reqwest::Client;

use crate::{Res, config, management::TokenManager, types::CurrentUser};

/// Profile of the account the cached token belongs to (`GET /me`).
pub async fn get_current_user() -> Res<CurrentUser> {
    let mut token_mgr = TokenManager::load()
        .await
        .map_err(|e| format!("Failed to load token. Please run spotharvest auth\n Error: {}", e))?;
    let token = token_mgr.get_valid_token().await?;

    let user = Client::new()
        .get(format!("{}/me", config::spotify_apiurl()?))
        .bearer_auth(token)
        .send()
        .await?
        .error_for_status()?
        .json::<CurrentUser>()
        .await?;
    Ok(user)
}
