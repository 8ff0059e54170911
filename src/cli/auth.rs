use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{error, spotify, success, types::PkceToken, warning};

pub async fn auth(shared_state: Arc<Mutex<Option<PkceToken>>>) {
    if let Err(e) = spotify::auth::auth(shared_state).await {
        error!("{}", e);
    }

    match spotify::user::get_current_user().await {
        Ok(user) => success!("Logged in as: {}", user.label()),
        Err(e) => warning!("Authentication successful, but the profile could not be read: {}", e),
    }
}
