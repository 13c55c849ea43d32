use crate::projection::chain::{arg_str, Action};
use crate::projection::store::ProjectedStore;

pub(crate) async fn handle_new_username<S: ProjectedStore>(
    store: &S,
    action: &Action,
) -> crate::Result<()> {
    let (creator, owner, name) = match (
        arg_str(&action.args, "creator"),
        arg_str(&action.args, "owner"),
        arg_str(&action.args, "name"),
    ) {
        (Some(creator), Some(owner), Some(name)) => (creator, owner, name),
        _ => return Ok(()),
    };

    // Usernames registered by anyone but the system registrar are not ours.
    if creator != crate::USERNAME_REGISTRAR || name.is_empty() {
        return Ok(());
    }

    store.upsert_username(owner, name).await?;
    tracing::debug!(target: crate::LOGGER_MSG, "Changed meta data of user: {} {}", owner, name);
    Ok(())
}

pub(crate) async fn handle_update_meta<S: ProjectedStore>(
    store: &S,
    action: &Action,
) -> crate::Result<()> {
    let account = match arg_str(&action.args, "account") {
        Some(account) => account,
        None => return Ok(()),
    };
    let avatar_url = match action
        .args
        .get("meta")
        .and_then(|meta| meta.get("avatar_url"))
        .and_then(|url| url.as_str())
    {
        Some(url) if !url.is_empty() => url,
        _ => return Ok(()),
    };

    store.upsert_avatar(account, avatar_url).await?;
    tracing::debug!(target: crate::LOGGER_MSG, "Changed meta data of user: {}", account);
    Ok(())
}
