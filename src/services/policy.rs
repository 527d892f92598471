/// Authorization rules: caller resolution, admin gate, ownership and
/// self-protection checks.
use uuid::Uuid;

use crate::database::models::{Playlist, Role, User};
use crate::database::Session;
use crate::error::{ApiError, ApiResult};

pub const NO_PERMISSION: &str = "You dont have permission to do that";
pub const BANNED: &str = "You have been banned";

/// Load the authenticated caller. A token whose user no longer exists is
/// treated as unauthenticated; a banned caller is refused outright.
pub async fn load_caller(session: &mut dyn Session, user_id: Uuid) -> ApiResult<User> {
    let user = session
        .user(user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Auth failed"))?;

    if user.is_banned {
        tracing::warn!("Banned user {} refused", user.id);
        return Err(ApiError::forbidden(BANNED));
    }
    Ok(user)
}

pub fn require_admin(caller: &User) -> ApiResult<()> {
    if caller.is_admin() {
        return Ok(());
    }
    tracing::warn!("User {} denied admin operation", caller.id);
    Err(ApiError::forbidden(NO_PERMISSION))
}

pub fn require_owner(caller: &User, playlist: &Playlist) -> ApiResult<()> {
    if playlist.is_owned_by(caller.id) {
        return Ok(());
    }
    tracing::warn!("User {} denied access to playlist {}", caller.id, playlist.id);
    Err(ApiError::forbidden(NO_PERMISSION))
}

/// Admins cannot ban themselves. Unbanning oneself is a harmless no-op.
pub fn ensure_not_self_ban(caller: &User, target: Uuid, banning: bool) -> ApiResult<()> {
    if banning && caller.id == target {
        return Err(ApiError::validation("You cant ban yourself"));
    }
    Ok(())
}

/// Admins cannot demote themselves to a plain user.
pub fn ensure_not_self_demotion(caller: &User, target: Uuid, role: Role) -> ApiResult<()> {
    if caller.id == target && caller.is_admin() && role != Role::Admin {
        return Err(ApiError::validation("You cant downgrade yourself"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryStore, Store};

    fn user(role: Role) -> User {
        User::new(
            "Ann".to_string(),
            format!("{}@example.com", Uuid::new_v4()),
            "hash".to_string(),
            "uploads/pictures/a.png".to_string(),
            role,
        )
    }

    #[tokio::test]
    async fn missing_caller_is_unauthorized() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();

        let err = load_caller(session.as_mut(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn banned_caller_is_forbidden() {
        let store = MemoryStore::new();
        let mut banned = user(Role::User);
        banned.is_banned = true;

        let mut session = store.begin().await.unwrap();
        session.insert_user(&banned).await.unwrap();

        let err = load_caller(session.as_mut(), banned.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(ref msg) if msg == BANNED));
    }

    #[test]
    fn admin_gate() {
        assert!(require_admin(&user(Role::Admin)).is_ok());
        assert!(matches!(require_admin(&user(Role::User)), Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn ownership() {
        let owner = user(Role::User);
        let admin = user(Role::Admin);
        let playlist = Playlist::new("mix".to_string(), owner.id);

        assert!(require_owner(&owner, &playlist).is_ok());
        // Admin role grants nothing over other users' playlists
        assert!(require_owner(&admin, &playlist).is_err());
    }

    #[test]
    fn self_protection() {
        let admin = user(Role::Admin);
        let other = Uuid::new_v4();

        assert!(matches!(
            ensure_not_self_ban(&admin, admin.id, true),
            Err(ApiError::ValidationError(_))
        ));
        assert!(ensure_not_self_ban(&admin, admin.id, false).is_ok());
        assert!(ensure_not_self_ban(&admin, other, true).is_ok());

        assert!(ensure_not_self_demotion(&admin, admin.id, Role::User).is_err());
        assert!(ensure_not_self_demotion(&admin, admin.id, Role::Admin).is_ok());
        assert!(ensure_not_self_demotion(&admin, other, Role::User).is_ok());
    }
}
