use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::database::models::{Playlist, Role, User};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

use super::file_storage::{MediaKind, StagedUpload, UploadedFile};
use super::policy;
use super::validation::{normalize_email, required, validate_email, validate_password};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Parts of the multipart signup form
#[derive(Debug, Default)]
pub struct SignupForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub image: Option<UploadedFile>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BanRequest {
    pub user_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditUserRequest {
    pub name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug)]
struct SignupDetails {
    name: String,
    email: String,
    password: String,
}

/// Identity plus a freshly issued token
#[derive(Debug)]
pub struct Authenticated {
    pub user: User,
    pub token: String,
}

/// Hash a login attempt is checked against
fn credential_hash<'a>(user: Option<&'a User>, decoy: &'a str) -> &'a str {
    user.map_or(decoy, |user| user.password.as_str())
}

pub struct UserService<'a> {
    state: &'a AppState,
}

impl<'a> UserService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Check the text fields before any file is written
    fn validate_signup(form: &SignupForm) -> ApiResult<SignupDetails> {
        let name = required(form.name.as_deref(), "name")?;
        let email = normalize_email(&required(form.email.as_deref(), "email")?);
        validate_email(&email).map_err(|e| ApiError::validation(format!("Invalid inputs: {}", e)))?;

        let password = form.password.clone().unwrap_or_default();
        validate_password(&password).map_err(|e| ApiError::validation(format!("Invalid inputs: {}", e)))?;

        Ok(SignupDetails { name, email, password })
    }

    /// Create the account and its Liked playlist, then issue a token.
    pub async fn signup(&self, form: SignupForm) -> ApiResult<Authenticated> {
        let details = Self::validate_signup(&form)?;
        let image = form
            .image
            .as_ref()
            .ok_or_else(|| ApiError::validation("Invalid inputs: image is required"))?;

        {
            let mut session = self.state.store.begin().await?;
            if session.user_by_email(&details.email).await?.is_some() {
                return Err(ApiError::conflict("User already exists"));
            }
        }

        let mut staged = StagedUpload::new();
        let image = self
            .state
            .files
            .store_upload(&mut staged, MediaKind::Picture, image)
            .await?;

        // Hash outside any session; the insert below still enforces uniqueness
        let hash = hash_password(&details.password, self.state.config.security.bcrypt_cost).await?;
        let role = if self.state.config.is_admin_email(&details.email) {
            Role::Admin
        } else {
            Role::User
        };

        let mut user = User::new(details.name, details.email, hash, image, role);
        let liked = Playlist::liked(user.id);
        user.playlists.push(liked.id);

        let mut session = self.state.store.begin().await?;
        session.insert_user(&user).await?;
        session.insert_playlist(&liked).await?;
        session.commit().await?;
        staged.commit();

        tracing::info!("Registered user {} as {}", user.id, user.role);
        let token = self.state.tokens.issue(user.id, &user.email)?;
        Ok(Authenticated { user, token })
    }

    pub async fn login(&self, request: LoginRequest) -> ApiResult<Authenticated> {
        let email = normalize_email(&request.email);
        let user = {
            let mut session = self.state.store.begin().await?;
            session.user_by_email(&email).await?
        };

        // Unknown emails pay for a bcrypt round too
        let hash = credential_hash(user.as_ref(), &self.state.login_decoy);
        let verified = match verify_password(&request.password, hash).await {
            Ok(verified) => verified,
            Err(e) => {
                tracing::warn!("Stored hash is unusable: {}", e);
                false
            }
        };

        let user = match user {
            Some(user) if verified => user,
            Some(user) => {
                tracing::warn!("Failed login for user {}", user.id);
                return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
            }
            None => {
                tracing::warn!("Failed login for unknown email");
                return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
            }
        };
        if user.is_banned {
            return Err(ApiError::forbidden(policy::BANNED));
        }

        let token = self.state.tokens.issue(user.id, &user.email)?;
        Ok(Authenticated { user, token })
    }

    pub async fn get(&self, user_id: Uuid) -> ApiResult<User> {
        let mut session = self.state.store.begin().await?;
        session
            .user(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    /// Admin only
    pub async fn list(&self, caller_id: Uuid) -> ApiResult<Vec<User>> {
        let mut session = self.state.store.begin().await?;
        let caller = policy::load_caller(&mut *session, caller_id).await?;
        policy::require_admin(&caller)?;
        Ok(session.users().await?)
    }

    /// Admin only. Returns the confirmation message.
    pub async fn set_ban(&self, caller_id: Uuid, request: BanRequest) -> ApiResult<&'static str> {
        let banning = match request.action.as_deref() {
            Some("ban") => true,
            Some("unban") => false,
            _ => return Err(ApiError::validation("Invalid inputs: type must be ban or unban")),
        };
        let target_id = request
            .user_id
            .ok_or_else(|| ApiError::validation("Invalid inputs: userId is required"))?;

        let mut session = self.state.store.begin().await?;
        let caller = policy::load_caller(&mut *session, caller_id).await?;
        policy::require_admin(&caller)?;
        policy::ensure_not_self_ban(&caller, target_id, banning)?;

        let mut target = session
            .user(target_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        target.is_banned = banning;
        session.update_user(&target).await?;
        session.commit().await?;

        tracing::info!("User {} {} by {}", target.id, if banning { "banned" } else { "unbanned" }, caller.id);
        Ok(if banning { "Banned" } else { "Unbanned" })
    }

    /// Admin only. Replaces name and role.
    pub async fn edit(&self, caller_id: Uuid, target_id: Uuid, request: EditUserRequest) -> ApiResult<User> {
        let name = required(request.name.as_deref(), "name")?;
        let role = request
            .role
            .as_deref()
            .unwrap_or_default()
            .parse::<Role>()
            .map_err(|_| ApiError::validation("Role is invalid. It has to be user or admin"))?;

        let mut session = self.state.store.begin().await?;
        let caller = policy::load_caller(&mut *session, caller_id).await?;
        policy::require_admin(&caller)?;
        policy::ensure_not_self_demotion(&caller, target_id, role)?;

        let mut target = session
            .user(target_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        target.name = name;
        target.role = role;
        session.update_user(&target).await?;
        session.commit().await?;

        Ok(target)
    }
}
