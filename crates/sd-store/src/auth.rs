use sd_api::ApiClient;
use sd_core::error::SdError;
use sd_core::notify::{Notice, Notifier};
use sd_core::route::{Location, Route};
use sd_core::user::*;
use sd_storage::keys;
use std::sync::{Arc, Mutex};

use crate::{lock, report};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<UserInfo>,
    pub is_authenticated: bool,
    pub loading: bool,
}

pub struct AuthStore {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    state: Mutex<AuthState>,
}

impl AuthStore {
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            state: Mutex::new(AuthState::default()),
        }
    }

    pub fn snapshot(&self) -> AuthState {
        lock(&self.state).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        lock(&self.state).is_authenticated
    }

    pub fn user(&self) -> Option<UserInfo> {
        lock(&self.state).user.clone()
    }

    fn set_loading(&self, loading: bool) {
        lock(&self.state).loading = loading;
    }

    /// Log in and persist the token. With `remember`, the username is kept
    /// under `credentials` for the next login form.
    pub async fn login(&self, req: LoginRequest, remember: bool) -> Result<UserInfo, SdError> {
        self.set_loading(true);
        let result = self.login_inner(&req, remember).await;
        self.set_loading(false);
        result.map_err(|e| report(self.notifier.as_ref(), "log in", e))
    }

    async fn login_inner(&self, req: &LoginRequest, remember: bool) -> Result<UserInfo, SdError> {
        let resp = self.api.login(req).await?;
        let storage = self.api.storage();
        storage.set(keys::TOKEN, &resp.token).await?;
        storage.set(keys::USERNAME, &resp.username).await?;
        if remember {
            let remembered = RememberedLogin {
                username: resp.username.clone(),
            };
            storage.set_json(keys::CREDENTIALS, &remembered).await?;
        } else {
            storage.remove(keys::CREDENTIALS).await?;
        }

        let user = UserInfo {
            username: resp.username,
            email: resp.email,
            token: resp.token,
        };
        {
            let mut state = lock(&self.state);
            state.user = Some(user.clone());
            state.is_authenticated = true;
        }
        tracing::info!(username = %user.username, "logged in");
        self.notifier.notify(Notice::success("Login successful"));
        Ok(user)
    }

    /// Username saved by a previous "remember me" login.
    pub async fn remembered_login(&self) -> Option<RememberedLogin> {
        match self.api.storage().get_json(keys::CREDENTIALS).await {
            Ok(remembered) => remembered,
            Err(e) => {
                tracing::warn!(error = %e, "could not read remembered login");
                None
            }
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<(), SdError> {
        self.set_loading(true);
        let result = self.api.register(&req).await;
        self.set_loading(false);
        match result {
            Ok(_) => {
                self.notifier
                    .notify(Notice::success("Registration successful, please log in"));
                Ok(())
            }
            Err(e) => Err(report(self.notifier.as_ref(), "register", e)),
        }
    }

    pub async fn send_verification_code(&self, email: &str) -> Result<(), SdError> {
        self.set_loading(true);
        let result = self.api.send_verification_email(email).await;
        self.set_loading(false);
        match result {
            Ok(message) => {
                self.notifier.notify(Notice::success(
                    message.unwrap_or_else(|| "Verification code sent to your email".into()),
                ));
                Ok(())
            }
            Err(e) => Err(report(self.notifier.as_ref(), "send verification code", e)),
        }
    }

    /// Succeeds only when the server reports the code as valid.
    pub async fn verify_code(&self, email: &str, code: &str) -> Result<(), SdError> {
        self.set_loading(true);
        let result = self.api.verify_verification_code(email, code).await;
        self.set_loading(false);
        match result {
            Ok(resp) if resp.valid => {
                self.notifier.notify(Notice::success(
                    resp.message
                        .unwrap_or_else(|| "Verification code accepted".into()),
                ));
                Ok(())
            }
            Ok(_) => {
                self.notifier
                    .notify(Notice::error("Invalid verification code"));
                Err(SdError::InvalidInput("invalid verification code".into()))
            }
            Err(e) => Err(report(self.notifier.as_ref(), "verify code", e)),
        }
    }

    pub async fn reset_password(&self, req: ResetPasswordRequest) -> Result<(), SdError> {
        self.set_loading(true);
        let result = self.api.reset_password(&req).await;
        self.set_loading(false);
        match result {
            Ok(_) => {
                self.notifier.notify(Notice::success("Password reset"));
                Ok(())
            }
            Err(e) => Err(report(self.notifier.as_ref(), "reset password", e)),
        }
    }

    /// Update username/email (and optionally the password). The token is
    /// kept as is.
    pub async fn update_profile(&self, req: UpdateProfileRequest) -> Result<ProfileResponse, SdError> {
        self.set_loading(true);
        let result = self.update_profile_inner(&req).await;
        self.set_loading(false);
        result.map_err(|e| report(self.notifier.as_ref(), "update profile", e))
    }

    async fn update_profile_inner(
        &self,
        req: &UpdateProfileRequest,
    ) -> Result<ProfileResponse, SdError> {
        let profile = self.api.update_profile(req).await?;

        let known = {
            let mut state = lock(&self.state);
            match state.user.as_mut() {
                Some(user) => {
                    user.username = profile.username.clone();
                    user.email = profile.email.clone();
                    true
                }
                None => false,
            }
        };
        if known {
            self.api
                .storage()
                .set(keys::USERNAME, &profile.username)
                .await?;
        }

        self.notifier.notify(Notice::success("Profile updated"));
        Ok(profile)
    }

    pub async fn logout(&self) -> Result<(), SdError> {
        *lock(&self.state) = AuthState::default();

        let storage = self.api.storage();
        storage.remove(keys::TOKEN).await?;
        storage.remove(keys::USERNAME).await?;

        tracing::info!("logged out");
        self.api
            .navigator()
            .go(Location::to_route(Route::Login, None));
        self.notifier.notify(Notice::success("Logged out"));
        Ok(())
    }

    /// Rehydrate from local storage. Authenticated when both a token and a
    /// username are stored.
    pub async fn check_auth(&self) -> bool {
        let storage = self.api.storage();
        let stored = async {
            let token = storage.get(keys::TOKEN).await?;
            let username = storage.get(keys::USERNAME).await?;
            Ok::<_, SdError>(token.zip(username))
        }
        .await;

        let mut state = lock(&self.state);
        match stored {
            Ok(Some((token, username))) if !token.is_empty() && !username.is_empty() => {
                let email = state
                    .user
                    .as_ref()
                    .filter(|u| u.username == username)
                    .map(|u| u.email.clone())
                    .unwrap_or_default();
                state.user = Some(UserInfo {
                    username,
                    email,
                    token,
                });
                state.is_authenticated = true;
            }
            Ok(_) => {
                state.user = None;
                state.is_authenticated = false;
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not read credentials from local storage");
                state.user = None;
                state.is_authenticated = false;
            }
        }
        state.is_authenticated
    }
}
