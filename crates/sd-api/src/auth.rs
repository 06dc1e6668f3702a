use sd_core::error::ApiError;
use sd_core::user::*;
use serde_json::json;

use crate::client::ApiClient;
use crate::wire;

impl ApiClient {
    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let body = self.post("/auth/login", json!(req)).await?;
        wire::decode_flat_or_data(body)
    }

    /// Returns the server's confirmation message, if any.
    pub async fn register(&self, req: &RegisterRequest) -> Result<Option<String>, ApiError> {
        let body = self.post("/auth/register", json!(req)).await?;
        Ok(wire::message(&body))
    }

    pub async fn send_verification_email(&self, email: &str) -> Result<Option<String>, ApiError> {
        let body = self
            .post("/auth/send-verification-email", json!({ "email": email }))
            .await?;
        Ok(wire::message(&body))
    }

    pub async fn verify_verification_code(
        &self,
        email: &str,
        code: &str,
    ) -> Result<VerifyCodeResponse, ApiError> {
        let body = self
            .post(
                "/auth/verify-verification-code",
                json!({ "email": email, "code": code }),
            )
            .await?;
        wire::decode_flat_or_data(body)
    }

    pub async fn reset_password(&self, req: &ResetPasswordRequest) -> Result<Option<String>, ApiError> {
        let body = self.post("/auth/reset-password", json!(req)).await?;
        Ok(wire::message(&body))
    }

    pub async fn update_profile(
        &self,
        req: &UpdateProfileRequest,
    ) -> Result<ProfileResponse, ApiError> {
        let body = self.put("/auth/update-profile", json!(req)).await?;
        wire::decode_flat_or_data(body)
    }
}
