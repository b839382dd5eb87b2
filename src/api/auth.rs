//! Account endpoints: sign-in, sign-up, sign-out, current user.

use reqwest::Method;

use super::{ApiClient, ApiError};
use crate::models::{AuthToken, Credentials, Registration, User};
use crate::validation::{validate_sign_in, validate_sign_up};

impl ApiClient {
    /// Exchange credentials for a token and store it in the session.
    pub fn login(&self, credentials: &Credentials) -> Result<(), ApiError> {
        validate_sign_in(credentials)?;

        let req = self
            .request(Method::POST, "/auth/token/login/")
            .json(credentials);
        let token: AuthToken = self.execute_json(req, "Account")?;

        self.session
            .sign_in(&token.auth_token)
            .map_err(|e| ApiError::Storage(format!("{:#}", e)))?;
        Ok(())
    }

    /// Create an account. Does not sign in.
    pub fn register(&self, form: &Registration) -> Result<(), ApiError> {
        validate_sign_up(form)?;

        let req = self.request(Method::POST, "/auth/users/").json(form);
        self.execute(req, "Account")?;
        tracing::info!(email = %form.email, "account registered");
        Ok(())
    }

    /// Tell the server to drop the token, then clear it locally regardless
    /// of the server's answer.
    pub fn logout(&self) -> Result<(), ApiError> {
        let result = if self.session.is_authenticated() {
            let req = self.request(Method::POST, "/auth/token/logout/");
            self.execute(req, "Account").map(|_| ())
        } else {
            Ok(())
        };

        if let Err(e) = self.session.sign_out() {
            tracing::warn!(error = %e, "could not remove session file");
        }

        match result {
            // Token already rejected; nothing left to revoke.
            Err(ApiError::Auth) => Ok(()),
            other => other,
        }
    }

    pub fn current_user(&self) -> Result<User, ApiError> {
        let req = self.request(Method::GET, "/auth/users/me/");
        self.execute_json(req, "Account")
    }
}
