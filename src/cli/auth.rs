//! Sign-in, sign-up and account commands

use anyhow::Result;

use super::ui::{error, password_input, text_input};
use crate::api::{ApiClient, ApiError};
use crate::models::{Credentials, Registration};

/// Execute the login command. Returns whether a session was established.
pub fn run_login(api: &ApiClient, email: Option<String>) -> Result<bool> {
    let mut email = email.unwrap_or_default();

    loop {
        let Some(entered) = text_input("email:", Some(&email))? else {
            return Ok(false);
        };
        email = entered.trim().to_string();

        let Some(password) = password_input("password:")? else {
            return Ok(false);
        };

        let credentials = Credentials {
            email: email.clone(),
            password,
        };
        match api.login(&credentials) {
            Ok(()) => {
                println!("Signed in as {}.", credentials.email);
                return Ok(true);
            }
            Err(e) => report_form_error(&e)?,
        }
    }
}

/// Execute the register command: sign up, then sign in with the same
/// credentials.
pub fn run_register(api: &ApiClient) -> Result<bool> {
    let mut form = Registration {
        email: String::new(),
        password: String::new(),
        re_password: String::new(),
        first_name: String::new(),
        last_name: String::new(),
    };

    loop {
        let Some(first_name) = text_input("first name:", Some(&form.first_name))? else {
            return Ok(false);
        };
        let Some(last_name) = text_input("last name:", Some(&form.last_name))? else {
            return Ok(false);
        };
        let Some(email) = text_input("email:", Some(&form.email))? else {
            return Ok(false);
        };
        let Some(password) = password_input("password:")? else {
            return Ok(false);
        };
        let Some(re_password) = password_input("confirm password:")? else {
            return Ok(false);
        };

        form = Registration {
            email: email.trim().to_string(),
            password,
            re_password,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
        };

        match api.register(&form) {
            Ok(()) => break,
            Err(e) => report_form_error(&e)?,
        }
    }

    api.login(&form.credentials())?;
    println!("Account created. Signed in as {}.", form.email);
    Ok(true)
}

/// Execute the logout command
pub fn run_logout(api: &ApiClient) -> Result<()> {
    if !api.session().is_authenticated() {
        println!("Not signed in.");
        return Ok(());
    }
    if let Err(e) = api.logout() {
        tracing::warn!(error = %e, "server logout failed");
    }
    println!("Signed out.");
    Ok(())
}

/// Execute the whoami command
pub fn run_whoami(api: &ApiClient) -> Result<()> {
    if !api.session().is_authenticated() {
        println!("Not signed in.");
        return Ok(());
    }
    let user = api.current_user()?;
    println!("{}", user.display_name());
    println!("  {}", user.email);
    Ok(())
}

/// Show a form error and let the user retry; anything else is fatal.
fn report_form_error(e: &ApiError) -> Result<()> {
    match e {
        ApiError::Validation(v) => error(&v.to_string()),
        ApiError::Rejected(fields) => error(&fields.summary()),
        ApiError::Auth => error("Invalid email or password"),
        other => return Err(anyhow::anyhow!(other.to_string())),
    }
    Ok(())
}
