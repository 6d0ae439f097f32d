//! Operator login.
//!
//! # Usage
//!
//! ```bash
//! # Prompts for the password, or reads COMMERCE_ADMIN_PASSWORD
//! ca-cli login -e ops@example.com
//! ```

use std::io::{self, BufRead, Write};

use commerce_admin::config::AdminConfig;
use commerce_admin::identity::IdentityClient;
use commerce_admin::preferences::FilePreferenceStore;
use secrecy::SecretString;

use super::{CliError, LoginArgs};

fn read_password() -> Result<SecretString, CliError> {
    if let Ok(password) = std::env::var("COMMERCE_ADMIN_PASSWORD") {
        return Ok(SecretString::from(password));
    }

    let mut stderr = io::stderr();
    write!(stderr, "Password: ")?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(CliError::InvalidArgument("empty password".to_string()));
    }
    Ok(SecretString::from(password.to_owned()))
}

/// Log in and persist the session to the preference file.
pub async fn login(config: &AdminConfig, args: LoginArgs) -> Result<(), CliError> {
    let identity = config.identity().ok_or(CliError::IdentityNotConfigured)?;
    let client = IdentityClient::new(identity)?;
    let password = read_password()?;

    let token = client.login(&args.email, &password).await?;

    let store = FilePreferenceStore::open(&config.preferences_path)?;
    token.save(&store)?;
    tracing::info!(path = %store.path().display(), "Session saved");
    Ok(())
}
