use clap::Subcommand;
use serenity_core::{KeyringTokenStore, TokenStore};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store the backend bearer token in the OS keyring
    SetToken {
        /// Token issued by the backend at login
        token: String,
    },
    /// Remove the stored token
    Logout,
    /// Check whether a token is stored
    Status,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = KeyringTokenStore::new();
    match action {
        AuthAction::SetToken { token } => {
            let token = token.trim();
            if token.is_empty() {
                return Err("token must not be empty".into());
            }
            store.set(token)?;
            println!("token saved");
        }
        AuthAction::Logout => {
            store.clear()?;
            println!("logged out");
        }
        AuthAction::Status => {
            let authenticated = store.get()?.is_some_and(|t| !t.is_empty());
            println!(
                "{}",
                if authenticated {
                    "authenticated"
                } else {
                    "not authenticated"
                }
            );
        }
    }
    Ok(())
}
