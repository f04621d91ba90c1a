//! Command parsing and execution.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use keygate_core::models::Credentials;
use keygate_core::store::FileStore;
use keygate_core::{AuthError, AuthService, CoreConfig, SigningKey, TokenConfig};
use tracing::{debug, info};

use crate::config::{Config, ENV_SIGNING_KEY};
use crate::keychain::SigningKeyStore;
use crate::session::{Session, SessionData};

/// Register accounts, log in, and check bearer tokens
#[derive(Debug, Parser)]
#[command(name = "keygate", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Create an account
    Register {
        /// Account identifier (email address)
        identifier: String,

        /// Read the password from the first line of stdin instead of prompting
        #[arg(long)]
        password_stdin: bool,
    },

    /// Log in and save the access token
    Login {
        /// Account identifier (email address)
        identifier: String,

        /// Read the password from the first line of stdin instead of prompting
        #[arg(long)]
        password_stdin: bool,
    },

    /// Show the identity behind the saved token
    #[command(name = "whoami", visible_alias = "profile")]
    WhoAmI,

    /// Check a token and print its subject
    VerifyToken {
        token: String,
    },

    /// Forget the saved token
    Logout,

    /// Write the default config and create a signing key
    Init,
}

/// Everything a command needs: configuration, the auth service and the saved session
pub struct App {
    config: Config,
    data_dir: PathBuf,
    service: AuthService,
    session: Session,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let data_dir = config.data_dir()?;
        let store = FileStore::open(&data_dir)
            .with_context(|| format!("Failed to open account store in {}", data_dir.display()))?;

        let signing_key = match config.signing_key {
            Some(ref material) => SigningKey::from_material(material)
                .with_context(|| format!("{} is not a usable signing key", ENV_SIGNING_KEY))?,
            None => SigningKeyStore::new(&data_dir).load_or_create()?,
        };

        let core = CoreConfig {
            hasher: config.hasher,
            policy: config.policy,
            token: TokenConfig::new(signing_key).with_ttl(config.token_ttl()),
        };
        let service = AuthService::new(Arc::new(store), core)?;

        let mut session = Session::new(data_dir.clone());
        if let Err(e) = session.load() {
            debug!(error = %e, "Ignoring unreadable session file");
        }

        Ok(Self {
            config,
            data_dir,
            service,
            session,
        })
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Register { identifier, password_stdin } => {
                let password = read_password(password_stdin)?;
                let response = self
                    .service
                    .register(Credentials::new(identifier, password))
                    .await?;
                println!("{}", response.message);
            }
            Command::Login { identifier, password_stdin } => {
                let password = read_password(password_stdin)?;
                let response = self
                    .service
                    .login(Credentials::new(identifier.clone(), password))
                    .await?;

                self.session.update(SessionData::new(
                    response.access_token.clone(),
                    identifier,
                    response.expires_at,
                ));
                self.session.save().context("Failed to save session")?;
                info!("Login successful");

                println!("{}", response.message);
                println!("Token expires at {}", response.expires_at.to_rfc3339());
                println!("{}", response.access_token);
            }
            Command::WhoAmI => {
                let Some(token) = self.session.token() else {
                    bail!("Not logged in. Run `keygate login <email>` first.");
                };
                let header = format!("Bearer {}", token);
                let profile = match self.service.profile(Some(&header)) {
                    Ok(profile) => profile,
                    Err(AuthError::ExpiredToken) => {
                        let hint = match self.session.data {
                            Some(ref data) if data.is_expired() => format!(
                                "Saved session expired at {}. Run `keygate login {}` again.",
                                data.expires_at.to_rfc3339(),
                                data.identifier
                            ),
                            _ => "Saved session has expired. Run `keygate login <email>` again."
                                .to_string(),
                        };
                        return Err(anyhow::Error::from(AuthError::ExpiredToken).context(hint));
                    }
                    Err(e) => return Err(e.into()),
                };
                println!("{}", profile.subject);
                if let Some(ref data) = self.session.data {
                    if data.expires_soon() {
                        eprintln!("Session expires in {} minute(s)", data.minutes_until_expiry());
                    }
                }
            }
            Command::VerifyToken { token } => {
                let subject = self.service.issuer().validate(token.trim())?;
                println!("{}", subject);
            }
            Command::Logout => {
                self.session.clear()?;
                println!("Logged out");
            }
            Command::Init => {
                self.config.save()?;
                println!("Config written; data directory is {}", self.data_dir.display());
            }
        }
        Ok(())
    }
}

fn read_password(from_stdin: bool) -> Result<String> {
    if from_stdin {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read password from stdin")?;
        return Ok(line.trim_end_matches(['\r', '\n']).to_string());
    }
    rpassword::prompt_password("Password: ").context("Failed to read password")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        Cli::try_parse_from(std::iter::once("keygate").chain(args.iter().copied()))
            .map(|cli| cli.command)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse(&["register", "a@x.com"]).unwrap(),
            Command::Register {
                identifier: "a@x.com".to_string(),
                password_stdin: false
            }
        );
        assert_eq!(
            parse(&["login", "--password-stdin", "a@x.com"]).unwrap(),
            Command::Login {
                identifier: "a@x.com".to_string(),
                password_stdin: true
            }
        );
        assert_eq!(parse(&["whoami"]).unwrap(), Command::WhoAmI);
        assert_eq!(parse(&["profile"]).unwrap(), Command::WhoAmI);
        assert_eq!(
            parse(&["verify-token", "a.b.c"]).unwrap(),
            Command::VerifyToken {
                token: "a.b.c".to_string()
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["register"]).is_err());
        assert!(parse(&["login", "a@x.com", "b@x.com"]).is_err());
        assert!(parse(&["frobnicate"]).is_err());
    }

    #[test]
    fn test_misspelled_flag_is_rejected() {
        let err = parse(&["register", "a@x.com", "--pasword-stdin"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[tokio::test]
    async fn test_app_uses_data_dir_and_env_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: Some(dir.path().to_path_buf()),
            signing_key: Some(SigningKey::generate().to_hex().to_string()),
            hasher: keygate_core::HasherConfig::insecure_fast(),
            ..Config::default()
        };

        let mut app = App::new(config).unwrap();
        app.service
            .register(Credentials::new("a@x.com", "pw123"))
            .await
            .unwrap();
        assert!(dir.path().join("accounts.json").exists());

        // Not logged in yet
        assert!(app.run(Command::WhoAmI).await.is_err());

        let bad = app.run(Command::VerifyToken {
            token: "not.a.token".to_string(),
        });
        assert!(bad.await.is_err());
    }

    #[tokio::test]
    async fn test_whoami_reports_expired_session() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: Some(dir.path().to_path_buf()),
            signing_key: Some(SigningKey::generate().to_hex().to_string()),
            hasher: keygate_core::HasherConfig::insecure_fast(),
            ..Config::default()
        };
        let mut app = App::new(config).unwrap();

        let issued = chrono::Utc::now() - chrono::Duration::hours(2);
        let token = app
            .service
            .issuer()
            .issue_at("a@x.com", std::time::Duration::from_secs(3600), issued)
            .unwrap();
        app.session.update(SessionData::new(
            token.to_string(),
            "a@x.com".to_string(),
            token.expires_at(),
        ));

        let err = app.run(Command::WhoAmI).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AuthError>(),
            Some(AuthError::ExpiredToken)
        ));
        assert!(err.to_string().contains("keygate login a@x.com"));
    }
}
