use anyhow::{anyhow, Context, Result};
use clap::Args;
use inkpost_core::config::InkpostConfig;
use inkpost_core::identity::{Identity, IdentityProvider, MemoryIdentityProvider};
use inkpost_core::roles::Role;
use inkpost_core::router::NavigationOutcome;
use inkpost_core::session::{SessionContext, SessionPhase, SessionState};
use inkpost_core::{InkpostApp, InkpostAppBuilder};
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug, Clone, Default)]
pub struct NavigateArgs {
    /// Sign in as this account before navigating
    #[arg(long, requires = "password")]
    pub email: Option<String>,

    #[arg(long, requires = "email")]
    pub password: Option<String>,

    /// Create the account through sign-up instead of provisioning it
    #[arg(long, requires = "email")]
    pub register: bool,

    /// Grant the admin role to the account
    #[arg(long, requires = "email")]
    pub admin: bool,

    /// Paths to navigate to, in order
    #[arg(required = true)]
    pub paths: Vec<String>,
}

pub async fn run(config: InkpostConfig, args: NavigateArgs) -> Result<()> {
    for (path, outcome) in outcomes(config, &args).await? {
        println!("{:<32} {}", path, outcome);
    }
    Ok(())
}

/// Boot the in-memory backend, sign in if asked, then navigate each path.
pub async fn outcomes(
    config: InkpostConfig,
    args: &NavigateArgs,
) -> Result<Vec<(String, NavigationOutcome)>> {
    let provider = Arc::new(
        MemoryIdentityProvider::from_config(&config.auth)
            .context("Failed to initialise identity provider")?,
    );
    let timeout = config.guard.ready_timeout();
    let app = InkpostAppBuilder::with_config(config).with_provider(provider.clone()).build()?;

    if let (Some(email), Some(password)) = (&args.email, &args.password) {
        let identity = sign_in(&app, &provider, email, password, args, timeout).await?;
        let uid = identity.uid.clone();
        match settle(&app.session(), timeout, |s| s.roles_ready() && signed_in_as(s, &uid)).await {
            Ok(state) => println!("Signed in as {} with roles {}", identity.email, state.roles()),
            Err(e) => log::warn!("{:#}", e),
        }
    }

    let mut results = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        results.push((path.clone(), app.navigate(path).await));
    }
    Ok(results)
}

async fn sign_in(
    app: &InkpostApp,
    provider: &MemoryIdentityProvider,
    email: &str,
    password: &str,
    args: &NavigateArgs,
    timeout: Duration,
) -> Result<Identity> {
    let admin_roles = || vec![Role::USER.to_string(), Role::ADMIN.to_string()];

    if args.register {
        let identity = provider.sign_up(email, password).await?;
        if args.admin {
            // The first role fetch writes the user record; promote it and sign in again
            let uid = identity.uid.clone();
            settle(&app.session(), timeout, |s| s.roles_ready() && signed_in_as(s, &uid)).await?;
            app.users().set_user_roles(&identity.uid, admin_roles()).await?;
            provider.sign_out().await?;
            settle(&app.session(), timeout, |s| s.phase() == SessionPhase::SignedOut).await?;
            provider.sign_in(email, password).await?;
        }
        return Ok(identity);
    }

    // Accounts of the in-memory backend do not outlive the process
    let identity = provider.register_account(email, password)?;
    if args.admin {
        app.users().create_user_document(&identity, admin_roles()).await?;
    }
    Ok(provider.sign_in(email, password).await?)
}

fn signed_in_as(state: &SessionState, uid: &str) -> bool {
    state.identity().is_some_and(|identity| identity.uid == uid)
}

async fn settle(
    session: &SessionContext,
    timeout: Duration,
    done: impl FnMut(&SessionState) -> bool,
) -> Result<SessionState> {
    let mut rx = session.subscribe();
    let state = tokio::time::timeout(timeout, rx.wait_for(done))
        .await
        .map_err(|_| anyhow!("Session did not settle within {:?}", timeout))?
        .context("Session pipeline stopped")?
        .clone();
    Ok(state)
}
