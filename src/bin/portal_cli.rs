//!
//! memberportal CLI
//! ----------------
//! Member-side client for a running relay. Drives the same session state machine a page
//! would: the token persists in a local storage file between invocations, `me` hydrates
//! from it, and protected commands go through the route guard.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use memberportal::config::arg_value;
use memberportal::identity::UserPatch;
use memberportal::session::{
    ChangePasswordRequest, ClientConfig, FileTokenStore, GuardDecision, RecordingNavigator, RegisterRequest, RelayApi,
    SessionClient,
};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--relay <url>] [--storage <path>] <command> [args]\n\nCommands:\n  login <email> <password>              sign in and store the token\n  register <name> <email> <password>    create an account (signs in when a token is returned)\n  me                                    show the signed-in member (guarded)\n  status                                show session state without redirecting\n  update <field>=<value> ...            update profile fields (name, phone, address, bio, avatar, profilePictureUrl)\n  upload <image-path>                   upload a new profile picture\n  change-password <current> <new>       change the account password\n  logout                                sign out locally and at the relay\n\nFlags:\n  --relay <url>      Relay base URL (env: PORTAL_RELAY_URL, default http://127.0.0.1:3000)\n  --storage <path>   Token storage file (default ~/.memberportal/storage.json)"
    );
}

fn default_storage() -> PathBuf {
    let home = env::var("HOME").or_else(|_| env::var("USERPROFILE")).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."));
    home.join(".memberportal").join("storage.json")
}

fn guess_content_type(path: &std::path::Path) -> Option<&'static str> {
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "avif" => Some("image/avif"),
        _ => None,
    }
}

/// Strip `--flag value` pairs, leaving the command and its arguments.
fn positional(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--relay" || args[i] == "--storage" {
            i += 2;
            continue;
        }
        out.push(args[i].clone());
        i += 1;
    }
    out
}

fn print_user(client: &SessionClient<RelayApi>) -> Result<()> {
    match client.user() {
        Some(u) => println!("{}", serde_json::to_string_pretty(&u)?),
        None => println!("not signed in"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "portal_cli".to_string());
    if args.iter().any(|a| a == "--help" || a == "-h") || args.len() < 2 {
        print_usage(&program);
        return Ok(());
    }

    let mut config = ClientConfig::from_env();
    if let Some(r) = arg_value(&args, "--relay") { config.relay_base = r; }
    let storage = arg_value(&args, "--storage").map(PathBuf::from).unwrap_or_else(default_storage);

    let api = RelayApi::new(&config.relay_base).context("While building relay client")?;
    let navigator = Arc::new(RecordingNavigator::default());
    let client = SessionClient::new(api.clone(), Arc::new(FileTokenStore::new(storage)), navigator.clone(), config);

    let cmd = positional(&args);
    let Some(command) = cmd.first() else {
        print_usage(&program);
        return Ok(());
    };

    match (command.as_str(), &cmd[1..]) {
        ("login", [email, password]) => {
            let outcome = api.login_user(email, password).await?;
            let token = outcome.token.ok_or_else(|| anyhow!("login response carried no token"))?;
            client.login(&token, outcome.user).await;
            print_user(&client)?;
        }
        ("register", [name, email, password]) => {
            let req = RegisterRequest { name: name.clone(), email: email.clone(), password: password.clone(), confirm_password: Some(password.clone()) };
            let outcome = api.register_user(&req).await?;
            match (outcome.token, outcome.user) {
                (Some(token), Some(user)) => {
                    client.login(&token, Some(user)).await;
                    print_user(&client)?;
                }
                _ => println!("{}", outcome.message.unwrap_or_else(|| "Account created successfully; please log in.".to_string())),
            }
        }
        ("me", []) => {
            client.init().await;
            match client.require_auth() {
                GuardDecision::Allowed(u) => println!("{}", serde_json::to_string_pretty(&u)?),
                _ => println!("not signed in; redirected to {:?}", navigator.redirects()),
            }
        }
        ("status", []) => {
            client.init().await;
            println!("authenticated: {}", client.is_authenticated());
            print_user(&client)?;
        }
        ("update", fields) if !fields.is_empty() => {
            client.init().await;
            let mut patch = UserPatch::default();
            for f in fields {
                let (k, v) = f.split_once('=').ok_or_else(|| anyhow!("expected field=value, got '{}'", f))?;
                if !patch.set(k, v.to_string()) {
                    return Err(anyhow!("unknown profile field '{}'", k));
                }
            }
            let saved = api.update_me(&patch, client.token().as_deref()).await?;
            client.update(&UserPatch::from(&saved));
            print_user(&client)?;
        }
        ("upload", [path]) => {
            client.init().await;
            let path = PathBuf::from(path);
            let bytes = std::fs::read(&path).with_context(|| format!("While reading {}", path.display()))?;
            let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("image").to_string();
            let url = api.upload_profile_image(&file_name, bytes, guess_content_type(&path), client.token().as_deref()).await?;
            client.update(&UserPatch { profile_picture_url: Some(url.clone()), ..Default::default() });
            println!("{}", url);
        }
        ("change-password", [current, new]) => {
            client.init().await;
            let req = ChangePasswordRequest { current_password: current.clone(), new_password: new.clone() };
            println!("{}", api.change_password(&req, client.token().as_deref()).await?);
        }
        ("logout", []) => {
            client.logout().await;
            println!("signed out; redirected to {:?}", navigator.redirects());
        }
        _ => {
            print_usage(&program);
            return Err(anyhow!("unrecognised command: {}", cmd.join(" ")));
        }
    }
    Ok(())
}
