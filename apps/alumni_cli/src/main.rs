use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::{load_settings, normalize_base_url},
    ActionOutcome, AlumniClient, ClientEvent, NoticeSeverity, ProfileController, ProfileView,
};
use shared::domain::{DraftField, MentorshipRequest, Profile, RequestId, RequestStatus};
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Alumni mentorship client")]
struct Args {
    /// Overrides `api_base_url` from alumni.toml / the environment.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    token: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    Profile(ProfileCommand),
    #[command(subcommand)]
    Request(RequestCommand),
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    Show,
    Edit {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum RequestCommand {
    Approve { request_id: String },
    Reject { request_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(server_url) = args.server_url.as_deref() {
        settings.api_base_url = normalize_base_url(server_url);
    }
    let client = AlumniClient::new(settings)?;
    client.session().login(args.token);
    let mut events = client.subscribe_events();

    let succeeded = match args.command {
        Command::Profile(ProfileCommand::Show) => show_profile(&client).await,
        Command::Profile(ProfileCommand::Edit {
            name,
            address,
            phone,
        }) => edit_profile(&client, name, address, phone).await,
        Command::Request(RequestCommand::Approve { request_id }) => {
            let card = client.request_card(pending_snapshot(request_id), log_refresh);
            card.approve().await.is_success()
        }
        Command::Request(RequestCommand::Reject { request_id }) => {
            let card = client.request_card(pending_snapshot(request_id), log_refresh);
            card.reject().await.is_success()
        }
    };

    print_notices(&mut events);
    client.shutdown();
    client.session().logout();

    if !succeeded {
        bail!("operation failed");
    }
    Ok(())
}

async fn show_profile(client: &AlumniClient) -> bool {
    let screen = client.profile_screen();
    screen.load_profile().await;
    render_profile(&screen).await
}

async fn edit_profile(
    client: &AlumniClient,
    name: Option<String>,
    address: Option<String>,
    phone: Option<String>,
) -> bool {
    let screen = client.profile_screen();
    if !screen.load_profile().await.is_success() {
        return false;
    }

    screen.open_editor().await;
    for (field, value) in [
        (DraftField::Name, name),
        (DraftField::Address, address),
        (DraftField::Phone, phone),
    ] {
        if let Some(value) = value {
            screen.edit_draft(field, value).await;
        }
    }

    match screen.submit_edit().await {
        ActionOutcome::Succeeded(_) => render_profile(&screen).await,
        _ => false,
    }
}

async fn render_profile(screen: &ProfileController) -> bool {
    match screen.view().await {
        ProfileView::Ready(profile) => {
            print_profile(&profile, &screen.photo_url().await);
            true
        }
        ProfileView::Failed(message) => {
            eprintln!("Profile unavailable: {message}");
            false
        }
        ProfileView::Loading => false,
    }
}

fn print_profile(profile: &Profile, photo_url: &str) {
    println!("{}", profile.name);
    println!("  {}", profile.address);
    println!("  {}", profile.graduation_label());
    println!("  role: {}", profile.role);
    println!(
        "  followers: {}  following: {}",
        profile.followers, profile.following
    );
    println!("Data Diri");
    println!("  {}", profile.email);
    if let Some(birth_date) = &profile.birth_date {
        println!("  {birth_date}");
    }
    println!("  {}", profile.phone);
    println!("  photo: {photo_url}");
}

/// The parent list is not part of this tool, so cards start from a bare
/// pending snapshot carrying only the id.
fn pending_snapshot(request_id: String) -> MentorshipRequest {
    MentorshipRequest {
        request_id: RequestId::new(request_id),
        mentee_name: String::new(),
        mentor_name: String::new(),
        status: RequestStatus::Pending,
        question: String::new(),
        graduation: String::new(),
        created_at: String::new(),
        updated_at: String::new(),
    }
}

fn log_refresh(request_id: &RequestId) {
    info!(request_id = %request_id, "request list refresh requested");
}

fn print_notices(events: &mut broadcast::Receiver<ClientEvent>) {
    while let Ok(event) = events.try_recv() {
        if let ClientEvent::Notice(notice) = event {
            match notice.severity {
                NoticeSeverity::Success => println!("{}: {}", notice.title, notice.message),
                NoticeSeverity::Error => eprintln!("{}: {}", notice.title, notice.message),
            }
        }
    }
}
